//! Lexer (tokenizer)
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! The lexer never fails: unrecognised input becomes a [`TokenKind::Illegal`]
//! token and the parser reports it, so one run can surface several problems.
//!
//! `#` starts a line comment, because `//` is the integer-division operator.
//! Template strings (`f"sum = {a + b}"`) are split into literal text and nested
//! token streams, one per `{…}` segment, lexed with their absolute positions.

use super::ast::SourceLocation;
use std::fmt;

/// Token categories produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Illegal,
    Eof,

    // Literals
    Ident,
    Int,
    Float,
    Str,
    Template,

    // Keywords
    Let,
    Const,
    Fn,
    Return,
    If,
    Elif,
    Else,
    While,
    For,
    Break,
    Continue,
    True,
    False,
    Null,
    Class,
    Extends,
    New,
    This,
    Super,

    // Operators
    Assign,     // =
    Eq,         // ==
    Bang,       // !
    NotEq,      // !=
    Lt,         // <
    Le,         // <=
    Gt,         // >
    Ge,         // >=
    Plus,       // +
    PlusEq,     // +=
    Minus,      // -
    MinusEq,    // -=
    Star,       // *
    StarEq,     // *=
    Slash,      // /
    SlashEq,    // /=
    SlashSlash, // //
    Percent,    // %
    PercentEq,  // %=
    AndAnd,     // &&
    OrOr,       // ||

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Illegal => "illegal token",
            TokenKind::Eof => "end of file",
            TokenKind::Ident => "identifier",
            TokenKind::Int => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::Str => "string literal",
            TokenKind::Template => "template string",
            TokenKind::Let => "'let'",
            TokenKind::Const => "'const'",
            TokenKind::Fn => "'fn'",
            TokenKind::Return => "'return'",
            TokenKind::If => "'if'",
            TokenKind::Elif => "'elif'",
            TokenKind::Else => "'else'",
            TokenKind::While => "'while'",
            TokenKind::For => "'for'",
            TokenKind::Break => "'break'",
            TokenKind::Continue => "'continue'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Null => "'null'",
            TokenKind::Class => "'class'",
            TokenKind::Extends => "'extends'",
            TokenKind::New => "'new'",
            TokenKind::This => "'this'",
            TokenKind::Super => "'super'",
            TokenKind::Assign => "'='",
            TokenKind::Eq => "'=='",
            TokenKind::Bang => "'!'",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Plus => "'+'",
            TokenKind::PlusEq => "'+='",
            TokenKind::Minus => "'-'",
            TokenKind::MinusEq => "'-='",
            TokenKind::Star => "'*'",
            TokenKind::StarEq => "'*='",
            TokenKind::Slash => "'/'",
            TokenKind::SlashEq => "'/='",
            TokenKind::SlashSlash => "'//'",
            TokenKind::Percent => "'%'",
            TokenKind::PercentEq => "'%='",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Colon => "':'",
            TokenKind::Dot => "'.'",
        };
        f.write_str(text)
    }
}

/// Literal text or an embedded expression inside a template string
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateSegment {
    Text(String),
    /// Tokens of one `{…}` segment, terminated by `Eof`
    Code(Vec<Token>),
}

/// A positioned token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text for identifiers and numbers, the unescaped value for
    /// strings, the offending text for illegal tokens
    pub literal: String,
    pub location: SourceLocation,
    /// Position just past the token's last character
    pub end: SourceLocation,
    /// Only populated for [`TokenKind::Template`]
    pub segments: Vec<TemplateSegment>,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        literal: impl Into<String>,
        location: SourceLocation,
        end: SourceLocation,
    ) -> Self {
        Token {
            kind,
            literal: literal.into(),
            location,
            end,
            segments: Vec::new(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Ident => write!(f, "identifier '{}'", self.literal),
            TokenKind::Int | TokenKind::Float => write!(f, "{} {}", self.kind, self.literal),
            TokenKind::Str => write!(f, "string literal \"{}\"", self.literal),
            TokenKind::Illegal => write!(f, "illegal token '{}'", self.literal),
            _ => write!(f, "{}", self.kind),
        }
    }
}

fn keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "let" => TokenKind::Let,
        "const" => TokenKind::Const,
        "fn" => TokenKind::Fn,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "elif" => TokenKind::Elif,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "class" => TokenKind::Class,
        "extends" => TokenKind::Extends,
        "new" => TokenKind::New,
        "this" => TokenKind::This,
        "super" => TokenKind::Super,
        _ => return None,
    };
    Some(kind)
}

/// On-demand lexer; also usable as an iterator that ends after `Eof`
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self::starting_at(input, SourceLocation::new(1, 1))
    }

    /// Lexer whose first character sits at `origin` (used for template segments)
    pub fn starting_at(input: &str, origin: SourceLocation) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: origin.line,
            column: origin.column,
            finished: false,
        }
    }

    /// Tokenize the entire input, including the trailing `Eof`
    pub fn tokenize(&mut self) -> Vec<Token> {
        self.collect()
    }

    /// Produce the next token; returns `Eof` forever once input is exhausted
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let loc = self.current_location();
        let Some(ch) = self.advance() else {
            return Token::new(TokenKind::Eof, "", loc, loc);
        };

        match ch {
            '"' | '\'' => self.string_literal(ch, loc),
            'f' if self.peek() == Some('"') => {
                self.advance();
                self.template_literal(loc)
            }
            '0'..='9' => self.number_literal(ch, loc),
            'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(ch, loc),

            '=' => self.one_or_two(loc, '=', TokenKind::Eq, TokenKind::Assign),
            '!' => self.one_or_two(loc, '=', TokenKind::NotEq, TokenKind::Bang),
            '<' => self.one_or_two(loc, '=', TokenKind::Le, TokenKind::Lt),
            '>' => self.one_or_two(loc, '=', TokenKind::Ge, TokenKind::Gt),
            '+' => self.one_or_two(loc, '=', TokenKind::PlusEq, TokenKind::Plus),
            '-' => self.one_or_two(loc, '=', TokenKind::MinusEq, TokenKind::Minus),
            '*' => self.one_or_two(loc, '=', TokenKind::StarEq, TokenKind::Star),
            '%' => self.one_or_two(loc, '=', TokenKind::PercentEq, TokenKind::Percent),
            '/' => {
                if self.peek() == Some('/') {
                    self.advance();
                    self.token(TokenKind::SlashSlash, "//", loc)
                } else {
                    self.one_or_two(loc, '=', TokenKind::SlashEq, TokenKind::Slash)
                }
            }
            '&' => self.one_or_two(loc, '&', TokenKind::AndAnd, TokenKind::Illegal),
            '|' => self.one_or_two(loc, '|', TokenKind::OrOr, TokenKind::Illegal),

            '(' => self.token(TokenKind::LParen, "(", loc),
            ')' => self.token(TokenKind::RParen, ")", loc),
            '{' => self.token(TokenKind::LBrace, "{", loc),
            '}' => self.token(TokenKind::RBrace, "}", loc),
            '[' => self.token(TokenKind::LBracket, "[", loc),
            ']' => self.token(TokenKind::RBracket, "]", loc),
            ',' => self.token(TokenKind::Comma, ",", loc),
            ';' => self.token(TokenKind::Semicolon, ";", loc),
            ':' => self.token(TokenKind::Colon, ":", loc),
            '.' => self.token(TokenKind::Dot, ".", loc),

            other => self.token(TokenKind::Illegal, other.to_string(), loc),
        }
    }

    fn token(&self, kind: TokenKind, literal: impl Into<String>, loc: SourceLocation) -> Token {
        Token::new(kind, literal, loc, self.current_location())
    }

    /// Single-character lookahead for two-character operators
    fn one_or_two(
        &mut self,
        loc: SourceLocation,
        second: char,
        double: TokenKind,
        single: TokenKind,
    ) -> Token {
        let first = self.input[self.position - 1];
        if self.peek() == Some(second) {
            self.advance();
            self.token(double, format!("{}{}", first, second), loc)
        } else {
            self.token(single, first.to_string(), loc)
        }
    }

    /// Parse string literal delimited by `quote`
    fn string_literal(&mut self, quote: char, loc: SourceLocation) -> Token {
        let mut string = String::new();

        while let Some(ch) = self.advance() {
            if ch == quote {
                return self.token(TokenKind::Str, string, loc);
            }
            if ch == '\\' {
                match self.advance() {
                    Some(escaped) => string.push(unescape(escaped)),
                    None => break,
                }
            } else {
                string.push(ch);
            }
        }

        self.token(TokenKind::Illegal, format!("{}{}", quote, string), loc)
    }

    /// Parse `f"..."`; the opening `f"` has been consumed
    fn template_literal(&mut self, loc: SourceLocation) -> Token {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut raw = String::from("f\"");

        loop {
            let Some(ch) = self.advance() else {
                return self.token(TokenKind::Illegal, raw, loc);
            };
            raw.push(ch);
            match ch {
                '"' => break,
                '\\' => {
                    let Some(escaped) = self.advance() else {
                        return self.token(TokenKind::Illegal, raw, loc);
                    };
                    raw.push(escaped);
                    text.push(unescape(escaped));
                }
                '{' => {
                    if !text.is_empty() {
                        segments.push(TemplateSegment::Text(std::mem::take(&mut text)));
                    }
                    let origin = self.current_location();
                    let Some(code) = self.template_code() else {
                        return self.token(TokenKind::Illegal, raw, loc);
                    };
                    raw.push_str(&code);
                    raw.push('}');
                    let tokens = Lexer::starting_at(&code, origin).tokenize();
                    segments.push(TemplateSegment::Code(tokens));
                }
                _ => text.push(ch),
            }
        }

        if !text.is_empty() {
            segments.push(TemplateSegment::Text(text));
        }

        let mut token = self.token(TokenKind::Template, raw, loc);
        token.segments = segments;
        token
    }

    /// Collect the source of one `{…}` segment, consuming the closing brace.
    /// Nested braces and quoted strings are skipped over as a unit.
    fn template_code(&mut self) -> Option<String> {
        let mut code = String::new();
        let mut depth = 0usize;
        let mut quote: Option<char> = None;

        loop {
            let ch = self.advance()?;
            match quote {
                Some(q) => {
                    code.push(ch);
                    if ch == '\\' {
                        code.push(self.advance()?);
                    } else if ch == q {
                        quote = None;
                    }
                }
                None => match ch {
                    '}' if depth == 0 => return Some(code),
                    '}' => {
                        depth -= 1;
                        code.push(ch);
                    }
                    '{' => {
                        depth += 1;
                        code.push(ch);
                    }
                    '"' | '\'' => {
                        quote = Some(ch);
                        code.push(ch);
                    }
                    _ => code.push(ch),
                },
            }
        }
    }

    /// Parse integer or float literal (fraction and/or exponent)
    fn number_literal(&mut self, first_digit: char, loc: SourceLocation) -> Token {
        let mut num_str = String::new();
        num_str.push(first_digit);
        let mut is_float = false;

        self.take_digits(&mut num_str);

        if self.peek() == Some('.') && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            num_str.push('.');
            self.advance();
            self.take_digits(&mut num_str);
        }

        if let Some(marker @ ('e' | 'E')) = self.peek() {
            let has_digits = match self.peek_ahead(1) {
                Some(c) if c.is_ascii_digit() => true,
                Some('+') | Some('-') => self.peek_ahead(2).is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if has_digits {
                is_float = true;
                num_str.push(marker);
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    num_str.push(sign);
                    self.advance();
                }
                self.take_digits(&mut num_str);
            }
        }

        let kind = if is_float { TokenKind::Float } else { TokenKind::Int };
        self.token(kind, num_str, loc)
    }

    fn take_digits(&mut self, into: &mut String) {
        while let Some(ch) = self.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            into.push(ch);
            self.advance();
        }
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first_char: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = keyword(&ident).unwrap_or(TokenKind::Ident);
        self.token(kind, ident, loc)
    }

    /// Skip whitespace and `#` comments
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '#' => {
                    while let Some(c) = self.advance() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.finished = true;
        }
        Some(token)
    }
}

fn unescape(escaped: char) -> char {
    match escaped {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other, // \\ \" \' \{ \} and unknown escapes keep the character
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = Lexer::new("let five = 5;").tokenize();

        assert_eq!(tokens[0].kind, TokenKind::Let);
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].literal, "five");
        assert_eq!(tokens[2].kind, TokenKind::Assign);
        assert_eq!(tokens[3].kind, TokenKind::Int);
        assert_eq!(tokens[3].literal, "5");
        assert_eq!(tokens[4].kind, TokenKind::Semicolon);
        assert_eq!(tokens[5].kind, TokenKind::Eof);
        assert_eq!(tokens.len(), 6);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("= == ! != + += - -= * *= / /= // % %= && || < <= > >="),
            vec![
                TokenKind::Assign,
                TokenKind::Eq,
                TokenKind::Bang,
                TokenKind::NotEq,
                TokenKind::Plus,
                TokenKind::PlusEq,
                TokenKind::Minus,
                TokenKind::MinusEq,
                TokenKind::Star,
                TokenKind::StarEq,
                TokenKind::Slash,
                TokenKind::SlashEq,
                TokenKind::SlashSlash,
                TokenKind::Percent,
                TokenKind::PercentEq,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Lt,
                TokenKind::Le,
                TokenKind::Gt,
                TokenKind::Ge,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("42 3.14 2e3 1.5E-2 7.").tokenize();

        assert_eq!((tokens[0].kind, tokens[0].literal.as_str()), (TokenKind::Int, "42"));
        assert_eq!((tokens[1].kind, tokens[1].literal.as_str()), (TokenKind::Float, "3.14"));
        assert_eq!((tokens[2].kind, tokens[2].literal.as_str()), (TokenKind::Float, "2e3"));
        assert_eq!((tokens[3].kind, tokens[3].literal.as_str()), (TokenKind::Float, "1.5E-2"));
        assert_eq!(tokens[3].literal.parse::<f64>(), Ok(0.015));
        // A dot without a following digit is not part of the number
        assert_eq!(tokens[4].kind, TokenKind::Int);
        assert_eq!(tokens[5].kind, TokenKind::Dot);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("class Dog extends Animal new this super fn elif"),
            vec![
                TokenKind::Class,
                TokenKind::Ident,
                TokenKind::Extends,
                TokenKind::Ident,
                TokenKind::New,
                TokenKind::This,
                TokenKind::Super,
                TokenKind::Fn,
                TokenKind::Elif,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments() {
        let tokens = Lexer::new("let x; # comment\nlet y;").tokenize();

        assert_eq!(tokens[3].kind, TokenKind::Let);
        assert_eq!(tokens[4].literal, "y");
        assert_eq!(tokens[4].location, SourceLocation::new(2, 5));
    }

    #[test]
    fn test_string_literal() {
        let tokens = Lexer::new(r#""hello\nworld" 'it\'s'"#).tokenize();

        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].literal, "hello\nworld");
        assert_eq!(tokens[1].literal, "it's");
    }

    #[test]
    fn test_unterminated_string_is_illegal() {
        let tokens = Lexer::new("\"abc").tokenize();

        assert_eq!(tokens[0].kind, TokenKind::Illegal);
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn test_illegal_characters_do_not_stop_lexing() {
        assert_eq!(
            kinds("a @ b & c"),
            vec![
                TokenKind::Ident,
                TokenKind::Illegal,
                TokenKind::Ident,
                TokenKind::Illegal,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_template_segments() {
        let tokens = Lexer::new("f\"a {x + 1} b\"").tokenize();
        let template = &tokens[0];

        assert_eq!(template.kind, TokenKind::Template);
        assert_eq!(template.segments.len(), 3);
        assert_eq!(template.segments[0], TemplateSegment::Text("a ".to_string()));
        match &template.segments[1] {
            TemplateSegment::Code(code) => {
                let code_kinds: Vec<TokenKind> = code.iter().map(|t| t.kind).collect();
                assert_eq!(
                    code_kinds,
                    vec![TokenKind::Ident, TokenKind::Plus, TokenKind::Int, TokenKind::Eof]
                );
                // Nested tokens keep absolute positions
                assert_eq!(code[0].location, SourceLocation::new(1, 6));
            }
            other => panic!("Expected code segment, got {:?}", other),
        }
        assert_eq!(template.segments[2], TemplateSegment::Text(" b".to_string()));
    }

    #[test]
    fn test_positions_and_end() {
        let tokens = Lexer::new("ab ==\n  cd").tokenize();

        assert_eq!(tokens[0].location, SourceLocation::new(1, 1));
        assert_eq!(tokens[0].end, SourceLocation::new(1, 3));
        assert_eq!(tokens[1].location, SourceLocation::new(1, 4));
        assert_eq!(tokens[2].location, SourceLocation::new(2, 3));
    }
}
