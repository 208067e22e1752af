//! Expression parsing implementation
//!
//! Pratt-style precedence climbing: every token kind may have a prefix
//! handler (literals, identifiers, `-`/`!`, grouping, `fn`, `new`, ...) and an
//! infix handler (binary operators, assignment, call `(`, index `[`, property
//! `.`). [`Parser::parse_expression`] parses a prefix form and then keeps
//! folding infix forms while the lookahead binds tighter than the caller's
//! threshold. That single loop gives left associativity to the binary
//! operators; assignment re-enters below its own level to associate right.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{TemplateSegment, TokenKind};
use crate::parser::parse::{ParseError, Parser};
use crate::stack::ensure_sufficient_stack;
use std::rc::Rc;

/// Binding power, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Precedence {
    Lowest,
    Assign,      // = += -= *= /= %=
    Or,          // ||
    And,         // &&
    Equals,      // == !=
    LessGreater, // < <= > >=
    Sum,         // + -
    Product,     // * / // %
    Prefix,      // -x !x
    Call,        // f(x) a[i] o.p
}

/// Infix binding power of a token; `Lowest` means "no infix handler"
pub(crate) fn infix_precedence(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Assign
        | TokenKind::PlusEq
        | TokenKind::MinusEq
        | TokenKind::StarEq
        | TokenKind::SlashEq
        | TokenKind::PercentEq => Precedence::Assign,
        TokenKind::OrOr => Precedence::Or,
        TokenKind::AndAnd => Precedence::And,
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::Le | TokenKind::Gt | TokenKind::Ge => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Star | TokenKind::Slash | TokenKind::SlashSlash | TokenKind::Percent => {
            Precedence::Product
        }
        TokenKind::LParen | TokenKind::LBracket | TokenKind::Dot => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

fn binary_op(kind: TokenKind) -> Option<InfixOp> {
    let op = match kind {
        TokenKind::Plus => InfixOp::Add,
        TokenKind::Minus => InfixOp::Sub,
        TokenKind::Star => InfixOp::Mul,
        TokenKind::Slash => InfixOp::Div,
        TokenKind::SlashSlash => InfixOp::FloorDiv,
        TokenKind::Percent => InfixOp::Mod,
        TokenKind::Eq => InfixOp::Eq,
        TokenKind::NotEq => InfixOp::Ne,
        TokenKind::Lt => InfixOp::Lt,
        TokenKind::Le => InfixOp::Le,
        TokenKind::Gt => InfixOp::Gt,
        TokenKind::Ge => InfixOp::Ge,
        _ => return None,
    };
    Some(op)
}

fn compound_op(kind: TokenKind) -> Option<InfixOp> {
    let op = match kind {
        TokenKind::PlusEq => InfixOp::Add,
        TokenKind::MinusEq => InfixOp::Sub,
        TokenKind::StarEq => InfixOp::Mul,
        TokenKind::SlashEq => InfixOp::Div,
        TokenKind::PercentEq => InfixOp::Mod,
        _ => return None,
    };
    Some(op)
}

impl Parser {
    /// Parse an expression whose infix operators all bind tighter than `precedence`
    pub(crate) fn parse_expression(&mut self, precedence: Precedence) -> Result<AstNode, ParseError> {
        ensure_sufficient_stack(|| {
            let mut left = self.parse_prefix()?;

            while precedence < infix_precedence(self.peek().kind) {
                left = self.parse_infix(left)?;
            }

            Ok(left)
        })
    }

    // ===== Prefix handlers =====

    fn parse_prefix(&mut self) -> Result<AstNode, ParseError> {
        let token = self.peek().clone();
        let start = token.location;

        let kind = match token.kind {
            TokenKind::Ident => {
                self.advance();
                NodeKind::Identifier(token.literal)
            }
            TokenKind::Int => {
                self.advance();
                let value = token.literal.parse::<i64>().map_err(|_| ParseError::InvalidNumber {
                    text: token.literal.clone(),
                    location: start,
                })?;
                NodeKind::Integer(value)
            }
            TokenKind::Float => {
                self.advance();
                let value = token.literal.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                    text: token.literal.clone(),
                    location: start,
                })?;
                NodeKind::Float(value)
            }
            TokenKind::Str => {
                self.advance();
                NodeKind::Str(token.literal)
            }
            TokenKind::Template => {
                self.advance();
                NodeKind::Template(self.parse_template(token.segments)?)
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                NodeKind::Boolean(token.kind == TokenKind::True)
            }
            TokenKind::Null => {
                self.advance();
                NodeKind::Null
            }
            TokenKind::This => {
                self.advance();
                NodeKind::This
            }
            TokenKind::Super => {
                self.advance();
                NodeKind::Super
            }
            TokenKind::Minus | TokenKind::Bang => {
                self.advance();
                let op = if token.kind == TokenKind::Minus {
                    PrefixOp::Neg
                } else {
                    PrefixOp::Not
                };
                let operand = self.parse_expression(Precedence::Prefix)?;
                NodeKind::Prefix {
                    op,
                    operand: Box::new(operand),
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression(Precedence::Lowest)?;
                self.expect_token(TokenKind::RParen)?;
                return Ok(inner);
            }
            TokenKind::LBracket => {
                self.advance();
                NodeKind::Array(self.parse_expression_list(TokenKind::RBracket)?)
            }
            TokenKind::LBrace => {
                self.advance();
                NodeKind::Hash(self.parse_hash_pairs()?)
            }
            TokenKind::Fn => {
                self.advance();
                let name = if self.check(TokenKind::Ident) {
                    Some(self.expect_identifier()?)
                } else {
                    None
                };
                NodeKind::Function(Rc::new(self.parse_function_rest(name)?))
            }
            TokenKind::New => {
                self.advance();
                let class_start = self.current_location();
                let class_name = self.expect_identifier()?;
                let class_span = self.span_from(class_start);
                let class = self.node(NodeKind::Identifier(class_name), class_span);
                self.expect_token(TokenKind::LParen)?;
                let args = self.parse_expression_list(TokenKind::RParen)?;
                NodeKind::New {
                    class: Box::new(class),
                    args,
                }
            }
            TokenKind::Illegal => {
                return Err(ParseError::IllegalToken {
                    text: token.literal,
                    location: start,
                });
            }
            found => {
                return Err(ParseError::NoPrefixRule {
                    found,
                    location: start,
                });
            }
        };

        let span = self.span_from(start);
        Ok(self.node(kind, span))
    }

    /// Parse each `{…}` segment of a template with a nested parser
    fn parse_template(&mut self, segments: Vec<TemplateSegment>) -> Result<Vec<TemplatePart>, ParseError> {
        let mut parts = Vec::with_capacity(segments.len());

        for segment in segments {
            match segment {
                TemplateSegment::Text(text) => parts.push(TemplatePart::Text(text)),
                TemplateSegment::Code(tokens) => {
                    let mut nested = Parser::from_tokens(tokens, self.next_id);
                    let result = nested
                        .parse_expression(Precedence::Lowest)
                        .and_then(|expr| nested.expect_token(TokenKind::Eof).map(|_| expr));
                    self.next_id = nested.next_id;
                    parts.push(TemplatePart::Expr(result?));
                }
            }
        }

        Ok(parts)
    }

    /// Comma-separated expressions up to `end`; the opening token is consumed
    pub(crate) fn parse_expression_list(&mut self, end: TokenKind) -> Result<Vec<AstNode>, ParseError> {
        let mut items = Vec::new();

        while !self.check(end) {
            items.push(self.parse_expression(Precedence::Lowest)?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        self.expect_token(end)?;
        Ok(items)
    }

    fn parse_hash_pairs(&mut self) -> Result<Vec<(AstNode, AstNode)>, ParseError> {
        let mut pairs = Vec::new();

        while !self.check(TokenKind::RBrace) {
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect_token(TokenKind::Colon)?;
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        self.expect_token(TokenKind::RBrace)?;
        Ok(pairs)
    }

    // ===== Infix handlers =====

    fn parse_infix(&mut self, left: AstNode) -> Result<AstNode, ParseError> {
        let token = self.advance().clone();
        let start = left.span.start;

        let kind = if let Some(op) = binary_op(token.kind) {
            let right = self.parse_expression(infix_precedence(token.kind))?;
            NodeKind::Infix {
                op,
                left: Box::new(left),
                right: Box::new(right),
            }
        } else if let Some(op) = compound_op(token.kind) {
            Self::check_assignable(&left)?;
            let value = self.parse_expression(Precedence::Lowest)?;
            NodeKind::CompoundAssign {
                op,
                target: Box::new(left),
                value: Box::new(value),
            }
        } else {
            match token.kind {
                TokenKind::AndAnd | TokenKind::OrOr => {
                    let op = if token.kind == TokenKind::AndAnd {
                        LogicalOp::And
                    } else {
                        LogicalOp::Or
                    };
                    let right = self.parse_expression(infix_precedence(token.kind))?;
                    NodeKind::Logical {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    }
                }
                TokenKind::Assign => {
                    Self::check_assignable(&left)?;
                    // Right associative: parse the value one level below `=`
                    let value = self.parse_expression(Precedence::Lowest)?;
                    NodeKind::Assign {
                        target: Box::new(left),
                        value: Box::new(value),
                    }
                }
                TokenKind::LParen => {
                    let args = self.parse_expression_list(TokenKind::RParen)?;
                    NodeKind::Call {
                        callee: Box::new(left),
                        args,
                    }
                }
                TokenKind::LBracket => {
                    let index = self.parse_expression(Precedence::Lowest)?;
                    self.expect_token(TokenKind::RBracket)?;
                    NodeKind::Index {
                        target: Box::new(left),
                        index: Box::new(index),
                    }
                }
                TokenKind::Dot => {
                    let name = self.expect_identifier()?;
                    NodeKind::Property {
                        object: Box::new(left),
                        name,
                    }
                }
                found => {
                    return Err(ParseError::NoPrefixRule {
                        found,
                        location: token.location,
                    });
                }
            }
        };

        let span = self.span_from(start);
        Ok(self.node(kind, span))
    }

    fn check_assignable(target: &AstNode) -> Result<(), ParseError> {
        if target.is_assignable() {
            Ok(())
        } else {
            Err(ParseError::InvalidAssignmentTarget {
                target: target.to_string(),
                location: target.span.start,
            })
        }
    }
}
