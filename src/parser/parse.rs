//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, error recovery
//! - `declarations`: function and class declarations, parameter lists
//! - `statements`: let/const, control flow, blocks
//! - `expressions`: Pratt-style precedence climbing over prefix/infix handlers
//!
//! # Error recovery
//!
//! Statement parsers return `Result<_, ParseError>`. The program and block
//! loops catch a failed statement, record the error and skip ahead to the next
//! `;` or `}` before continuing, so one pass reports every independent mistake.

use crate::parser::ast::*;
use crate::parser::lexer::{Lexer, Token, TokenKind};
use thiserror::Error;

/// Positioned parse diagnostic
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Expected {expected}, found {found} at line {}, column {}", .location.line, .location.column)]
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
        location: SourceLocation,
    },

    #[error("No parse rule for {found} at line {}, column {}", .location.line, .location.column)]
    NoPrefixRule {
        found: TokenKind,
        location: SourceLocation,
    },

    #[error("Illegal token '{text}' at line {}, column {}", .location.line, .location.column)]
    IllegalToken {
        text: String,
        location: SourceLocation,
    },

    #[error("Invalid assignment target '{target}' at line {}, column {}", .location.line, .location.column)]
    InvalidAssignmentTarget {
        target: String,
        location: SourceLocation,
    },

    #[error("Invalid number literal '{text}' at line {}, column {}", .location.line, .location.column)]
    InvalidNumber {
        text: String,
        location: SourceLocation,
    },
}

impl ParseError {
    pub fn location(&self) -> SourceLocation {
        match self {
            ParseError::UnexpectedToken { location, .. }
            | ParseError::NoPrefixRule { location, .. }
            | ParseError::IllegalToken { location, .. }
            | ParseError::InvalidAssignmentTarget { location, .. }
            | ParseError::InvalidNumber { location, .. } => *location,
        }
    }
}

/// Recursive descent parser with Pratt expression parsing
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) errors: Vec<ParseError>,
    pub(crate) next_id: NodeId,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        let tokens = Lexer::new(source).tokenize();
        tracing::debug!(tokens = tokens.len(), "lexed source");
        Self::from_tokens(tokens, 0)
    }

    /// Parser over an already-lexed stream; ids start at `first_id`
    pub(crate) fn from_tokens(mut tokens: Vec<Token>, first_id: NodeId) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = tokens.last().map(|t| t.end).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, "", end, end));
        }
        Self {
            tokens,
            position: 0,
            errors: Vec::new(),
            next_id: first_id,
        }
    }

    /// Parse the entire program, recording errors instead of stopping at the first
    pub fn parse_program(&mut self) -> Program {
        let start = self.current_location();
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if self.check(TokenKind::RBrace) {
                let token = self.advance().clone();
                self.errors.push(ParseError::NoPrefixRule {
                    found: token.kind,
                    location: token.location,
                });
                continue;
            }
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }

        let end = self.peek().location;
        let id = self.fresh_id();
        tracing::debug!(
            statements = statements.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        Program {
            id,
            span: Span::new(start, end),
            statements,
        }
    }

    /// Errors collected so far, in source order of discovery
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    /// Skip to the end of the current statement
    pub(crate) fn synchronize(&mut self) {
        while !self.is_at_end() {
            match self.peek().kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ===== Helper methods =====

    pub(crate) fn fresh_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn node(&mut self, kind: NodeKind, span: Span) -> AstNode {
        let id = self.fresh_id();
        AstNode::new(id, span, kind)
    }

    /// Span from `start` to the end of the most recently consumed token
    pub(crate) fn span_from(&self, start: SourceLocation) -> Span {
        Span::new(start, self.previous_end())
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_end(&self) -> SourceLocation {
        if self.position == 0 {
            self.peek().location
        } else {
            self.previous().end
        }
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    pub(crate) fn unexpected(&self, expected: TokenKind) -> ParseError {
        let token = self.peek();
        if token.kind == TokenKind::Illegal {
            return ParseError::IllegalToken {
                text: token.literal.clone(),
                location: token.location,
            };
        }
        ParseError::UnexpectedToken {
            expected,
            found: token.kind,
            location: token.location,
        }
    }

    pub(crate) fn expect_token(&mut self, kind: TokenKind) -> Result<&Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        let token = self.expect_token(TokenKind::Ident)?;
        Ok(token.literal.clone())
    }

    /// Consume an optional statement terminator
    pub(crate) fn skip_semicolon(&mut self) {
        self.match_token(TokenKind::Semicolon);
    }
}
