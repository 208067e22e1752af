//! Statement parsing implementation
//!
//! This module handles parsing of statements:
//! - `let` / `const` declarations
//! - `return`, `break`, `continue`
//! - Blocks `{ ... }` (with per-statement error recovery)
//! - `if` / `elif` / `else`, `while`, C-style `for`
//! - Expression statements
//!
//! Statement terminators are optional: a `;` is consumed when present.

use crate::parser::ast::*;
use crate::parser::expressions::Precedence;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use crate::stack::ensure_sufficient_stack;

impl Parser {
    /// Parse a single statement
    pub(crate) fn parse_statement(&mut self) -> Result<AstNode, ParseError> {
        ensure_sufficient_stack(|| self.parse_statement_form())
    }

    fn parse_statement_form(&mut self) -> Result<AstNode, ParseError> {
        match self.peek().kind {
            TokenKind::Let => {
                let stmt = self.parse_let()?;
                self.skip_semicolon();
                Ok(stmt)
            }
            TokenKind::Const => {
                let stmt = self.parse_const()?;
                self.skip_semicolon();
                Ok(stmt)
            }
            TokenKind::Return => self.parse_return(),
            TokenKind::Break | TokenKind::Continue => {
                let start = self.current_location();
                let kind = if self.advance().kind == TokenKind::Break {
                    NodeKind::Break
                } else {
                    NodeKind::Continue
                };
                self.skip_semicolon();
                let span = self.span_from(start);
                Ok(self.node(kind, span))
            }
            TokenKind::LBrace => self.parse_block(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Fn if self.peek_ahead(1).is_some_and(|t| t.kind == TokenKind::Ident) => {
                self.parse_function_declaration()
            }
            TokenKind::Class => self.parse_class(),
            _ => {
                let stmt = self.parse_expression_statement()?;
                self.skip_semicolon();
                Ok(stmt)
            }
        }
    }

    /// `let name [= value]` without the terminator
    fn parse_let(&mut self) -> Result<AstNode, ParseError> {
        let start = self.current_location();
        self.expect_token(TokenKind::Let)?;
        let name = self.expect_identifier()?;

        let value = if self.match_token(TokenKind::Assign) {
            Some(Box::new(self.parse_expression(Precedence::Lowest)?))
        } else if self.at_statement_end() {
            None
        } else {
            return Err(self.unexpected(TokenKind::Assign));
        };

        let span = self.span_from(start);
        Ok(self.node(NodeKind::Let { name, value }, span))
    }

    /// `const name = value` without the terminator
    fn parse_const(&mut self) -> Result<AstNode, ParseError> {
        let start = self.current_location();
        self.expect_token(TokenKind::Const)?;
        let name = self.expect_identifier()?;
        self.expect_token(TokenKind::Assign)?;
        let value = Box::new(self.parse_expression(Precedence::Lowest)?);

        let span = self.span_from(start);
        Ok(self.node(NodeKind::Const { name, value }, span))
    }

    fn parse_return(&mut self) -> Result<AstNode, ParseError> {
        let start = self.current_location();
        self.expect_token(TokenKind::Return)?;

        let value = if self.at_statement_end() {
            None
        } else {
            Some(Box::new(self.parse_expression(Precedence::Lowest)?))
        };
        self.skip_semicolon();

        let span = self.span_from(start);
        Ok(self.node(NodeKind::Return(value), span))
    }

    fn parse_expression_statement(&mut self) -> Result<AstNode, ParseError> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        let span = expr.span;
        Ok(self.node(NodeKind::Expression(Box::new(expr)), span))
    }

    /// `{ statements }`; errors inside are recorded and skipped
    pub(crate) fn parse_block(&mut self) -> Result<AstNode, ParseError> {
        let start = self.current_location();
        self.expect_token(TokenKind::LBrace)?;
        let mut statements = Vec::new();

        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }

        self.expect_token(TokenKind::RBrace)?;
        let span = self.span_from(start);
        Ok(self.node(NodeKind::Block(statements), span))
    }

    /// `if cond { } [elif cond { }]* [else { }]`; `else if` is accepted too
    fn parse_if(&mut self) -> Result<AstNode, ParseError> {
        let start = self.current_location();
        self.advance(); // `if` or `elif`

        let condition = self.parse_expression(Precedence::Lowest)?;
        let consequence = self.parse_block()?;

        let alternative = if self.check(TokenKind::Elif) {
            Some(Box::new(self.parse_if()?))
        } else if self.match_token(TokenKind::Else) {
            if self.check(TokenKind::If) {
                Some(Box::new(self.parse_if()?))
            } else {
                Some(Box::new(self.parse_block()?))
            }
        } else {
            None
        };

        let span = self.span_from(start);
        Ok(self.node(
            NodeKind::If {
                condition: Box::new(condition),
                consequence: Box::new(consequence),
                alternative,
            },
            span,
        ))
    }

    fn parse_while(&mut self) -> Result<AstNode, ParseError> {
        let start = self.current_location();
        self.expect_token(TokenKind::While)?;

        let condition = self.parse_expression(Precedence::Lowest)?;
        let body = self.parse_block()?;

        let span = self.span_from(start);
        Ok(self.node(
            NodeKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
            },
            span,
        ))
    }

    /// `for (init; condition; update) { body }`, every clause optional
    fn parse_for(&mut self) -> Result<AstNode, ParseError> {
        let start = self.current_location();
        self.expect_token(TokenKind::For)?;
        self.expect_token(TokenKind::LParen)?;

        let init = match self.peek().kind {
            TokenKind::Semicolon => None,
            TokenKind::Let => Some(Box::new(self.parse_let()?)),
            TokenKind::Const => Some(Box::new(self.parse_const()?)),
            _ => Some(Box::new(self.parse_expression_statement()?)),
        };
        self.expect_token(TokenKind::Semicolon)?;

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression(Precedence::Lowest)?))
        };
        self.expect_token(TokenKind::Semicolon)?;

        let update = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_expression(Precedence::Lowest)?))
        };
        self.expect_token(TokenKind::RParen)?;

        let body = self.parse_block()?;

        let span = self.span_from(start);
        Ok(self.node(
            NodeKind::For {
                init,
                condition,
                update,
                body: Box::new(body),
            },
            span,
        ))
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        )
    }
}
