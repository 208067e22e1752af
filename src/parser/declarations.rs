//! Function and class declaration parsing
//!
//! - `fn name(a, b) { ... }` declares a binding in the current scope
//! - `fn(a, b) { ... }` (see `expressions`) is the anonymous literal form
//! - `class Name [extends Parent] { let f = e; const g = e; fn m() { ... } }`
//!
//! Function bodies are wrapped in `Rc` so every closure created from the
//! declaration shares one copy of the tree.

use crate::parser::ast::*;
use crate::parser::expressions::Precedence;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use std::rc::Rc;

impl Parser {
    /// `fn name(params) { body }` in statement position
    pub(crate) fn parse_function_declaration(&mut self) -> Result<AstNode, ParseError> {
        let start = self.current_location();
        self.expect_token(TokenKind::Fn)?;
        let name = self.expect_identifier()?;
        let decl = self.parse_function_rest(Some(name))?;

        let span = self.span_from(start);
        Ok(self.node(NodeKind::FunctionDecl(Rc::new(decl)), span))
    }

    /// Parameter list and body; the `fn` keyword and name are already consumed
    pub(crate) fn parse_function_rest(
        &mut self,
        name: Option<String>,
    ) -> Result<FunctionDecl, ParseError> {
        self.expect_token(TokenKind::LParen)?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(FunctionDecl { name, params, body })
    }

    fn parse_params(&mut self) -> Result<Vec<String>, ParseError> {
        let mut params = Vec::new();

        while !self.check(TokenKind::RParen) {
            params.push(self.expect_identifier()?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        self.expect_token(TokenKind::RParen)?;
        Ok(params)
    }

    pub(crate) fn parse_class(&mut self) -> Result<AstNode, ParseError> {
        let start = self.current_location();
        self.expect_token(TokenKind::Class)?;
        let name = self.expect_identifier()?;

        let parent = if self.match_token(TokenKind::Extends) {
            Some(self.expect_identifier()?)
        } else {
            None
        };

        self.expect_token(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        let mut methods = Vec::new();

        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            match self.peek().kind {
                TokenKind::Let | TokenKind::Const => fields.push(self.parse_field()?),
                TokenKind::Fn => {
                    self.advance();
                    let method_name = self.expect_identifier()?;
                    methods.push(Rc::new(self.parse_function_rest(Some(method_name))?));
                }
                _ => return Err(self.unexpected(TokenKind::Fn)),
            }
        }

        self.expect_token(TokenKind::RBrace)?;
        let span = self.span_from(start);
        Ok(self.node(
            NodeKind::Class(Rc::new(ClassDecl {
                name,
                parent,
                fields,
                methods,
            })),
            span,
        ))
    }

    fn parse_field(&mut self) -> Result<FieldDecl, ParseError> {
        let start = self.current_location();
        let constant = self.advance().kind == TokenKind::Const;
        let name = self.expect_identifier()?;

        let init = if self.match_token(TokenKind::Assign) {
            Some(self.parse_expression(Precedence::Lowest)?)
        } else {
            None
        };
        self.skip_semicolon();

        Ok(FieldDecl {
            name,
            constant,
            init,
            span: self.span_from(start),
        })
    }
}
