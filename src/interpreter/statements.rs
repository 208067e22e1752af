//! Statement evaluation implementation
//!
//! This module handles the statements that bind names or branch:
//!
//! - `let` / `const` declarations
//! - Named function declarations
//! - `if` / `elif` / `else`
//!
//! Blocks are handled in the engine's dispatch (one child scope per block),
//! loops in [`loops`](super::loops), jumps in [`jumps`](super::jumps) and
//! classes in [`classes`](super::classes).
//!
//! All methods are implemented as `pub(crate)` methods on the [`Evaluator`].

use crate::interpreter::engine::{Evaluator, Flow};
use crate::interpreter::errors::RuntimeError;
use crate::memory::environment::Env;
use crate::memory::value::Value;
use crate::parser::ast::*;
use std::rc::Rc;

impl Evaluator<'_> {
    /// `let name [= value]`; a missing initializer binds `null`
    pub(crate) fn eval_let(
        &mut self,
        name: &str,
        value: Option<&AstNode>,
        env: &Env,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let value = match value {
            Some(expr) => self.eval_expr(expr, env)?,
            None => Value::Null,
        };
        self.declare(env, name, value, false, location)?;
        Ok(Value::Null)
    }

    pub(crate) fn eval_const(
        &mut self,
        name: &str,
        value: &AstNode,
        env: &Env,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let value = self.eval_expr(value, env)?;
        self.declare(env, name, value, true, location)?;
        Ok(Value::Null)
    }

    /// Bind the function in the current scope; the closure captures that
    /// same scope, so the function can call itself
    pub(crate) fn eval_function_decl(
        &mut self,
        decl: &Rc<FunctionDecl>,
        env: &Env,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let closure = self.make_closure(decl, env);
        let name = decl.name.as_deref().unwrap_or_default();
        self.declare(env, name, closure, false, location)?;
        Ok(Value::Null)
    }

    pub(crate) fn eval_if(
        &mut self,
        condition: &AstNode,
        consequence: &AstNode,
        alternative: Option<&AstNode>,
        env: &Env,
    ) -> Result<Flow, RuntimeError> {
        let condition = self.eval_expr(condition, env)?;
        if condition.is_truthy() {
            self.visit(consequence, env)
        } else if let Some(alternative) = alternative {
            self.visit(alternative, env)
        } else {
            Ok(Flow::Normal(Value::Null))
        }
    }
}
