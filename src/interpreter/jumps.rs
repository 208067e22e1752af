use crate::interpreter::engine::{Evaluator, Flow};
use crate::interpreter::errors::RuntimeError;
use crate::memory::environment::Env;
use crate::memory::value::Value;
use crate::parser::ast::{AstNode, SourceLocation};

impl Evaluator<'_> {
    pub(crate) fn eval_return(&mut self, value: Option<&AstNode>, env: &Env) -> Result<Flow, RuntimeError> {
        let value = match value {
            Some(expr) => self.eval_expr(expr, env)?,
            None => Value::Null,
        };
        Ok(Flow::Return(value))
    }

    pub(crate) fn eval_break(&mut self, location: SourceLocation) -> Result<Flow, RuntimeError> {
        if self.loop_depth == 0 {
            return Err(RuntimeError::JumpOutsideLoop {
                keyword: "break",
                location,
            });
        }
        Ok(Flow::Break)
    }

    pub(crate) fn eval_continue(&mut self, location: SourceLocation) -> Result<Flow, RuntimeError> {
        if self.loop_depth == 0 {
            return Err(RuntimeError::JumpOutsideLoop {
                keyword: "continue",
                location,
            });
        }
        Ok(Flow::Continue)
    }
}
