//! Loop statement evaluation (`while`, `for`).
//!
//! Adds `Evaluator` methods for the two loop forms. The body is a block node,
//! so visiting it gives every iteration a fresh child scope. `break` and
//! `continue` arrive as [`Flow`] values and are consumed here; `return`
//! passes through to the enclosing call.
//!
//! Each loop counts its own iterations and halts the pass with
//! [`RuntimeError::IterationLimit`] once the configured ceiling is reached.

use crate::interpreter::engine::{Evaluator, Flow};
use crate::interpreter::errors::RuntimeError;
use crate::memory::environment::Env;
use crate::memory::value::Value;
use crate::parser::ast::{AstNode, SourceLocation};

/// What the loop driver should do after one body run
enum LoopStep {
    Next,
    Exit,
    Propagate(Flow),
}

impl Evaluator<'_> {
    fn run_loop_body(&mut self, body: &AstNode, env: &Env) -> Result<LoopStep, RuntimeError> {
        self.loop_depth += 1;
        let flow = self.visit(body, env);
        self.loop_depth -= 1;

        Ok(match flow? {
            Flow::Normal(_) | Flow::Continue => LoopStep::Next,
            Flow::Break => LoopStep::Exit,
            ret @ Flow::Return(_) => LoopStep::Propagate(ret),
        })
    }

    fn count_iteration(&self, iterations: &mut usize, location: SourceLocation) -> Result<(), RuntimeError> {
        if *iterations >= self.limits.max_loop_iterations {
            return Err(RuntimeError::IterationLimit {
                limit: self.limits.max_loop_iterations,
                location,
            });
        }
        *iterations += 1;
        Ok(())
    }

    /// Evaluates a `while (condition) { body }` loop.
    pub(crate) fn eval_while(
        &mut self,
        condition: &AstNode,
        body: &AstNode,
        env: &Env,
        location: SourceLocation,
    ) -> Result<Flow, RuntimeError> {
        let mut iterations = 0;
        loop {
            if !self.eval_expr(condition, env)?.is_truthy() {
                break;
            }
            self.count_iteration(&mut iterations, location)?;

            match self.run_loop_body(body, env)? {
                LoopStep::Next => {}
                LoopStep::Exit => break,
                LoopStep::Propagate(flow) => return Ok(flow),
            }
        }
        tracing::trace!(iterations, "while loop finished");
        Ok(Flow::Normal(Value::Null))
    }

    /// Evaluates a `for (init; condition; update) { body }` loop.
    ///
    /// All three clauses are optional; a missing condition is always true.
    /// The initializer lives in a loop scope that encloses every iteration.
    pub(crate) fn eval_for(
        &mut self,
        init: Option<&AstNode>,
        condition: Option<&AstNode>,
        update: Option<&AstNode>,
        body: &AstNode,
        env: &Env,
        location: SourceLocation,
    ) -> Result<Flow, RuntimeError> {
        let scope = self.child_scope(env);
        if let Some(init) = init {
            self.visit(init, &scope)?;
        }

        let mut iterations = 0;
        loop {
            if let Some(condition) = condition {
                if !self.eval_expr(condition, &scope)?.is_truthy() {
                    break;
                }
            }
            self.count_iteration(&mut iterations, location)?;

            match self.run_loop_body(body, &scope)? {
                LoopStep::Next => {}
                LoopStep::Exit => break,
                LoopStep::Propagate(flow) => return Ok(flow),
            }

            if let Some(update) = update {
                self.eval_expr(update, &scope)?;
            }
        }
        tracing::trace!(iterations, "for loop finished");
        Ok(Flow::Normal(Value::Null))
    }
}
