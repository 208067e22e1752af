//! Tree-walking evaluator
//!
//! This module provides the core execution logic:
//! - [`engine`]: the [`Evaluator`], node dispatch, scopes and calls
//! - [`errors`]: runtime error types
//! - [`limits`]: iteration, call depth and step ceilings plus cancellation
//! - [`builtins`]: host functions such as `print` and `len`
//!
//! The remaining modules add `Evaluator` methods for one family of nodes each.
//!
//! # Execution Model
//!
//! One pass evaluates the whole program. Every node visit is reported to a
//! [`Tracer`]; the step recorder in [`crate::snapshot`] is the tracer that
//! turns a pass into a replayable trace, while [`run`] evaluates with no
//! recording at all.

pub mod builtins;
mod classes;
pub mod constants;
pub mod engine;
pub mod errors;
mod expressions;
mod jumps;
pub mod limits;
mod loops;
mod ops;
mod statements;

pub use builtins::Builtin;
pub use engine::{Evaluator, Tracer, Untraced};
pub use errors::RuntimeError;
pub use limits::{CancelToken, Limits};

use crate::memory::value::Value;
use crate::parser::ast::Program;
use crate::snapshot::Console;

/// Evaluate `program` without recording, sending output to `console`
pub fn run(program: &Program, console: &mut dyn Console, limits: &Limits) -> Result<Value, RuntimeError> {
    let mut tracer = Untraced::new(console);
    let mut evaluator = Evaluator::new(&mut tracer, limits.clone());
    let result = evaluator.eval_program(program);
    tracing::debug!(visits = evaluator.visits(), ok = result.is_ok(), "run finished");
    result
}
