//! Per-pass evaluation limits and cancellation
//!
//! [`Limits`] is passed to every prepare/run call so callers can trade
//! thoroughness against responsiveness. [`CancelToken`] lets another thread
//! stop a pass; the evaluator polls it once per node visit.

use crate::interpreter::constants::{
    DEFAULT_MAX_CALL_DEPTH, DEFAULT_MAX_LOOP_ITERATIONS, DEFAULT_MAX_STEPS,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Ceilings for one evaluation pass
#[derive(Debug, Clone)]
pub struct Limits {
    pub max_loop_iterations: usize,
    pub max_call_depth: usize,
    pub max_steps: usize,
    pub cancel: Option<CancelToken>,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_loop_iterations: DEFAULT_MAX_LOOP_ITERATIONS,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_steps: DEFAULT_MAX_STEPS,
            cancel: None,
        }
    }
}

impl Limits {
    pub fn with_max_loop_iterations(mut self, limit: usize) -> Self {
        self.max_loop_iterations = limit;
        self
    }

    pub fn with_max_call_depth(mut self, limit: usize) -> Self {
        self.max_call_depth = limit;
        self
    }

    pub fn with_max_steps(mut self, limit: usize) -> Self {
        self.max_steps = limit;
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}
