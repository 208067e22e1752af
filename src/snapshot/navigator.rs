//! Cursor over a finished trace
//!
//! The trace is fully materialized before navigation starts, so every move
//! is an index change: stepping backward never re-runs user code and never
//! needs to undo side effects. [`ExecutionState`] is derived from the cursor
//! on every call and is never stored.

use super::recorder::{StepRecord, Trace};
use super::ConsoleLine;
use std::sync::Arc;

/// What a viewer needs to show one step
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionState<'a> {
    pub cursor: usize,
    pub record: &'a StepRecord,
    /// The cursor sits on the final record
    pub is_complete: bool,
    /// Console output up to and including this step
    pub output: &'a [ConsoleLine],
}

/// Moves a cursor through a [`Trace`]
#[derive(Debug, Clone)]
pub struct Navigator {
    trace: Arc<Trace>,
    cursor: usize,
}

impl Navigator {
    /// Navigator positioned on the first record
    ///
    /// A trace produced by `prepare` always holds at least the program's
    /// `before` and `after` records.
    pub fn new(trace: impl Into<Arc<Trace>>) -> Self {
        Navigator {
            trace: trace.into(),
            cursor: 0,
        }
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.cursor + 1 >= self.trace.len()
    }

    pub fn current_state(&self) -> ExecutionState<'_> {
        let records = self.trace.records();
        ExecutionState {
            cursor: self.cursor,
            record: &records[self.cursor.min(records.len().saturating_sub(1))],
            is_complete: self.is_complete(),
            output: self.trace.output_at(self.cursor),
        }
    }

    /// Move forward one record, stopping at the last
    pub fn advance(&mut self) -> ExecutionState<'_> {
        self.cursor = (self.cursor + 1).min(self.last());
        self.current_state()
    }

    /// Move back one record, stopping at the first
    pub fn retreat(&mut self) -> ExecutionState<'_> {
        self.cursor = self.cursor.saturating_sub(1);
        self.current_state()
    }

    /// Jump to record `seq`, clamped to the trace
    pub fn seek(&mut self, seq: usize) -> ExecutionState<'_> {
        self.cursor = seq.min(self.last());
        self.current_state()
    }

    pub fn rewind(&mut self) -> ExecutionState<'_> {
        self.seek(0)
    }

    pub fn seek_to_end(&mut self) -> ExecutionState<'_> {
        let last = self.last();
        self.seek(last)
    }

    /// Advance to the next record that is not inside a deeper call
    ///
    /// From a call site this skips the callee's body entirely.
    pub fn step_over(&mut self) -> ExecutionState<'_> {
        let records = self.trace.records();
        let depth = records.get(self.cursor).map_or(0, |record| record.depth);
        let next = records
            .iter()
            .skip(self.cursor + 1)
            .find(|record| record.depth <= depth)
            .map_or(self.last(), |record| record.seq);
        self.seek(next)
    }

    fn last(&self) -> usize {
        self.trace.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::limits::Limits;
    use crate::snapshot::recorder::{prepare, Phase};

    fn navigator(source: &str) -> Navigator {
        match prepare(source, &Limits::default()) {
            Ok(trace) => Navigator::new(trace),
            Err(err) => panic!("prepare failed: {}", err),
        }
    }

    #[test]
    fn test_starts_at_program_entry() {
        let nav = navigator("let x = 1;");
        let state = nav.current_state();

        assert_eq!(state.cursor, 0);
        assert_eq!(state.record.node.kind, "Program");
        assert_eq!(state.record.phase, Phase::Before);
        assert!(!state.is_complete);
    }

    #[test]
    fn test_advance_clamps_and_completes_at_last_record() {
        let mut nav = navigator("1;");
        let last = nav.len() - 1;

        for _ in 0..last - 1 {
            assert!(!nav.advance().is_complete);
        }
        assert!(nav.advance().is_complete);
        assert_eq!(nav.cursor(), last);

        let state = nav.advance();
        assert_eq!(state.cursor, last);
        assert!(state.is_complete);
    }

    #[test]
    fn test_retreat_clamps_at_zero() {
        let mut nav = navigator("1;");
        assert_eq!(nav.retreat().cursor, 0);
    }

    #[test]
    fn test_advance_then_retreat_restores_state() {
        let mut nav = navigator("let a = [1]; push(a, 2); print(a);");
        nav.seek(5);
        let before = nav.current_state().clone();
        let before_owned = (before.cursor, before.record.clone(), before.output.to_vec());

        nav.advance();
        let after_retreat = nav.retreat();

        assert_eq!(
            (
                after_retreat.cursor,
                after_retreat.record.clone(),
                after_retreat.output.to_vec()
            ),
            before_owned
        );
    }

    #[test]
    fn test_seek_clamps_past_end() {
        let mut nav = navigator("1;");
        let state = nav.seek(10_000);
        assert_eq!(state.cursor, nav.len() - 1);
    }

    #[test]
    fn test_step_over_skips_callee_body() {
        let mut nav = navigator("fn f() { let t = 1; return t; }\nlet r = f();");
        let call = nav
            .trace()
            .records()
            .iter()
            .position(|r| r.node.kind == "CallExpression" && r.phase == Phase::Before)
            .unwrap_or_else(|| panic!("no call record"));
        nav.seek(call);

        // Next at depth 0: the callee identifier's records
        let state = nav.step_over();
        assert_eq!(state.record.depth, 0);

        // Stepping over from the last record before the body lands after the call
        while nav.current_state().record.node.kind != "Identifier"
            || nav.current_state().record.phase != Phase::After
        {
            nav.advance();
        }
        let state = nav.step_over();
        assert_eq!(state.record.depth, 0);
        assert_eq!(state.record.node.kind, "CallExpression");
        assert_eq!(state.record.phase, Phase::After);
    }

    #[test]
    fn test_output_follows_cursor() {
        let mut nav = navigator("print(1); print(2);");
        assert!(nav.current_state().output.is_empty());

        let end = nav.seek_to_end();
        assert_eq!(end.output.len(), 2);
        assert_eq!(end.output[1].text, "2");

        assert!(nav.rewind().output.is_empty());
    }
}
