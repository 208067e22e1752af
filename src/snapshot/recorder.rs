//! Trace recording
//!
//! [`prepare`] parses a source string, evaluates it exactly once with a
//! [`StepRecorder`] attached, and returns the resulting [`Trace`]. The
//! recorder receives a `before` and an `after` callback for every node the
//! evaluator visits and turns each into a [`StepRecord`] holding:
//! - the node's id, kind label and source span
//! - the produced value (after records only)
//! - every binding visible at that instant, frozen, with the ones that differ
//!   from the previous record marked `changed`
//! - how many console lines existed at that point
//!
//! The first runtime error becomes a single terminal `after` record on the
//! innermost node being evaluated. Nothing is recorded after it.

use super::{Console, ConsoleLine, ConsoleLog};
use crate::interpreter::engine::{Evaluator, Tracer};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::limits::Limits;
use crate::memory::environment::{visible_bindings, Env, ScopeId};
use crate::memory::value::{SnapshotValue, Value};
use crate::parser;
use crate::parser::ast::{NodeInfo, Span};
use crate::parser::parse::ParseError;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Entry or exit of a node visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Before,
    After,
}

/// One binding as it looked at a recorded step
#[derive(Debug, Clone, PartialEq)]
pub struct BindingSnapshot {
    pub scope: ScopeId,
    pub name: String,
    pub value: SnapshotValue,
    pub constant: bool,
    /// New in this scope, or holding a different value than at the previous step
    pub changed: bool,
}

/// A single recorded evaluation event
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub seq: usize,
    pub node: NodeInfo,
    pub phase: Phase,
    pub result: Option<SnapshotValue>,
    pub error: Option<RuntimeError>,
    /// User function call depth; top-level code is 0
    pub depth: usize,
    pub bindings: Vec<BindingSnapshot>,
    /// Console lines emitted up to and including this step
    pub output_len: usize,
}

impl StepRecord {
    pub fn span(&self) -> Span {
        self.node.span
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn binding(&self, name: &str) -> Option<&BindingSnapshot> {
        self.bindings.iter().find(|binding| binding.name == name)
    }
}

/// How the single evaluation pass ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Ran to the end; carries the value of the last top-level statement
    Completed(SnapshotValue),
    /// Stopped at the first runtime error
    Halted(RuntimeError),
}

/// Everything one pass produced; immutable and shareable across threads
#[derive(Debug, Clone)]
pub struct Trace {
    records: Vec<StepRecord>,
    console: Vec<ConsoleLine>,
    outcome: Outcome,
    visits: usize,
}

impl Trace {
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn get(&self, seq: usize) -> Option<&StepRecord> {
        self.records.get(seq)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every console line of the pass
    pub fn console(&self) -> &[ConsoleLine] {
        &self.console
    }

    /// Console lines that existed at record `seq`
    pub fn output_at(&self, seq: usize) -> &[ConsoleLine] {
        let len = self.records.get(seq).map_or(0, |record| record.output_len);
        &self.console[..len]
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Node visits the evaluator made, including the one that failed
    pub fn visits(&self) -> usize {
        self.visits
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.outcome, Outcome::Halted(_))
    }

    pub fn count_phase(&self, phase: Phase) -> usize {
        self.records.iter().filter(|r| r.phase == phase).count()
    }
}

/// Source could not be turned into a trace at all
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PrepareError {
    #[error("{}", join_messages(.0))]
    Parse(Vec<ParseError>),
}

fn join_messages(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// [`Tracer`] that turns evaluator callbacks into step records
#[derive(Debug, Default)]
pub struct StepRecorder {
    records: Vec<StepRecord>,
    console: ConsoleLog,
    previous: FxHashMap<(ScopeId, String), SnapshotValue>,
}

impl StepRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Seal the recording; a pass always records at least its program node
    pub(crate) fn finish(self, outcome: Outcome, visits: usize) -> Trace {
        Trace {
            records: self.records,
            console: self.console.into_lines(),
            outcome,
            visits,
        }
    }

    fn snapshot_bindings(&mut self, env: &Env) -> Vec<BindingSnapshot> {
        let mut current = FxHashMap::default();
        let bindings = visible_bindings(env)
            .into_iter()
            .map(|(scope, binding)| {
                let value = binding.value.freeze();
                let key = (scope, binding.name);
                let changed = self.previous.get(&key) != Some(&value);
                current.insert(key.clone(), value.clone());
                BindingSnapshot {
                    scope,
                    name: key.1,
                    value,
                    constant: binding.constant,
                    changed,
                }
            })
            .collect();
        self.previous = current;
        bindings
    }

    fn push(
        &mut self,
        node: NodeInfo,
        env: &Env,
        depth: usize,
        phase: Phase,
        result: Option<SnapshotValue>,
        error: Option<RuntimeError>,
    ) {
        let bindings = self.snapshot_bindings(env);
        let seq = self.records.len();
        self.records.push(StepRecord {
            seq,
            node,
            phase,
            result,
            error,
            depth,
            bindings,
            output_len: self.console.len(),
        });
        // Output produced from here on belongs to the next record
        self.console.set_seq(seq + 1);
    }
}

impl Tracer for StepRecorder {
    fn console(&mut self) -> &mut dyn Console {
        &mut self.console
    }

    fn before(&mut self, node: NodeInfo, env: &Env, depth: usize) {
        self.push(node, env, depth, Phase::Before, None, None);
    }

    fn after(
        &mut self,
        node: NodeInfo,
        env: &Env,
        depth: usize,
        result: Result<&Value, &RuntimeError>,
    ) {
        match result {
            Ok(value) => self.push(node, env, depth, Phase::After, Some(value.freeze()), None),
            Err(err) => self.push(node, env, depth, Phase::After, None, Some(err.clone())),
        }
    }
}

/// Parse and evaluate `source` once, recording every step
///
/// Returns [`PrepareError::Parse`] when the source has any parse error; no
/// evaluation happens then. A runtime error still yields a trace, ending at
/// the failing step, with [`Outcome::Halted`].
pub fn prepare(source: &str, limits: &Limits) -> Result<Trace, PrepareError> {
    tracing::info!(bytes = source.len(), "preparing trace");

    let program = parser::parse(source).map_err(|errors| {
        tracing::warn!(errors = errors.len(), "source has parse errors");
        PrepareError::Parse(errors)
    })?;

    let mut recorder = StepRecorder::new();
    let (result, visits) = {
        let mut evaluator = Evaluator::new(&mut recorder, limits.clone());
        let result = evaluator.eval_program(&program);
        (result, evaluator.visits())
    };

    let outcome = match result {
        Ok(value) => Outcome::Completed(value.freeze()),
        Err(err) => {
            tracing::warn!(error = %err, "evaluation halted");
            Outcome::Halted(err)
        }
    };
    let trace = recorder.finish(outcome, visits);

    tracing::info!(
        steps = trace.len(),
        output_lines = trace.console().len(),
        "trace ready"
    );
    Ok(trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn trace(source: &str) -> Trace {
        match prepare(source, &Limits::default()) {
            Ok(trace) => trace,
            Err(err) => panic!("prepare failed: {}", err),
        }
    }

    #[test]
    fn test_program_is_outermost_record() {
        let trace = trace("1 + 2;");
        let first = &trace.records()[0];
        let last = &trace.records()[trace.len() - 1];

        assert_eq!(first.node.kind, "Program");
        assert_eq!(first.phase, Phase::Before);
        assert_eq!(last.node.kind, "Program");
        assert_eq!(last.phase, Phase::After);
        assert_eq!(last.result, Some(SnapshotValue::Integer(3)));
        assert_eq!(trace.outcome(), &Outcome::Completed(SnapshotValue::Integer(3)));
    }

    #[test]
    fn test_sequence_numbers_are_dense() {
        let trace = trace("let a = [1, 2]; let b = a[0] * 3;");
        for (index, record) in trace.records().iter().enumerate() {
            assert_eq!(record.seq, index);
        }
    }

    #[test]
    fn test_changed_flag_marks_new_and_updated_bindings() {
        let trace = trace("let x = 1; x = 2;");
        let records = trace.records();

        // The record right after `let x = 1` finishes introduces x
        let declared = records
            .iter()
            .find(|r| r.node.kind == "LetStatement" && r.phase == Phase::After)
            .and_then(|r| r.binding("x"))
            .map(|b| (b.value.clone(), b.changed));
        assert_eq!(declared, Some((SnapshotValue::Integer(1), true)));

        let assigned = records
            .iter()
            .find(|r| r.node.kind == "Assignment" && r.phase == Phase::After)
            .and_then(|r| r.binding("x"))
            .map(|b| (b.value.clone(), b.changed));
        assert_eq!(assigned, Some((SnapshotValue::Integer(2), true)));

        let settled = records.last().and_then(|r| r.binding("x")).map(|b| b.changed);
        assert_eq!(settled, Some(false));
    }

    #[test]
    fn test_snapshots_do_not_alias_live_values() {
        let trace = trace("let a = [1]; push(a, 2); push(a, 3);");
        let first = trace
            .records()
            .iter()
            .find(|r| r.binding("a").is_some())
            .and_then(|r| r.binding("a"))
            .map(|b| b.value.clone());

        assert_eq!(first, Some(SnapshotValue::Array(vec![SnapshotValue::Integer(1)])));
    }

    #[test]
    fn test_output_is_attributed_to_the_emitting_call() {
        let trace = trace("print(\"a\"); print(\"b\");");

        assert_eq!(trace.console().len(), 2);
        for line in trace.console() {
            let record = &trace.records()[line.seq];
            assert_eq!(record.node.kind, "CallExpression");
            assert_eq!(record.phase, Phase::After);
        }
        assert_eq!(trace.output_at(0).len(), 0);
        assert_eq!(trace.output_at(trace.len() - 1).len(), 2);
    }

    #[test]
    fn test_runtime_error_is_single_terminal_record() {
        let trace = trace("let a = 1;\nlet b = a / 0;\nprint(b);");
        let last = &trace.records()[trace.len() - 1];

        assert_eq!(trace.records().iter().filter(|r| r.is_error()).count(), 1);
        assert!(last.is_error());
        assert_eq!(last.node.kind, "InfixExpression");
        assert_eq!(last.span().start.line, 2);
        assert!(trace.console().is_empty());
        assert!(matches!(
            trace.outcome(),
            Outcome::Halted(RuntimeError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_parse_errors_prevent_evaluation() {
        match prepare("let = 1; print(\"never\");", &Limits::default()) {
            Err(PrepareError::Parse(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].location().line, 1);
            }
            Ok(_) => panic!("Expected parse failure"),
        }
    }

    #[test]
    fn test_call_depth_is_recorded() {
        let trace = trace("fn id(x) { return x; } id(1);");
        let max_depth = trace.records().iter().map(|r| r.depth).max();
        let ret = trace
            .records()
            .iter()
            .find(|r| r.node.kind == "ReturnStatement")
            .map(|r| r.depth);

        assert_eq!(max_depth, Some(1));
        assert_eq!(ret, Some(1));
    }

    #[test]
    fn test_trace_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Trace>();
    }

    #[test]
    fn test_exhausted_budget_still_records_program_step() {
        let limits = Limits::default().with_max_steps(0);
        let trace = match prepare("let a = 1;", &limits) {
            Ok(trace) => trace,
            Err(err) => panic!("prepare failed: {}", err),
        };

        assert_eq!(trace.len(), 2);
        assert_eq!(trace.visits(), 1);
        assert_eq!(trace.records()[0].phase, Phase::Before);
        assert!(trace.records()[1].is_error());
        assert!(matches!(
            trace.outcome(),
            Outcome::Halted(RuntimeError::StepLimit { limit: 0, .. })
        ));
    }
}
