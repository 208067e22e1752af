// Recording and navigation tests: one pass, then cursor movement over the trace

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;
use stepwise::interpreter::constants::DEFAULT_MAX_CALL_DEPTH;
use stepwise::interpreter::{CancelToken, Limits, RuntimeError};
use stepwise::memory::value::SnapshotValue;
use stepwise::parser;
use stepwise::snapshot::{prepare, Navigator, Outcome, Phase, PrepareError, Trace};

fn trace_with(source: &str, limits: &Limits) -> Trace {
    match prepare(source, limits) {
        Ok(trace) => trace,
        Err(err) => panic!("prepare failed: {}", err),
    }
}

fn trace(source: &str) -> Trace {
    trace_with(source, &Limits::default())
}

#[test]
fn test_every_node_is_entered_and_exited_once() {
    let source = "let a = 1; let b = a + 2; print(b);";
    let program = match parser::parse(source) {
        Ok(program) => program,
        Err(errors) => panic!("parse errors: {:?}", errors),
    };
    let trace = trace(source);

    // Without calls every node is visited exactly once
    let nodes = program.count_nodes();
    assert_eq!(nodes, 11);
    assert_eq!(trace.visits(), nodes);
    assert_eq!(trace.count_phase(Phase::Before), nodes);
    assert_eq!(trace.count_phase(Phase::After), nodes);
    assert_eq!(trace.len(), 2 * nodes);
}

#[test]
fn test_phase_counts_match_visits_for_loop_free_programs() {
    let cases = [
        (
            "fn add(a, b) { return a + b; }
             let x = add(1, 2);
             let y = add(x, add(3, 4));
             y;",
            SnapshotValue::Integer(10),
        ),
        (
            "class Base {
                 let tag = \"b\";
                 fn constructor(n) { this.n = n; }
                 fn describe() { return f\"{this.tag}:{this.n}\"; }
             }
             class Child extends Base {
                 let extra = {\"k\": 1};
                 fn constructor(n) { super(n * 2); }
                 fn describe() { return super.describe() + \"!\"; }
             }
             let c = new Child(3);
             c.describe();",
            SnapshotValue::Str("b:6!".to_string()),
        ),
        (
            "let h = {\"a\": 1, \"b\": 2};
             let n = h[\"a\"];
             n += 5;
             if (n > 10) { n = 0; } elif (n > 5) { n *= 2; } else { n = -1; }
             n;",
            SnapshotValue::Integer(12),
        ),
    ];

    for (source, expected) in cases {
        let trace = trace(source);
        assert_eq!(trace.outcome(), &Outcome::Completed(expected), "source: {}", source);
        assert_eq!(trace.count_phase(Phase::Before), trace.visits(), "source: {}", source);
        assert_eq!(trace.count_phase(Phase::After), trace.visits(), "source: {}", source);
    }
}

#[test]
fn test_repeated_calls_revisit_the_body() {
    let source = "fn one() { return 1; } one() + one() + one();";
    let program = match parser::parse(source) {
        Ok(program) => program,
        Err(errors) => panic!("parse errors: {:?}", errors),
    };
    let trace = trace(source);

    let returns = trace
        .records()
        .iter()
        .filter(|r| r.node.kind == "ReturnStatement" && r.phase == Phase::After)
        .count();
    assert_eq!(returns, 3);
    assert!(trace.visits() > program.count_nodes());
    assert_eq!(trace.count_phase(Phase::Before), trace.visits());
}

#[test]
fn test_records_are_numbered_in_order() {
    let trace = trace("let x = [1, 2]; x[0] = 5;");
    for (i, record) in trace.records().iter().enumerate() {
        assert_eq!(record.seq, i);
    }
}

#[test]
fn test_replay_is_deterministic() {
    let source = "
        fn fib(n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); }
        let out = [];
        for (let i = 0; i < 6; i += 1) { push(out, fib(i)); }
        print(out);
    ";
    let first = trace(source);
    let second = trace(source);

    assert_eq!(first.records(), second.records());
    assert_eq!(first.console(), second.console());
    assert_eq!(first.outcome(), second.outcome());
}

#[test]
fn test_advance_then_retreat_returns_to_same_state() {
    let trace = Arc::new(trace("let a = 1; a = a + 1; print(a);"));
    let mut nav = Navigator::new(trace.clone());

    nav.seek(5);
    let before = nav.current_state().record.clone();
    nav.advance();
    nav.advance();
    nav.retreat();
    nav.retreat();
    assert_eq!(nav.cursor(), 5);
    assert_eq!(nav.current_state().record, &before);

    // Walking the whole trace visits every record exactly once, in order
    nav.rewind();
    let mut seen = vec![nav.cursor()];
    while !nav.is_complete() {
        seen.push(nav.advance().cursor);
    }
    assert_eq!(seen, (0..trace.len()).collect::<Vec<_>>());
}

#[test]
fn test_bindings_track_changes() {
    let trace = trace("let a = 1; a = 2;");
    let assign_after = trace
        .records()
        .iter()
        .find(|r| r.node.kind == "Assignment" && r.phase == Phase::After);
    let record = match assign_after {
        Some(record) => record,
        None => panic!("no assignment record"),
    };
    let a = match record.binding("a") {
        Some(binding) => binding,
        None => panic!("a is not visible"),
    };
    assert_eq!(a.value, SnapshotValue::Integer(2));
    assert!(a.changed);

    // The very next record sees the same value and no longer flags it
    let next = &trace.records()[record.seq + 1];
    assert_eq!(next.binding("a").map(|b| b.changed), Some(false));
}

#[test]
fn test_console_output_is_replayed_by_position() {
    let trace = trace("print(\"one\"); print(\"two\");");
    let mut nav = Navigator::new(trace);

    assert!(nav.current_state().output.is_empty());
    let state = nav.seek_to_end();
    let texts: Vec<&str> = state.output.iter().map(|line| line.text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two"]);

    // Step back to just before the second print returns
    let second_call_end = nav
        .trace()
        .records()
        .iter()
        .rposition(|r| r.node.kind == "CallExpression" && r.phase == Phase::Before);
    let seq = match second_call_end {
        Some(seq) => seq,
        None => panic!("no call record"),
    };
    assert_eq!(nav.seek(seq).output.len(), 1);
}

#[test]
fn test_redeclaration_halts_the_trace() {
    let trace = trace("let x = 1; let x = 2; print(x);");

    match trace.outcome() {
        Outcome::Halted(RuntimeError::Redeclaration { name, .. }) => assert_eq!(name, "x"),
        other => panic!("Expected halted outcome, got {:?}", other),
    }

    let last = &trace.records()[trace.len() - 1];
    assert_eq!(last.phase, Phase::After);
    assert_eq!(last.node.kind, "LetStatement");
    assert_eq!(last.node.span.start.column, 12);
    assert!(last.is_error());

    // Exactly one error record, and nothing from the print
    assert_eq!(trace.records().iter().filter(|r| r.is_error()).count(), 1);
    assert!(trace.records().iter().all(|r| r.node.kind != "CallExpression"));
    assert!(trace.console().is_empty());
}

#[test]
fn test_iteration_ceiling_completes_at_error() {
    let limits = Limits::default().with_max_loop_iterations(5);
    let trace = trace_with("let n = 0; while (true) { n += 1; }", &limits);

    assert!(matches!(
        trace.outcome(),
        Outcome::Halted(RuntimeError::IterationLimit { limit: 5, .. })
    ));

    let mut nav = Navigator::new(trace);
    while !nav.is_complete() {
        assert!(!nav.current_state().record.is_error());
        nav.advance();
    }
    let state = nav.current_state();
    assert!(state.is_complete);
    assert!(state.record.is_error());
    assert_eq!(state.record.node.kind, "WhileStatement");
    assert_eq!(state.record.binding("n").map(|b| b.value.clone()), Some(SnapshotValue::Integer(5)));
}

#[test]
fn test_step_over_skips_function_body() {
    let trace = trace("fn f() { let x = 1; return x; } let y = f(); y;");
    let call_before = trace
        .records()
        .iter()
        .position(|r| r.node.kind == "CallExpression" && r.phase == Phase::Before);
    let seq = match call_before {
        Some(seq) => seq,
        None => panic!("no call record"),
    };

    let body_start = trace
        .records()
        .iter()
        .position(|r| r.depth == 1)
        .unwrap_or_else(|| panic!("no record inside the body"));

    let mut nav = Navigator::new(trace);
    nav.seek(seq);
    // Callee identifier first, still at the call's depth
    assert_eq!(nav.step_over().record.depth, 0);

    // From the last step before the body, the whole body is skipped
    nav.seek(body_start - 1);
    let state = nav.step_over();
    assert_eq!(state.record.depth, 0);
    assert_eq!(state.record.node.kind, "CallExpression");
    assert_eq!(state.record.phase, Phase::After);
}

#[test]
fn test_parse_errors_produce_no_trace() {
    match prepare("let = ;", &Limits::default()) {
        Err(PrepareError::Parse(errors)) => assert!(!errors.is_empty()),
        Ok(trace) => panic!("Expected parse failure, got {} records", trace.len()),
    }
}

#[test]
fn test_cancelled_pass_still_has_a_first_step() {
    let token = CancelToken::new();
    token.cancel();
    let trace = trace_with("let a = 1;", &Limits::default().with_cancel(token));

    assert!(matches!(trace.outcome(), Outcome::Halted(RuntimeError::Cancelled { .. })));
    assert_eq!(trace.len(), 2);
    assert_eq!(trace.records()[0].node.kind, "Program");
    assert!(trace.records()[1].is_error());
}

#[test]
fn test_trace_can_be_shared_across_threads() {
    let trace = Arc::new(trace("let total = 0; for (let i = 0; i < 4; i += 1) { total += i; } total;"));
    assert_eq!(trace.outcome(), &Outcome::Completed(SnapshotValue::Integer(6)));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let trace = Arc::clone(&trace);
            thread::spawn(move || {
                let mut nav = Navigator::new(trace);
                nav.seek_to_end().cursor
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().ok(), Some(trace.len() - 1));
    }
}

#[test]
fn test_default_call_depth_limit_on_spawned_thread() {
    let handle = thread::spawn(|| {
        let trace = trace("fn down(n) { return down(n + 1); } down(0);");
        match trace.outcome() {
            Outcome::Halted(RuntimeError::CallDepthExceeded { limit, .. }) => Some(*limit),
            _ => None,
        }
    });
    assert_eq!(handle.join().ok(), Some(Some(DEFAULT_MAX_CALL_DEPTH)));
}

#[test]
fn test_deep_nesting_on_spawned_thread() {
    let handle = thread::spawn(|| {
        let parens = format!("{}1{};", "(".repeat(3000), ")".repeat(3000));
        let sums = format!("{}0{};", "(".repeat(1500), " + 1)".repeat(1500));
        [parens, sums].map(|source| trace(&source).outcome().clone())
    });
    let outcomes = match handle.join() {
        Ok(outcomes) => outcomes,
        Err(_) => panic!("nested program crashed its thread"),
    };
    assert_eq!(
        outcomes,
        [
            Outcome::Completed(SnapshotValue::Integer(1)),
            Outcome::Completed(SnapshotValue::Integer(1500)),
        ]
    );
}
