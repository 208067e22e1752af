// Integration tests for the evaluator, through the public API

use pretty_assertions::assert_eq;
use stepwise::interpreter::{run, Limits, RuntimeError};
use stepwise::memory::value::Value;
use stepwise::parser::{self, ParseError};
use stepwise::snapshot::ConsoleLog;
use std::fs;
use std::path::Path;

fn run_source(source: &str) -> (Result<Value, RuntimeError>, Vec<String>) {
    let program = match parser::parse(source) {
        Ok(program) => program,
        Err(errors) => panic!("parse errors: {:?}", errors),
    };
    let mut console = ConsoleLog::new();
    let result = run(&program, &mut console, &Limits::default());
    (result, console.texts())
}

fn output(source: &str) -> Vec<String> {
    let (result, lines) = run_source(source);
    assert!(result.is_ok(), "Execution failed: {:?}", result);
    lines
}

#[test]
fn test_tour_demo() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/tour.sw");
    let source = fs::read_to_string(path).expect("Failed to read demo file");

    assert_eq!(
        output(&source),
        vec![
            "hello 55",
            "5",
            "[0, 1, 4, 16] 4",
            "[\"ada\", \"alan\", \"grace\"]",
            "count is 3",
            "rect with area 12",
            "3.5 3 1 5.0",
        ]
    );
}

#[test]
fn test_canonical_rendering() {
    let cases = [
        ("-a * b", "((-a) * b)"),
        ("a + b * c", "(a + (b * c))"),
        ("a[i] + f(x, y)", "((a[i]) + f(x, y))"),
        ("!(a || b)", "(!(a || b))"),
    ];
    for (source, expected) in cases {
        match parser::parse(source) {
            Ok(program) => assert_eq!(program.to_string(), expected, "source: {}", source),
            Err(errors) => panic!("parse errors for {}: {:?}", source, errors),
        }
    }
}

#[test]
fn test_parse_errors_are_collected_in_order() {
    let errors = match parser::parse("let = 1;\nlet y = ;\nlet ok = 2;") {
        Ok(program) => panic!("Expected parse errors, got {}", program),
        Err(errors) => errors,
    };
    assert!(errors.len() >= 2, "errors: {:?}", errors);
    assert_eq!(errors[0].location().line, 1);
    assert_eq!(errors[1].location().line, 2);
    assert!(matches!(errors[0], ParseError::UnexpectedToken { .. }));
}

#[test]
fn test_let_and_const() {
    let (result, _) = run_source("let a = 1; a = a + 1; a;");
    assert_eq!(result.map(|v| v.to_string()), Ok("2".to_string()));

    let (result, _) = run_source("const c = 1; c = 2;");
    assert!(matches!(result, Err(RuntimeError::ConstantAssignment { .. })));
}

#[test]
fn test_recursive_fib() {
    let (result, _) = run_source(
        "fn fib(n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); } fib(10);",
    );
    assert_eq!(result.map(|v| v.to_string()), Ok("55".to_string()));
}

#[test]
fn test_redeclaration_is_an_error() {
    let (result, lines) = run_source("let x = 1; print(x); let x = 2; print(x);");
    match result {
        Err(RuntimeError::Redeclaration { name, location }) => {
            assert_eq!(name, "x");
            assert_eq!(location.column, 22);
        }
        other => panic!("Expected redeclaration, got {:?}", other),
    }
    // Only the output before the failing statement
    assert_eq!(lines, vec!["1"]);
}

#[test]
fn test_higher_order_functions() {
    let source = "
        fn map(items, f) {
            let out = [];
            for (let i = 0; i < len(items); i += 1) { push(out, f(items[i])); }
            return out;
        }
        print(map([1, 2, 3], fn(x) { return x * 10; }));
    ";
    assert_eq!(output(source), vec!["[10, 20, 30]"]);
}

#[test]
fn test_arrays_are_shared_by_reference() {
    let source = "
        let a = [1];
        let b = a;
        push(b, 2);
        print(a, a == b, [1, 2] == [1, 2]);
    ";
    assert_eq!(output(source), vec!["[1, 2] true false"]);
}

#[test]
fn test_division_by_zero_halts() {
    let (result, lines) = run_source("print(1); print(1 / 0); print(2);");
    assert!(matches!(result, Err(RuntimeError::DivisionByZero { .. })));
    assert_eq!(lines, vec!["1"]);
}

#[test]
fn test_string_and_number_do_not_mix() {
    let (result, _) = run_source("\"a\" + 1;");
    match result {
        Err(err @ RuntimeError::TypeMismatch { .. }) => {
            assert!(err.to_string().contains("string and integer"), "{}", err);
        }
        other => panic!("Expected type mismatch, got {:?}", other),
    }
}

#[test]
fn test_elif_chain() {
    let source = "
        fn grade(n) {
            if (n >= 90) { return \"A\"; } elif (n >= 80) { return \"B\"; } else { return \"C\"; }
        }
        print(grade(95), grade(85), grade(10));
    ";
    assert_eq!(output(source), vec!["A B C"]);
}
