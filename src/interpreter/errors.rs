//! Runtime error types for the interpreter
//!
//! This module defines [`RuntimeError`], which represents all errors that can occur
//! during program execution (as opposed to parse errors).
//!
//! All runtime errors are fatal: the first one halts the pass, is recorded on the
//! innermost node being evaluated, and becomes the trace's outcome.

use crate::parser::ast::SourceLocation;
use thiserror::Error;

/// Runtime errors that can occur during execution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Operator or builtin applied to values of the wrong type
    #[error("Type error: {message} at line {}, column {}", .location.line, .location.column)]
    TypeMismatch {
        message: String,
        location: SourceLocation,
    },

    #[error("Unknown identifier '{name}' at line {}, column {}", .location.line, .location.column)]
    UnknownIdentifier {
        name: String,
        location: SourceLocation,
    },

    /// Second `let`/`const`/`fn`/`class` of one name in the same scope
    #[error("'{name}' is already declared in this scope at line {}, column {}", .location.line, .location.column)]
    Redeclaration {
        name: String,
        location: SourceLocation,
    },

    #[error("Cannot assign to constant '{name}' at line {}, column {}", .location.line, .location.column)]
    ConstantAssignment {
        name: String,
        location: SourceLocation,
    },

    #[error("Index {index} out of bounds for length {len} at line {}, column {}", .location.line, .location.column)]
    IndexOutOfBounds {
        index: i64,
        len: usize,
        location: SourceLocation,
    },

    #[error("Unusable as hash key: {type_name} at line {}, column {}", .location.line, .location.column)]
    UnhashableKey {
        type_name: &'static str,
        location: SourceLocation,
    },

    #[error("Unknown property '{name}' on {type_name} at line {}, column {}", .location.line, .location.column)]
    UnknownProperty {
        name: String,
        type_name: String,
        location: SourceLocation,
    },

    #[error("Value of type {type_name} is not callable at line {}, column {}", .location.line, .location.column)]
    NotCallable {
        type_name: &'static str,
        location: SourceLocation,
    },

    #[error(
        "Function '{function}' expects {expected} argument{}, got {got} at line {}, column {}",
        plural(.expected),
        .location.line,
        .location.column
    )]
    ArityMismatch {
        function: String,
        expected: usize,
        got: usize,
        location: SourceLocation,
    },

    #[error("Invalid argument to '{function}': {message} at line {}, column {}", .location.line, .location.column)]
    InvalidArgument {
        function: &'static str,
        message: String,
        location: SourceLocation,
    },

    #[error("Division by zero at line {}, column {}", .location.line, .location.column)]
    DivisionByZero { location: SourceLocation },

    #[error("Integer overflow in {operation} at line {}, column {}", .location.line, .location.column)]
    IntegerOverflow {
        operation: String,
        location: SourceLocation,
    },

    #[error("Loop exceeded {limit} iterations at line {}, column {}", .location.line, .location.column)]
    IterationLimit {
        limit: usize,
        location: SourceLocation,
    },

    #[error("Maximum call depth of {limit} exceeded at line {}, column {}", .location.line, .location.column)]
    CallDepthExceeded {
        limit: usize,
        location: SourceLocation,
    },

    #[error("Step limit of {limit} exceeded at line {}, column {}", .location.line, .location.column)]
    StepLimit {
        limit: usize,
        location: SourceLocation,
    },

    /// `break` or `continue` with no enclosing loop in the same function
    #[error("'{keyword}' outside of a loop at line {}, column {}", .location.line, .location.column)]
    JumpOutsideLoop {
        keyword: &'static str,
        location: SourceLocation,
    },

    /// `this` or `super` with no enclosing method
    #[error("'{keyword}' used outside of a method at line {}, column {}", .location.line, .location.column)]
    OutsideMethod {
        keyword: &'static str,
        location: SourceLocation,
    },

    #[error("Evaluation cancelled at line {}, column {}", .location.line, .location.column)]
    Cancelled { location: SourceLocation },
}

impl RuntimeError {
    pub fn location(&self) -> SourceLocation {
        match self {
            RuntimeError::TypeMismatch { location, .. }
            | RuntimeError::UnknownIdentifier { location, .. }
            | RuntimeError::Redeclaration { location, .. }
            | RuntimeError::ConstantAssignment { location, .. }
            | RuntimeError::IndexOutOfBounds { location, .. }
            | RuntimeError::UnhashableKey { location, .. }
            | RuntimeError::UnknownProperty { location, .. }
            | RuntimeError::NotCallable { location, .. }
            | RuntimeError::ArityMismatch { location, .. }
            | RuntimeError::InvalidArgument { location, .. }
            | RuntimeError::DivisionByZero { location }
            | RuntimeError::IntegerOverflow { location, .. }
            | RuntimeError::IterationLimit { location, .. }
            | RuntimeError::CallDepthExceeded { location, .. }
            | RuntimeError::StepLimit { location, .. }
            | RuntimeError::JumpOutsideLoop { location, .. }
            | RuntimeError::OutsideMethod { location, .. }
            | RuntimeError::Cancelled { location } => *location,
        }
    }

    pub(crate) fn type_mismatch(message: impl Into<String>, location: SourceLocation) -> Self {
        RuntimeError::TypeMismatch {
            message: message.into(),
            location,
        }
    }
}

fn plural(count: &usize) -> &'static str {
    if *count == 1 {
        ""
    } else {
        "s"
    }
}
