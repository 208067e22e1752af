//! Binary operators
//!
//! - Integer op integer stays integer (checked; overflow is an error), except
//!   `/` which always yields a float
//! - Any float operand promotes the other side to float
//! - `//` truncates toward zero, `%` works on both integers and floats
//! - `+` also concatenates two strings; no other operator accepts strings
//!   except the comparisons
//! - `==` / `!=` never fail: unrelated types are simply unequal

use crate::interpreter::engine::Evaluator;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::{InfixOp, SourceLocation};
use std::cmp::Ordering;

impl Evaluator<'_> {
    pub(crate) fn apply_infix(
        &self,
        op: InfixOp,
        left: Value,
        right: Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match op {
            InfixOp::Eq => Ok(Value::Boolean(left.equals(&right))),
            InfixOp::Ne => Ok(Value::Boolean(!left.equals(&right))),
            InfixOp::Lt | InfixOp::Le | InfixOp::Gt | InfixOp::Ge => {
                let ordering = compare_values(op, &left, &right, location)?;
                Ok(Value::Boolean(match op {
                    InfixOp::Lt => ordering == Ordering::Less,
                    InfixOp::Le => ordering != Ordering::Greater,
                    InfixOp::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                }))
            }
            InfixOp::Add => match (&left, &right) {
                (Value::Str(a), Value::Str(b)) => {
                    let mut joined = String::with_capacity(a.len() + b.len());
                    joined.push_str(a);
                    joined.push_str(b);
                    Ok(Value::string(&joined))
                }
                _ => arithmetic(op, &left, &right, location),
            },
            _ => arithmetic(op, &left, &right, location),
        }
    }
}

fn unsupported(op: InfixOp, left: &Value, right: &Value, location: SourceLocation) -> RuntimeError {
    RuntimeError::type_mismatch(
        format!(
            "unsupported operand types for {}: {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ),
        location,
    )
}

#[inline]
fn arithmetic(op: InfixOp, left: &Value, right: &Value, location: SourceLocation) -> Result<Value, RuntimeError> {
    if let (Value::Integer(a), Value::Integer(b)) = (left, right) {
        return integer_arithmetic(op, *a, *b, location);
    }
    match (left.as_float(), right.as_float()) {
        (Some(a), Some(b)) => float_arithmetic(op, a, b, location),
        _ => Err(unsupported(op, left, right, location)),
    }
}

fn integer_arithmetic(op: InfixOp, a: i64, b: i64, location: SourceLocation) -> Result<Value, RuntimeError> {
    let overflow = || RuntimeError::IntegerOverflow {
        operation: format!("{} {} {}", a, op.symbol(), b),
        location,
    };
    let result = match op {
        InfixOp::Add => a.checked_add(b),
        InfixOp::Sub => a.checked_sub(b),
        InfixOp::Mul => a.checked_mul(b),
        InfixOp::Div => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero { location });
            }
            return Ok(Value::Float(a as f64 / b as f64));
        }
        InfixOp::FloorDiv => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero { location });
            }
            a.checked_div(b)
        }
        InfixOp::Mod => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero { location });
            }
            a.checked_rem(b)
        }
        _ => return Err(unsupported(op, &Value::Integer(a), &Value::Integer(b), location)),
    };
    result.map(Value::Integer).ok_or_else(overflow)
}

fn float_arithmetic(op: InfixOp, a: f64, b: f64, location: SourceLocation) -> Result<Value, RuntimeError> {
    if matches!(op, InfixOp::Div | InfixOp::FloorDiv | InfixOp::Mod) && b == 0.0 {
        return Err(RuntimeError::DivisionByZero { location });
    }
    let result = match op {
        InfixOp::Add => a + b,
        InfixOp::Sub => a - b,
        InfixOp::Mul => a * b,
        InfixOp::Div => a / b,
        InfixOp::FloorDiv => (a / b).trunc(),
        InfixOp::Mod => a % b,
        _ => return Err(unsupported(op, &Value::Float(a), &Value::Float(b), location)),
    };
    Ok(Value::Float(result))
}

/// Order two numbers or two strings
fn compare_values(
    op: InfixOp,
    left: &Value,
    right: &Value,
    location: SourceLocation,
) -> Result<Ordering, RuntimeError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => a
                .partial_cmp(&b)
                .ok_or_else(|| RuntimeError::type_mismatch("cannot order NaN", location)),
            _ => Err(unsupported(op, left, right, location)),
        },
    }
}
