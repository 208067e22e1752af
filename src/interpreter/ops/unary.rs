use crate::interpreter::engine::Evaluator;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::{PrefixOp, SourceLocation};

impl Evaluator<'_> {
    pub(crate) fn apply_prefix(
        &self,
        op: PrefixOp,
        operand: Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match op {
            PrefixOp::Not => Ok(Value::Boolean(!operand.is_truthy())),
            PrefixOp::Neg => match operand {
                Value::Integer(n) => n.checked_neg().map(Value::Integer).ok_or_else(|| {
                    RuntimeError::IntegerOverflow {
                        operation: format!("-({})", n),
                        location,
                    }
                }),
                Value::Float(x) => Ok(Value::Float(-x)),
                other => Err(RuntimeError::type_mismatch(
                    format!("cannot negate {}", other.type_name()),
                    location,
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::engine::Untraced;
    use crate::interpreter::limits::Limits;
    use crate::snapshot::ConsoleLog;

    fn with_evaluator<T>(f: impl FnOnce(&Evaluator<'_>) -> T) -> T {
        let mut console = ConsoleLog::new();
        let mut tracer = Untraced::new(&mut console);
        let evaluator = Evaluator::new(&mut tracer, Limits::default());
        f(&evaluator)
    }

    #[test]
    fn test_negation() {
        with_evaluator(|ev| {
            let loc = SourceLocation::new(1, 1);
            assert!(matches!(
                ev.apply_prefix(PrefixOp::Neg, Value::Integer(4), loc),
                Ok(Value::Integer(-4))
            ));
            assert!(matches!(
                ev.apply_prefix(PrefixOp::Neg, Value::Float(1.5), loc),
                Ok(Value::Float(x)) if x == -1.5
            ));
            assert!(matches!(
                ev.apply_prefix(PrefixOp::Neg, Value::Integer(i64::MIN), loc),
                Err(RuntimeError::IntegerOverflow { .. })
            ));
            assert!(matches!(
                ev.apply_prefix(PrefixOp::Neg, Value::string("a"), loc),
                Err(RuntimeError::TypeMismatch { .. })
            ));
        });
    }

    #[test]
    fn test_not_uses_truthiness() {
        with_evaluator(|ev| {
            let loc = SourceLocation::new(1, 1);
            assert!(matches!(
                ev.apply_prefix(PrefixOp::Not, Value::Integer(0), loc),
                Ok(Value::Boolean(true))
            ));
            assert!(matches!(
                ev.apply_prefix(PrefixOp::Not, Value::string("x"), loc),
                Ok(Value::Boolean(false))
            ));
        });
    }
}
