//! Built-in function implementations
//!
//! Builtins are resolved after the scope chain, so a user binding of the same
//! name shadows them.
//!
//! # Supported Built-ins
//!
//! - `print`, `info`, `error`, `success`: write their arguments, joined by a
//!   space, to the console at the matching level; return `null`
//! - `len(x)`: characters of a string, items of an array, entries of a hash
//! - `push(array, value)`: append in place, return the new length
//! - `pop(array)`: remove and return the last item, `null` when empty
//! - `keys(hash)`: array of keys in insertion order
//! - `type(x)`: type name as a string
//! - `str(x)`, `int(x)`, `float(x)`: conversions
//! - `range(stop)`, `range(start, stop)`, `range(start, stop, step)`: array of
//!   integers, capped at the loop iteration ceiling

use crate::interpreter::engine::Evaluator;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::SourceLocation;
use crate::snapshot::ConsoleLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Print,
    Info,
    Error,
    Success,
    Len,
    Push,
    Pop,
    Keys,
    Type,
    Str,
    Int,
    Float,
    Range,
}

impl Builtin {
    pub const ALL: [Builtin; 13] = [
        Builtin::Print,
        Builtin::Info,
        Builtin::Error,
        Builtin::Success,
        Builtin::Len,
        Builtin::Push,
        Builtin::Pop,
        Builtin::Keys,
        Builtin::Type,
        Builtin::Str,
        Builtin::Int,
        Builtin::Float,
        Builtin::Range,
    ];

    pub fn lookup(name: &str) -> Option<Builtin> {
        Builtin::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Info => "info",
            Builtin::Error => "error",
            Builtin::Success => "success",
            Builtin::Len => "len",
            Builtin::Push => "push",
            Builtin::Pop => "pop",
            Builtin::Keys => "keys",
            Builtin::Type => "type",
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Range => "range",
        }
    }

    fn console_level(self) -> Option<ConsoleLevel> {
        match self {
            Builtin::Print => Some(ConsoleLevel::Print),
            Builtin::Info => Some(ConsoleLevel::Info),
            Builtin::Error => Some(ConsoleLevel::Error),
            Builtin::Success => Some(ConsoleLevel::Success),
            _ => None,
        }
    }
}

fn expect_args(builtin: Builtin, args: &[Value], expected: usize, location: SourceLocation) -> Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(RuntimeError::ArityMismatch {
            function: builtin.name().to_string(),
            expected,
            got: args.len(),
            location,
        });
    }
    Ok(())
}

fn wrong_type(builtin: Builtin, value: &Value, location: SourceLocation) -> RuntimeError {
    RuntimeError::type_mismatch(
        format!("{}() does not accept {}", builtin.name(), value.type_name()),
        location,
    )
}

fn invalid(builtin: Builtin, message: String, location: SourceLocation) -> RuntimeError {
    RuntimeError::InvalidArgument {
        function: builtin.name(),
        message,
        location,
    }
}

impl Evaluator<'_> {
    pub(crate) fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if let Some(level) = builtin.console_level() {
            let text = args.iter().map(Value::to_string).collect::<Vec<_>>().join(" ");
            self.console().emit(level, &text);
            return Ok(Value::Null);
        }

        match builtin {
            Builtin::Range => return self.builtin_range(&args, location),
            _ => expect_args(builtin, &args, if builtin == Builtin::Push { 2 } else { 1 }, location)?,
        }
        let value = &args[0];

        match builtin {
            Builtin::Len => {
                let len = match value {
                    Value::Str(text) => text.chars().count(),
                    Value::Array(items) => items.borrow().len(),
                    Value::Hash(table) => table.borrow().len(),
                    other => return Err(wrong_type(builtin, other, location)),
                };
                Ok(Value::Integer(len as i64))
            }
            Builtin::Push => match value {
                Value::Array(items) => {
                    let mut items = items.borrow_mut();
                    items.push(args[1].clone());
                    Ok(Value::Integer(items.len() as i64))
                }
                other => Err(wrong_type(builtin, other, location)),
            },
            Builtin::Pop => match value {
                Value::Array(items) => Ok(items.borrow_mut().pop().unwrap_or(Value::Null)),
                other => Err(wrong_type(builtin, other, location)),
            },
            Builtin::Keys => match value {
                Value::Hash(table) => Ok(Value::array(
                    table.borrow().keys().map(|key| key.to_value()).collect(),
                )),
                other => Err(wrong_type(builtin, other, location)),
            },
            Builtin::Type => Ok(Value::string(value.type_name())),
            Builtin::Str => Ok(Value::string(&value.to_string())),
            Builtin::Int => to_int(value, location),
            Builtin::Float => match value {
                Value::Integer(n) => Ok(Value::Float(*n as f64)),
                Value::Float(x) => Ok(Value::Float(*x)),
                Value::Str(text) => text
                    .trim()
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| invalid(builtin, format!("cannot parse {:?} as a float", text), location)),
                other => Err(wrong_type(builtin, other, location)),
            },
            // Handled above
            _ => Ok(Value::Null),
        }
    }

    fn builtin_range(&self, args: &[Value], location: SourceLocation) -> Result<Value, RuntimeError> {
        let mut bounds = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Value::Integer(n) => bounds.push(*n),
                other => return Err(wrong_type(Builtin::Range, other, location)),
            }
        }
        let (start, stop, step) = match *bounds.as_slice() {
            [stop] => (0, stop, 1),
            [start, stop] => (start, stop, 1),
            [start, stop, step] => (start, stop, step),
            _ => {
                return Err(RuntimeError::ArityMismatch {
                    function: Builtin::Range.name().to_string(),
                    expected: if args.is_empty() { 1 } else { 3 },
                    got: args.len(),
                    location,
                })
            }
        };
        if step == 0 {
            return Err(invalid(Builtin::Range, "step must not be zero".to_string(), location));
        }

        let span = if step > 0 {
            (stop as i128 - start as i128).max(0)
        } else {
            (start as i128 - stop as i128).max(0)
        };
        let stride = (step as i128).abs();
        let count = (span + stride - 1) / stride;
        let limit = self.limits.max_loop_iterations;
        if count > limit as i128 {
            return Err(invalid(
                Builtin::Range,
                format!("{} items exceeds the limit of {}", count, limit),
                location,
            ));
        }

        // `i * step` may leave i64 even when every item fits
        let items = (0..count)
            .map(|i| {
                i64::try_from(start as i128 + i * step as i128)
                    .map(Value::Integer)
                    .map_err(|_| RuntimeError::IntegerOverflow {
                        operation: format!("range({}, {}, {})", start, stop, step),
                        location,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::array(items))
    }
}

fn to_int(value: &Value, location: SourceLocation) -> Result<Value, RuntimeError> {
    match value {
        Value::Integer(n) => Ok(Value::Integer(*n)),
        Value::Float(x) => {
            let truncated = x.trunc();
            if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                Ok(Value::Integer(truncated as i64))
            } else {
                Err(invalid(Builtin::Int, format!("{} is out of integer range", x), location))
            }
        }
        Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
        Value::Str(text) => text
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| invalid(Builtin::Int, format!("cannot parse {:?} as an integer", text), location)),
        other => Err(wrong_type(Builtin::Int, other, location)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::limits::Limits;
    use crate::interpreter::run;
    use crate::snapshot::ConsoleLog;
    use pretty_assertions::assert_eq;

    fn eval(source: &str) -> Result<String, RuntimeError> {
        let program = match crate::parser::parse(source) {
            Ok(program) => program,
            Err(errors) => panic!("parse errors: {:?}", errors),
        };
        let mut console = ConsoleLog::new();
        run(&program, &mut console, &Limits::default()).map(|v| v.to_string())
    }

    fn ok(source: &str) -> String {
        match eval(source) {
            Ok(text) => text,
            Err(err) => panic!("runtime error: {}", err),
        }
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(Builtin::lookup("print"), Some(Builtin::Print));
        assert_eq!(Builtin::lookup("range"), Some(Builtin::Range));
        assert_eq!(Builtin::lookup("println"), None);
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::lookup(builtin.name()), Some(builtin));
        }
    }

    #[test]
    fn test_console_levels() {
        let program = match crate::parser::parse("print(1, \"a\"); error(\"bad\"); success();") {
            Ok(program) => program,
            Err(errors) => panic!("parse errors: {:?}", errors),
        };
        let mut console = ConsoleLog::new();
        let result = run(&program, &mut console, &Limits::default());
        assert!(result.is_ok());
        let levels: Vec<ConsoleLevel> = console.lines().iter().map(|line| line.level).collect();
        assert_eq!(
            levels,
            vec![ConsoleLevel::Print, ConsoleLevel::Error, ConsoleLevel::Success]
        );
        assert_eq!(console.texts(), vec!["1 a", "bad", ""]);
    }

    #[test]
    fn test_len() {
        assert_eq!(ok("len(\"héllo\");"), "5");
        assert_eq!(ok("len([1, 2, 3]);"), "3");
        assert_eq!(ok("len({\"a\": 1});"), "1");
        assert!(matches!(eval("len(5);"), Err(RuntimeError::TypeMismatch { .. })));
        assert!(matches!(
            eval("len();"),
            Err(RuntimeError::ArityMismatch { expected: 1, got: 0, .. })
        ));
    }

    #[test]
    fn test_push_and_pop() {
        assert_eq!(ok("let a = [1]; push(a, 2);"), "2");
        assert_eq!(ok("let a = [1, 2]; let last = pop(a); [last, a];"), "[2, [1]]");
        assert_eq!(ok("pop([]);"), "null");
    }

    #[test]
    fn test_keys_and_type() {
        assert_eq!(ok("keys({\"b\": 1, 2: 2, true: 3});"), "[\"b\", 2, true]");
        assert_eq!(ok("type(1.5);"), "float");
        assert_eq!(ok("type(fn() {});"), "function");
        assert_eq!(ok("type(len);"), "function");
    }

    #[test]
    fn test_conversions() {
        assert_eq!(ok("str(1.0) + str([1]);"), "1.0[1]");
        assert_eq!(ok("int(\" 42 \") + int(3.9) + int(-2.5) + int(true);"), "44");
        assert_eq!(ok("float(2);"), "2.0");
        assert_eq!(ok("float(\"0.25\");"), "0.25");
        assert!(matches!(
            eval("int(\"abc\");"),
            Err(RuntimeError::InvalidArgument { function: "int", .. })
        ));
    }

    #[test]
    fn test_range() {
        assert_eq!(ok("range(4);"), "[0, 1, 2, 3]");
        assert_eq!(ok("range(2, 5);"), "[2, 3, 4]");
        assert_eq!(ok("range(10, 0, -3);"), "[10, 7, 4, 1]");
        assert_eq!(ok("range(3, 1);"), "[]");
        assert!(matches!(
            eval("range(0, 5, 0);"),
            Err(RuntimeError::InvalidArgument { function: "range", .. })
        ));
        assert!(matches!(
            eval("range(100000000);"),
            Err(RuntimeError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_range_with_extreme_step() {
        let source = "
            let lo = -9223372036854775807 - 1;
            range(lo, 9223372036854775807, 9223372036854775807);
        ";
        assert_eq!(
            ok(source),
            "[-9223372036854775808, -1, 9223372036854775806]"
        );
        assert_eq!(
            ok("range(9223372036854775807, -9223372036854775807, -9223372036854775807);"),
            "[9223372036854775807, 0]"
        );
    }

    #[test]
    fn test_user_binding_shadows_builtin() {
        assert_eq!(ok("fn len(x) { return 99; } len([1]);"), "99");
    }
}
