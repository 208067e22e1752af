//! Assignment and compound assignment
//!
//! The target is resolved to a [`Place`] first (its object and index
//! expressions are evaluated once), then the right-hand side, then the store.
//! The assignment expression yields the stored value.

use crate::interpreter::engine::{scope_error, Evaluator};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::access::{checked_index, hash_key};
use crate::memory::environment::Env;
use crate::memory::value::{HashKey, Value};
use crate::parser::ast::{AstNode, InfixOp, NodeKind, SourceLocation};

/// Resolved assignment target
enum Place {
    Name(String),
    Index(Value, Value),
    Property(Value, String),
}

impl Evaluator<'_> {
    fn resolve_place(&mut self, target: &AstNode, env: &Env, location: SourceLocation) -> Result<Place, RuntimeError> {
        match &target.kind {
            NodeKind::Identifier(name) => Ok(Place::Name(name.clone())),
            NodeKind::Index { target, index } => {
                let object = self.eval_expr(target, env)?;
                let index = self.eval_expr(index, env)?;
                Ok(Place::Index(object, index))
            }
            NodeKind::Property { object, name } => {
                let object = self.eval_expr(object, env)?;
                Ok(Place::Property(object, name.clone()))
            }
            _ => Err(RuntimeError::type_mismatch("invalid assignment target", location)),
        }
    }

    fn read_place(&mut self, place: &Place, env: &Env, location: SourceLocation) -> Result<Value, RuntimeError> {
        match place {
            Place::Name(name) => self.lookup(env, name, location),
            Place::Index(object, index) => self.index_value(object, index, location),
            Place::Property(object, name) => self.get_property(object, name, location),
        }
    }

    fn write_place(&mut self, place: Place, value: Value, env: &Env, location: SourceLocation) -> Result<(), RuntimeError> {
        match place {
            Place::Name(name) => env
                .borrow_mut()
                .assign(&name, value)
                .map_err(|err| scope_error(err, location)),
            Place::Index(object, index) => store_index(&object, &index, value, location),
            Place::Property(object, name) => store_property(&object, &name, value, location),
        }
    }

    pub(crate) fn eval_assign(
        &mut self,
        target: &AstNode,
        value: &AstNode,
        env: &Env,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let place = self.resolve_place(target, env, location)?;
        let value = self.eval_expr(value, env)?;
        self.write_place(place, value.clone(), env, location)?;
        Ok(value)
    }

    /// `target op= value`, reading the target once before the right-hand side
    pub(crate) fn eval_compound_assign(
        &mut self,
        op: InfixOp,
        target: &AstNode,
        value: &AstNode,
        env: &Env,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let place = self.resolve_place(target, env, location)?;
        let current = self.read_place(&place, env, location)?;
        let rhs = self.eval_expr(value, env)?;
        let value = self.apply_infix(op, current, rhs, location)?;
        self.write_place(place, value.clone(), env, location)?;
        Ok(value)
    }
}

fn store_index(object: &Value, index: &Value, value: Value, location: SourceLocation) -> Result<(), RuntimeError> {
    match object {
        Value::Array(items) => {
            let n = match index {
                Value::Integer(n) => *n,
                other => {
                    return Err(RuntimeError::type_mismatch(
                        format!("array index must be an integer, got {}", other.type_name()),
                        location,
                    ))
                }
            };
            let mut items = items.borrow_mut();
            let i = checked_index(n, items.len(), location)?;
            items[i] = value;
            Ok(())
        }
        Value::Hash(table) => {
            let key = hash_key(index, location)?;
            table.borrow_mut().insert(key, value);
            Ok(())
        }
        other => Err(RuntimeError::type_mismatch(
            format!("cannot assign by index into {}", other.type_name()),
            location,
        )),
    }
}

/// Existing fields are overwritten (unless constant); unknown names become new fields
fn store_property(object: &Value, name: &str, value: Value, location: SourceLocation) -> Result<(), RuntimeError> {
    match object {
        Value::Instance(instance) => {
            let mut fields = instance.fields.borrow_mut();
            let result = if fields.contains_local(name) {
                fields.set_local(name, value)
            } else {
                fields.define(name, value, false)
            };
            result.map_err(|err| scope_error(err, location))
        }
        Value::Hash(table) => {
            table.borrow_mut().insert(HashKey::Str(name.to_string()), value);
            Ok(())
        }
        other => Err(RuntimeError::type_mismatch(
            format!("cannot set property '{}' on {}", name, other.type_name()),
            location,
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::errors::RuntimeError;
    use crate::interpreter::limits::Limits;
    use crate::interpreter::run;
    use crate::snapshot::ConsoleLog;

    fn eval(source: &str) -> Result<String, RuntimeError> {
        let program = match crate::parser::parse(source) {
            Ok(program) => program,
            Err(errors) => panic!("parse errors: {:?}", errors),
        };
        let mut console = ConsoleLog::new();
        run(&program, &mut console, &Limits::default()).map(|v| v.to_string())
    }

    #[test]
    fn test_assignment_yields_value() {
        assert_eq!(eval("let a = 1; let b = (a = 5); b;").unwrap(), "5");
        assert_eq!(eval("let a = 1; a += 2; a *= 3; a;").unwrap(), "9");
    }

    #[test]
    fn test_assign_to_outer_scope() {
        assert_eq!(eval("let a = 1; { a = 2; } a;").unwrap(), "2");
    }

    #[test]
    fn test_assign_undeclared_fails() {
        assert!(matches!(
            eval("ghost = 1;"),
            Err(RuntimeError::UnknownIdentifier { .. })
        ));
    }

    #[test]
    fn test_index_assignment_mutates_in_place() {
        assert_eq!(
            eval("let a = [1, 2, 3]; let b = a; b[0] = 9; a[2] += 1; a;").unwrap(),
            "[9, 2, 4]"
        );
        assert!(matches!(
            eval("let a = []; a[0] = 1;"),
            Err(RuntimeError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_hash_assignment_creates_keys() {
        assert_eq!(
            eval("let h = {}; h[\"a\"] = 1; h.b = 2; h[\"a\"] += 10; h;").unwrap(),
            "{\"a\": 11, \"b\": 2}"
        );
    }

    #[test]
    fn test_compound_string_concat() {
        assert_eq!(eval("let s = \"ab\"; s += \"c\"; s;").unwrap(), "abc");
    }

    #[test]
    fn test_string_is_immutable() {
        assert!(matches!(
            eval("let s = \"ab\"; s[0] = \"x\";"),
            Err(RuntimeError::TypeMismatch { .. })
        ));
    }
}
