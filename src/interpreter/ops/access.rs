//! Index and property reads
//!
//! Arrays and strings take integer indices in `0..len`. Hashes take any
//! primitive key and yield `null` for keys they do not hold. Properties read
//! instance fields first, then methods along the class chain (bound to the
//! instance), then string keys of a hash.

use crate::interpreter::engine::Evaluator;
use crate::interpreter::errors::RuntimeError;
use crate::memory::environment::Env;
use crate::memory::value::{HashKey, Value};
use crate::parser::ast::{AstNode, NodeKind, SourceLocation};

/// Position `index` in a sequence of `len` items, if in range
pub(crate) fn checked_index(index: i64, len: usize, location: SourceLocation) -> Result<usize, RuntimeError> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or(RuntimeError::IndexOutOfBounds { index, len, location })
}

fn integer_index(index: &Value, target: &Value, location: SourceLocation) -> Result<i64, RuntimeError> {
    match index {
        Value::Integer(n) => Ok(*n),
        other => Err(RuntimeError::type_mismatch(
            format!("{} index must be an integer, got {}", target.type_name(), other.type_name()),
            location,
        )),
    }
}

pub(crate) fn hash_key(key: &Value, location: SourceLocation) -> Result<HashKey, RuntimeError> {
    key.as_hash_key().ok_or(RuntimeError::UnhashableKey {
        type_name: key.type_name(),
        location,
    })
}

impl Evaluator<'_> {
    pub(crate) fn index_value(&self, target: &Value, index: &Value, location: SourceLocation) -> Result<Value, RuntimeError> {
        match target {
            Value::Array(items) => {
                let items = items.borrow();
                let i = checked_index(integer_index(index, target, location)?, items.len(), location)?;
                Ok(items[i].clone())
            }
            Value::Str(text) => {
                let n = integer_index(index, target, location)?;
                let len = text.chars().count();
                let i = checked_index(n, len, location)?;
                let ch = text.chars().nth(i).map(String::from).unwrap_or_default();
                Ok(Value::string(&ch))
            }
            Value::Hash(table) => {
                let key = hash_key(index, location)?;
                Ok(table.borrow().get(&key).cloned().unwrap_or(Value::Null))
            }
            other => Err(RuntimeError::type_mismatch(
                format!("cannot index into {}", other.type_name()),
                location,
            )),
        }
    }

    /// `object.name`; `super.name` looks the method up on the parent class
    pub(crate) fn eval_property(
        &mut self,
        object: &AstNode,
        name: &str,
        env: &Env,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let value = self.eval_expr(object, env)?;
        if let (NodeKind::Super, Value::Class(parent)) = (&object.kind, &value) {
            let this = self.resolve_this(env, location)?;
            return match parent.find_method(name) {
                Some((method, owner)) => Ok(self.bind_method(this, &method, &owner)),
                None => Err(RuntimeError::UnknownProperty {
                    name: name.to_string(),
                    type_name: format!("class {}", parent.name),
                    location,
                }),
            };
        }
        self.get_property(&value, name, location)
    }

    pub(crate) fn get_property(&mut self, value: &Value, name: &str, location: SourceLocation) -> Result<Value, RuntimeError> {
        match value {
            Value::Instance(instance) => {
                if let Some(binding) = instance.fields.borrow().get_local(name) {
                    return Ok(binding.value.clone());
                }
                match instance.class.find_method(name) {
                    Some((method, owner)) => Ok(self.bind_method(value.clone(), &method, &owner)),
                    None => Err(RuntimeError::UnknownProperty {
                        name: name.to_string(),
                        type_name: instance.class.name.clone(),
                        location,
                    }),
                }
            }
            Value::Hash(table) => Ok(table
                .borrow()
                .get(&HashKey::Str(name.to_string()))
                .cloned()
                .unwrap_or(Value::Null)),
            other => Err(RuntimeError::UnknownProperty {
                name: name.to_string(),
                type_name: other.type_name().to_string(),
                location,
            }),
        }
    }
}
