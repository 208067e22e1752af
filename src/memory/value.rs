//! Runtime value representation
//!
//! This module defines the [`Value`] enum, which represents all possible runtime values
//! in the interpreter, and [`SnapshotValue`], the frozen copy stored in recorded steps.
//!
//! # Value Types
//!
//! - [`Value::Integer`] / [`Value::Float`]: 64-bit numbers, promoted to float when mixed
//! - [`Value::Str`], [`Value::Boolean`], [`Value::Null`]
//! - [`Value::Array`] / [`Value::Hash`]: shared containers, mutated in place
//! - [`Value::Function`]: a closure over its defining scope
//! - [`Value::Builtin`]: a host function such as `print` or `len`
//! - [`Value::Class`] / [`Value::Instance`]: single-inheritance objects
//!
//! # Sharing
//!
//! Containers, closures, classes and instances are reference counted. Copying a
//! [`Value`] aliases them, which is what `a = b; b[0] = 1` needs. A recorded step
//! must not alias anything live, so [`Value::freeze`] deep-copies into a
//! [`SnapshotValue`] that is `Send + Sync` and never changes afterwards.

use super::environment::Env;
use crate::interpreter::builtins::Builtin;
use crate::parser::ast::{ClassDecl, FunctionDecl};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Runtime values in the interpreter
#[derive(Debug, Clone, Default)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Str(Rc<str>),
    Boolean(bool),
    #[default]
    Null,
    Array(Rc<RefCell<Vec<Value>>>),
    Hash(Rc<RefCell<HashTable>>),
    Function(Rc<Closure>),
    Builtin(Builtin),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
}

/// Key of a hash literal; only primitive values can be keys
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    Str(String),
    Boolean(bool),
    Null,
}

impl HashKey {
    pub fn to_value(&self) -> Value {
        match self {
            HashKey::Integer(n) => Value::Integer(*n),
            HashKey::Str(s) => Value::string(s),
            HashKey::Boolean(b) => Value::Boolean(*b),
            HashKey::Null => Value::Null,
        }
    }
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashKey::Integer(n) => write!(f, "{}", n),
            HashKey::Str(s) => write!(f, "{:?}", s),
            HashKey::Boolean(b) => write!(f, "{}", b),
            HashKey::Null => write!(f, "null"),
        }
    }
}

/// Hash contents: lookup by key, iteration in insertion order
#[derive(Debug, Clone, Default)]
pub struct HashTable {
    entries: Vec<(HashKey, Value)>,
    index: FxHashMap<HashKey, usize>,
}

impl HashTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &HashKey) -> Option<&Value> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    /// Insert or overwrite; an existing key keeps its position
    pub fn insert(&mut self, key: HashKey, value: Value) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &HashKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HashKey, &Value)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }
}

/// A function value: declaration plus the scope it closes over
#[derive(Debug)]
pub struct Closure {
    pub decl: Rc<FunctionDecl>,
    pub env: Env,
}

impl Closure {
    pub fn name(&self) -> &str {
        self.decl.name.as_deref().unwrap_or("<anonymous>")
    }
}

/// A class value created by evaluating a class declaration
#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub parent: Option<Rc<Class>>,
    pub decl: Rc<ClassDecl>,
    /// Scope the declaration was evaluated in; field initializers and methods close over it
    pub env: Env,
}

impl Class {
    /// Find a method on this class or the nearest ancestor defining it
    pub fn find_method(self: &Rc<Self>, name: &str) -> Option<(Rc<FunctionDecl>, Rc<Class>)> {
        let mut class = Some(self.clone());
        while let Some(current) = class {
            if let Some(method) = current
                .decl
                .methods
                .iter()
                .find(|m| m.name.as_deref() == Some(name))
            {
                return Some((method.clone(), current));
            }
            class = current.parent.clone();
        }
        None
    }

    /// The inheritance chain, root class first
    pub fn lineage(self: &Rc<Self>) -> Vec<Rc<Class>> {
        let mut chain = Vec::new();
        let mut class = Some(self.clone());
        while let Some(current) = class {
            class = current.parent.clone();
            chain.push(current);
        }
        chain.reverse();
        chain
    }
}

/// An object: its class plus a scope holding its fields
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    pub fields: Env,
}

impl Value {
    pub fn string(text: &str) -> Value {
        Value::Str(Rc::from(text))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn hash(table: HashTable) -> Value {
        Value::Hash(Rc::new(RefCell::new(table)))
    }

    /// Name of the value's type as reported by `type()` and in errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Hash(_) => "hash",
            Value::Function(_) | Value::Builtin(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }

    /// `false`, `null`, zero, and empty strings/arrays/hashes are falsy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Null => false,
            Value::Integer(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Array(items) => !items.borrow().is_empty(),
            Value::Hash(table) => !table.borrow().is_empty(),
            _ => true,
        }
    }

    /// Key form of a primitive value
    pub fn as_hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(n) => Some(HashKey::Integer(*n)),
            Value::Str(s) => Some(HashKey::Str(s.to_string())),
            Value::Boolean(b) => Some(HashKey::Boolean(*b)),
            Value::Null => Some(HashKey::Null),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// `==` semantics
    ///
    /// Numbers compare numerically across integer/float. Primitives compare by
    /// value, everything else by identity. Values of unrelated types are unequal.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                self.as_float() == other.as_float()
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Deep, cycle-safe copy for recording
    pub fn freeze(&self) -> SnapshotValue {
        freeze_value(self, &mut Vec::new())
    }

    /// Quoted form used for values nested in containers
    pub fn repr(&self) -> String {
        self.freeze().repr()
    }
}

fn freeze_value(value: &Value, path: &mut Vec<*const ()>) -> SnapshotValue {
    match value {
        Value::Integer(n) => SnapshotValue::Integer(*n),
        Value::Float(x) => SnapshotValue::Float(*x),
        Value::Str(s) => SnapshotValue::Str(s.to_string()),
        Value::Boolean(b) => SnapshotValue::Boolean(*b),
        Value::Null => SnapshotValue::Null,
        Value::Array(items) => {
            let ptr = Rc::as_ptr(items) as *const ();
            if path.contains(&ptr) {
                return SnapshotValue::Cycle;
            }
            path.push(ptr);
            let frozen = items
                .borrow()
                .iter()
                .map(|item| freeze_value(item, path))
                .collect();
            path.pop();
            SnapshotValue::Array(frozen)
        }
        Value::Hash(table) => {
            let ptr = Rc::as_ptr(table) as *const ();
            if path.contains(&ptr) {
                return SnapshotValue::Cycle;
            }
            path.push(ptr);
            let frozen = table
                .borrow()
                .iter()
                .map(|(key, value)| (key.to_string(), freeze_value(value, path)))
                .collect();
            path.pop();
            SnapshotValue::Hash(frozen)
        }
        Value::Function(closure) => SnapshotValue::Function {
            name: closure.decl.name.clone(),
            params: closure.decl.params.clone(),
        },
        Value::Builtin(builtin) => SnapshotValue::Builtin(builtin.name()),
        Value::Class(class) => SnapshotValue::Class(class.name.clone()),
        Value::Instance(instance) => {
            let ptr = Rc::as_ptr(instance) as *const ();
            if path.contains(&ptr) {
                return SnapshotValue::Cycle;
            }
            path.push(ptr);
            let fields = instance
                .fields
                .borrow()
                .bindings()
                .iter()
                .map(|binding| (binding.name.clone(), freeze_value(&binding.value, path)))
                .collect();
            path.pop();
            SnapshotValue::Instance {
                class: instance.class.name.clone(),
                fields,
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            _ => write!(f, "{}", self.freeze()),
        }
    }
}

/// Render a float so it always reads as a float (`2.0`, not `2`)
pub fn format_float(x: f64) -> String {
    format!("{:?}", x)
}

/// Frozen copy of a [`Value`] as it was at one recorded step
///
/// Containers are copied deeply. A container reached again while it is still
/// being copied becomes [`SnapshotValue::Cycle`].
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotValue {
    Integer(i64),
    Float(f64),
    Str(String),
    Boolean(bool),
    Null,
    Array(Vec<SnapshotValue>),
    Hash(Vec<(String, SnapshotValue)>),
    Function {
        name: Option<String>,
        params: Vec<String>,
    },
    Builtin(&'static str),
    Class(String),
    Instance {
        class: String,
        fields: Vec<(String, SnapshotValue)>,
    },
    Cycle,
}

impl SnapshotValue {
    /// Quoted form: strings get quotes, everything else prints as usual
    pub fn repr(&self) -> String {
        match self {
            SnapshotValue::Str(s) => format!("{:?}", s),
            other => other.to_string(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SnapshotValue::Integer(_) => "integer",
            SnapshotValue::Float(_) => "float",
            SnapshotValue::Str(_) => "string",
            SnapshotValue::Boolean(_) => "boolean",
            SnapshotValue::Null => "null",
            SnapshotValue::Array(_) | SnapshotValue::Cycle => "array",
            SnapshotValue::Hash(_) => "hash",
            SnapshotValue::Function { .. } | SnapshotValue::Builtin(_) => "function",
            SnapshotValue::Class(_) => "class",
            SnapshotValue::Instance { .. } => "instance",
        }
    }
}

impl fmt::Display for SnapshotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotValue::Integer(n) => write!(f, "{}", n),
            SnapshotValue::Float(x) => write!(f, "{}", format_float(*x)),
            SnapshotValue::Str(s) => write!(f, "{}", s),
            SnapshotValue::Boolean(b) => write!(f, "{}", b),
            SnapshotValue::Null => write!(f, "null"),
            SnapshotValue::Array(items) => {
                let items: Vec<String> = items.iter().map(|item| item.repr()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            SnapshotValue::Hash(pairs) => {
                let pairs: Vec<String> = pairs
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value.repr()))
                    .collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            SnapshotValue::Function { name, params } => {
                write!(f, "fn {}({})", name.as_deref().unwrap_or(""), params.join(", "))
            }
            SnapshotValue::Builtin(name) => write!(f, "builtin {}", name),
            SnapshotValue::Class(name) => write!(f, "class {}", name),
            SnapshotValue::Instance { class, fields } => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(name, value)| format!("{}: {}", name, value.repr()))
                    .collect();
                write!(f, "{} {{{}}}", class, fields.join(", "))
            }
            SnapshotValue::Cycle => write!(f, "[...]"),
        }
    }
}
