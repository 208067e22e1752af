//! Lexical scope chain
//!
//! This module provides the scopes the evaluator runs in:
//! - [`Environment`]: one scope's bindings plus a link to its enclosing scope
//! - [`Binding`]: a name, its current value and whether it was declared `const`
//! - [`Env`]: the shared handle closures and instances hold on to
//!
//! # Scoping Rules
//!
//! A name is declared at most once per scope. Lookup and assignment walk
//! outward until the name is found; assignment always lands in the scope that
//! declared the name and is rejected there if the binding is constant.
//!
//! Every scope carries a [`ScopeId`] handed out by the evaluator, so that two
//! bindings with the same name in different scopes stay distinguishable in a
//! recorded snapshot.

use super::value::Value;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Unique id of a scope within one evaluation pass
pub type ScopeId = u64;

/// Shared, mutable handle to a scope
pub type Env = Rc<RefCell<Environment>>;

/// A single named slot
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub value: Value,
    pub constant: bool,
}

/// Failure of a scope operation; the evaluator attaches the source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    AlreadyDeclared(String),
    Undefined(String),
    Constant(String),
}

/// Name → binding map with insertion order and an optional enclosing scope
#[derive(Debug)]
pub struct Environment {
    id: ScopeId,
    names: FxHashMap<String, usize>,
    bindings: Vec<Binding>,
    outer: Option<Env>,
}

impl Environment {
    pub fn new(id: ScopeId, outer: Option<Env>) -> Self {
        Environment {
            id,
            names: FxHashMap::default(),
            bindings: Vec::new(),
            outer,
        }
    }

    /// Create a scope already wrapped in its shared handle
    pub fn new_shared(id: ScopeId, outer: Option<Env>) -> Env {
        Rc::new(RefCell::new(Self::new(id, outer)))
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn outer(&self) -> Option<Env> {
        self.outer.clone()
    }

    /// Bindings declared directly in this scope, in declaration order
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Declare `name` in this scope
    pub fn define(&mut self, name: &str, value: Value, constant: bool) -> Result<(), ScopeError> {
        if self.names.contains_key(name) {
            return Err(ScopeError::AlreadyDeclared(name.to_string()));
        }
        self.names.insert(name.to_string(), self.bindings.len());
        self.bindings.push(Binding {
            name: name.to_string(),
            value,
            constant,
        });
        Ok(())
    }

    /// Declare `name`, replacing any binding of that name already in this scope
    pub fn redefine(&mut self, name: &str, value: Value, constant: bool) {
        match self.names.get(name) {
            Some(&index) => {
                self.bindings[index] = Binding {
                    name: name.to_string(),
                    value,
                    constant,
                }
            }
            None => {
                self.names.insert(name.to_string(), self.bindings.len());
                self.bindings.push(Binding {
                    name: name.to_string(),
                    value,
                    constant,
                });
            }
        }
    }

    /// Binding declared directly in this scope
    pub fn get_local(&self, name: &str) -> Option<&Binding> {
        self.names.get(name).map(|&index| &self.bindings[index])
    }

    /// Overwrite a binding in this scope only
    pub fn set_local(&mut self, name: &str, value: Value) -> Result<(), ScopeError> {
        let index = *self
            .names
            .get(name)
            .ok_or_else(|| ScopeError::Undefined(name.to_string()))?;
        let binding = &mut self.bindings[index];
        if binding.constant {
            return Err(ScopeError::Constant(name.to_string()));
        }
        binding.value = value;
        Ok(())
    }

    /// Look `name` up along the chain
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(binding) = self.get_local(name) {
            return Some(binding.value.clone());
        }
        let mut scope = self.outer.clone();
        while let Some(env) = scope {
            let env = env.borrow();
            if let Some(binding) = env.get_local(name) {
                return Some(binding.value.clone());
            }
            scope = env.outer.clone();
        }
        None
    }

    /// Assign to the scope that declared `name`
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), ScopeError> {
        if self.contains_local(name) {
            return self.set_local(name, value);
        }
        let mut scope = self.outer.clone();
        while let Some(env) = scope {
            let mut env = env.borrow_mut();
            if env.contains_local(name) {
                return env.set_local(name, value);
            }
            scope = env.outer.clone();
        }
        Err(ScopeError::Undefined(name.to_string()))
    }
}

/// Every binding visible from `env`, outermost scope first
///
/// A name shadowed by an inner scope appears only once, with the inner value.
pub fn visible_bindings(env: &Env) -> Vec<(ScopeId, Binding)> {
    let mut chain = Vec::new();
    let mut scope = Some(env.clone());
    while let Some(current) = scope {
        scope = current.borrow().outer();
        chain.push(current);
    }

    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    let mut visible: Vec<(ScopeId, Binding)> = Vec::new();
    for scope in chain.iter().rev() {
        let scope = scope.borrow();
        for binding in scope.bindings() {
            match seen.get(&binding.name) {
                Some(&slot) => visible[slot] = (scope.id(), binding.clone()),
                None => {
                    seen.insert(binding.name.clone(), visible.len());
                    visible.push((scope.id(), binding.clone()));
                }
            }
        }
    }
    visible
}
