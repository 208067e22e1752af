//! Memory model for the interpreter
//!
//! This module provides the core runtime abstractions:
//! - [`value`]: Runtime value representation and its frozen snapshot form
//! - [`environment`]: Scope chain with `let`/`const` bindings
//!
//! # Ownership
//!
//! Scopes are shared through `Rc<RefCell<_>>`: a closure keeps its defining
//! scope alive after the call that created it returns. A recursive function
//! stored in the scope it captures forms a reference cycle; the evaluator
//! lives for a single pass, so those cycles are simply dropped with the
//! process rather than collected.

pub mod environment;
pub mod value;
