//! # Introduction
//!
//! Stepwise parses and evaluates programs in a small dynamically typed
//! teaching language, recording every node visit of a single evaluation
//! pass. The recorded trace is then navigated forward and backward, in a
//! terminal UI built with [ratatui](https://docs.rs/ratatui) or from code.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Evaluator + StepRecorder → Trace → Navigator / TUI
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds an AST, collecting every
//!    parse error with its position.
//! 2. [`interpreter`]: walks the AST once, reporting each visit to a
//!    [`interpreter::Tracer`].
//! 3. [`memory`]: runtime values and the chain of lexical scopes.
//! 4. [`snapshot`]: the step recorder, the immutable [`snapshot::Trace`] it
//!    produces, and the [`snapshot::Navigator`] cursor over it.
//! 5. [`ui`]: ratatui-based TUI; not part of the stable library API.
//!
//! ## Quick start
//!
//! ```no_run
//! use stepwise::interpreter::Limits;
//! use stepwise::snapshot::{prepare, Navigator};
//!
//! let trace = prepare("let a = 1; print(a + 1);", &Limits::default())?;
//! let mut nav = Navigator::new(trace);
//! while !nav.is_complete() {
//!     let state = nav.advance();
//!     println!("{} {:?}", state.record.node.kind, state.record.phase);
//! }
//! # Ok::<(), stepwise::snapshot::PrepareError>(())
//! ```
//!
//! ## Language
//!
//! Values: integers, floats, strings, booleans, `null`, arrays, hashes,
//! functions, classes and instances. Statements: `let`, `const`, `fn`,
//! `class … extends …`, `if/elif/else`, `while`, `for`, `break`, `continue`,
//! `return`. Built-ins: `print`, `info`, `error`, `success`, `len`, `push`,
//! `pop`, `keys`, `type`, `str`, `int`, `float`, `range`.

pub mod interpreter;
pub mod memory;
pub mod parser;
pub mod snapshot;
mod stack;
pub mod ui;
