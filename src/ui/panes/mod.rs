//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: source code with the current node's span highlighted
//! - [`bindings`]: the current step and every visible binding, changes marked
//! - [`console`]: program output up to the current step
//! - [`status`]: status bar with keybindings and position
//!
//! Each pane module exports one `render_*` function that draws from borrowed
//! trace data and keeps no state of its own beyond the scroll offsets passed in.

pub mod bindings;
pub mod console;
pub mod source;
pub mod status;

pub use bindings::render_bindings_pane;
pub use console::render_console_pane;
pub use source::{render_source_pane, SourceScrollState};
pub use status::{render_status_bar, StatusRenderData};
