//! Step recording and playback
//!
//! - [`recorder`]: runs a program once and records every node visit as a
//!   [`StepRecord`], producing an immutable [`Trace`]
//! - [`navigator`]: a cursor over a finished trace
//! - this module: the console sink builtins such as `print` write to
//!
//! Output is injected through the [`Console`] trait rather than written to a
//! global, so independent passes (parallel tests, a background prepare while
//! the UI shows another trace) never see each other's lines.

pub mod navigator;
pub mod recorder;

pub use navigator::{ExecutionState, Navigator};
pub use recorder::{
    prepare, BindingSnapshot, Outcome, Phase, PrepareError, StepRecord, StepRecorder, Trace,
};

use std::fmt;

/// Severity of a console line, one per print-family builtin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleLevel {
    Print,
    Info,
    Error,
    Success,
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConsoleLevel::Print => "print",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Error => "error",
            ConsoleLevel::Success => "success",
        };
        write!(f, "{}", label)
    }
}

/// Sink for program output
pub trait Console {
    fn emit(&mut self, level: ConsoleLevel, text: &str);
}

/// A line of console output tagged with the step at which it appeared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub level: ConsoleLevel,
    pub text: String,
    pub seq: usize,
}

/// In-memory console that remembers every line
#[derive(Debug, Clone, Default)]
pub struct ConsoleLog {
    lines: Vec<ConsoleLine>,
    seq: usize,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number attached to lines emitted from now on
    pub fn set_seq(&mut self, seq: usize) {
        self.seq = seq;
    }

    pub fn lines(&self) -> &[ConsoleLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Plain text of every line, for assertions and headless output
    pub fn texts(&self) -> Vec<String> {
        self.lines.iter().map(|line| line.text.clone()).collect()
    }

    pub fn into_lines(self) -> Vec<ConsoleLine> {
        self.lines
    }
}

impl Console for ConsoleLog {
    fn emit(&mut self, level: ConsoleLevel, text: &str) {
        self.lines.push(ConsoleLine {
            level,
            text: text.to_string(),
            seq: self.seq,
        });
    }
}

/// Writes straight to the process's stdout, errors to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn emit(&mut self, level: ConsoleLevel, text: &str) {
        match level {
            ConsoleLevel::Error => eprintln!("{}", text),
            _ => println!("{}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_log_tags_lines_with_seq() {
        let mut log = ConsoleLog::new();
        log.emit(ConsoleLevel::Print, "first");
        log.set_seq(4);
        log.emit(ConsoleLevel::Error, "second");

        assert_eq!(log.len(), 2);
        assert_eq!(log.lines()[0].seq, 0);
        assert_eq!(log.lines()[1].seq, 4);
        assert_eq!(log.lines()[1].level, ConsoleLevel::Error);
        assert_eq!(log.texts(), vec!["first", "second"]);
    }
}
