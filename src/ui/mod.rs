//! User interface module - reporting and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - The [Reporter] handed to every component that talks to the user

use std::cell::RefCell;

use crate::error::ReleaseTagError;
use crate::warning::ReleaseWarning;

pub mod formatter;

pub use formatter::component_line;

/// How much the reporter lets through
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

/// Kind of a reported line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    /// Command results printed on stdout
    Output,
}

/// Reporting collaborator passed explicitly to components.
///
/// Diagnostics go to stderr and results to stdout, unless the reporter was
/// created with [Reporter::capturing], in which case every line that passes
/// the verbosity filter is kept in memory instead.
#[derive(Debug, Default)]
pub struct Reporter {
    verbosity: Verbosity,
    captured: Option<RefCell<Vec<(Level, String)>>>,
}

impl Reporter {
    pub fn new(verbosity: Verbosity) -> Self {
        Reporter {
            verbosity,
            captured: None,
        }
    }

    /// Create a reporter that records lines instead of printing them
    pub fn capturing(verbosity: Verbosity) -> Self {
        Reporter {
            verbosity,
            captured: Some(RefCell::new(Vec::new())),
        }
    }

    fn enabled(&self, level: Level) -> bool {
        match level {
            Level::Debug => self.verbosity >= Verbosity::Verbose,
            Level::Info => self.verbosity >= Verbosity::Normal,
            Level::Warning | Level::Error | Level::Output => true,
        }
    }

    fn emit(&self, level: Level, message: String) {
        if !self.enabled(level) {
            return;
        }

        if let Some(captured) = &self.captured {
            captured.borrow_mut().push((level, message));
            return;
        }

        let line = formatter::diagnostic(level, &message);
        match level {
            Level::Output => println!("{}", line),
            _ => eprintln!("{}", line),
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.emit(Level::Debug, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(Level::Info, message.into());
    }

    pub fn warn(&self, warning: &ReleaseWarning) {
        self.emit(Level::Warning, warning.to_string());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(Level::Error, message.into());
    }

    pub fn report(&self, err: &ReleaseTagError) {
        self.error(err.to_string());
    }

    /// Print a result line on stdout
    pub fn output(&self, line: impl Into<String>) {
        self.emit(Level::Output, line.into());
    }

    /// Captured lines of the given level, empty when not capturing
    pub fn messages(&self, level: Level) -> Vec<String> {
        match &self.captured {
            Some(captured) => captured
                .borrow()
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, m)| m.clone())
                .collect(),
            None => Vec::new(),
        }
    }
}
