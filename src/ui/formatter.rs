//! Pure formatting functions for UI output.
//!
//! Nothing here writes anywhere; the [Reporter](super::Reporter) decides where
//! a formatted line goes. Styling goes through `console`, which drops colors
//! when the stream is not a terminal.

use super::Level;
use console::style;
use std::path::Path;

/// Format a diagnostic line for the given level.
pub fn diagnostic(level: Level, message: &str) -> String {
    match level {
        Level::Error => format!("{} {}", style("ERROR:").red().bold(), message),
        Level::Warning => format!("{} {}", style("⚠ WARNING:").yellow(), message),
        Level::Info => format!("{} {}", style("→").yellow(), message),
        Level::Debug => format!("{}", style(message).dim()),
        Level::Output => message.to_string(),
    }
}

/// Format one line of `show` output for a component.
///
/// `directory<TAB>version`, followed by `<TAB>tag` when a tag is given.
pub fn component_line(directory: &Path, version: &str, tag: Option<&str>) -> String {
    match tag {
        Some(tag) => format!("{}\t{}\t{}", directory.display(), version, tag),
        None => format!("{}\t{}", directory.display(), version),
    }
}
