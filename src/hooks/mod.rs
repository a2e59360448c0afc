//! Pre-tag hook execution
//!
//! A component may declare a shell command that runs in its directory right
//! before the release is committed and tagged, e.g. to write the new version
//! into a manifest so that it becomes part of the release commit.

pub mod executor;

pub use executor::{HookExecutor, HookOutput};
