pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod graph;
pub mod hooks;
pub mod orchestrator;
pub mod record;
pub mod ui;
pub mod warning;

pub use error::{ReleaseTagError, Result};
