//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the version-control
//! tool, allowing for multiple implementations including a real Git
//! repository and an in-memory mock for testing.
//!
//! # Overview
//!
//! The primary abstraction is the [VersionControl] trait. The concrete
//! implementations include:
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [dry_run::DryRun]: A wrapper that suppresses every mutating call
//! - [mock::MockRepository]: An in-memory implementation for testing
//!
//! Every call names the directory it runs against, so components living in
//! different repositories can be processed in one invocation. Path sets are
//! absolute directories; implementations translate them to pathspecs.

pub mod dry_run;
pub mod mock;
pub mod repository;

pub use dry_run::DryRun;
pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Version-control operations consumed by the release lifecycle
///
/// Query operations always run. Mutating operations (`init`, `stage`,
/// `commit`, `create_tag`) are the only calls that change the repository and
/// are the ones [DryRun] suppresses.
pub trait VersionControl {
    /// Whether `dir` lies inside a git working tree
    fn is_inside_work_tree(&self, dir: &Path) -> bool;

    /// Root of the working tree containing `dir`, `None` outside a workspace
    fn top_level(&self, dir: &Path) -> Result<Option<PathBuf>>;

    /// Path of `dir` relative to the working tree root, `""` for the root itself
    fn prefix(&self, dir: &Path) -> Result<String>;

    /// All tag names of the repository containing `dir`
    fn list_tags(&self, dir: &Path) -> Result<Vec<String>>;

    /// Abbreviated hash of the latest commit touching any of `paths`, empty when none
    fn short_revision(&self, dir: &Path, paths: &[PathBuf]) -> Result<String>;

    /// Uncommitted changes (including untracked files) under `paths`, one entry per file
    fn status(&self, dir: &Path, paths: &[PathBuf]) -> Result<Vec<String>>;

    /// Summary of the differences between `reference` and the working tree under
    /// `paths`, empty when there are none
    fn diff_summary(&self, dir: &Path, reference: &str, paths: &[PathBuf]) -> Result<String>;

    /// Create a new repository in `dir`
    fn init(&self, dir: &Path) -> Result<()>;

    /// Stage every change under `paths`
    fn stage(&self, dir: &Path, paths: &[PathBuf]) -> Result<()>;

    /// Commit the staged changes
    fn commit(&self, dir: &Path, message: &str) -> Result<()>;

    /// Create a lightweight tag on the current HEAD commit
    fn create_tag(&self, dir: &Path, name: &str) -> Result<()>;
}
