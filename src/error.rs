use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for git-release-tag operations
#[derive(Error, Debug)]
pub enum ReleaseTagError {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Missing release configuration: {} has no release record", .0.display())]
    MissingConfiguration(PathBuf),

    #[error("Already initialized: {} already has a release record", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("Duplicate tag: tag {0} already exists")]
    DuplicateTag(String),

    #[error(
        "Duplicate base tag: {} has the same base tag as {}: '{}'",
        .path.display(),
        .existing.display(),
        .base_tag
    )]
    DuplicateBaseTag {
        base_tag: String,
        path: PathBuf,
        existing: PathBuf,
    },

    #[error("Not in workspace: {} is not inside a git workspace", .0.display())]
    NotInWorkspace(PathBuf),

    #[error("Missing tag: tag {} in {} does not exist in repository", .tag, .path.display())]
    MissingTag { tag: String, path: PathBuf },

    #[error("Cycle detected on {} from {}", .to.display(), .from.display())]
    CycleDetected { from: PathBuf, to: PathBuf },

    #[error("External command failed: {0}")]
    ExternalCommandFailed(String),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Convenience type alias for Results in git-release-tag
pub type Result<T> = std::result::Result<T, ReleaseTagError>;

impl ReleaseTagError {
    /// Create a format error with context
    pub fn format(msg: impl Into<String>) -> Self {
        ReleaseTagError::Format(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseTagError::Config(msg.into())
    }

    /// Create an external command error with context
    pub fn external(msg: impl Into<String>) -> Self {
        ReleaseTagError::ExternalCommandFailed(msg.into())
    }
}
