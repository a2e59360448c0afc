use std::fmt;
use std::path::PathBuf;

/// Non-fatal conditions met while processing release records.
/// These are reported to the user but never abort the run.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseWarning {
    /// The version embedded in a record's tag differs from its release field
    TagMismatch {
        record: PathBuf,
        tag: String,
        release: String,
    },
    /// The component does not live inside a git workspace
    NotInWorkspace { record: PathBuf },
    /// Nothing changed under the watched directories since the last tag
    NoChanges { directory: PathBuf, release: String },
    /// Nothing to commit before tagging
    NothingToCommit { directory: PathBuf },
}

impl fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWarning::TagMismatch {
                record,
                tag,
                release,
            } => write!(
                f,
                "tag {} in {} does not match specified release {}",
                tag,
                record.display(),
                release
            ),
            ReleaseWarning::NotInWorkspace { record } => {
                write!(f, "{} is not inside a git workspace", record.display())
            }
            ReleaseWarning::NoChanges { directory, release } => write!(
                f,
                "{} has no changes since {}",
                directory.display(),
                release
            ),
            ReleaseWarning::NothingToCommit { directory } => {
                write!(f, "no changes to commit in {}", directory.display())
            }
        }
    }
}
