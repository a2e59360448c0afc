//! Release records: the per-component `.release` file and its lifecycle.
//!
//! A [ReleaseRecord] is only ever built through validation: the release must
//! be a strict `major.minor.patch`, the pre-tag command must reference
//! `@@RELEASE@@`, and every watched directory must exist inside the same
//! working tree as the component. The component directory itself (`.`) is
//! always watched.

pub mod file;
pub mod lifecycle;

pub use file::RecordFile;
pub use lifecycle::{BumpOutcome, NewRecord, ReleaseContext};

use crate::domain::{PreTagCommand, Tag, VersionNumber};
use crate::error::{ReleaseTagError, Result};
use crate::git::VersionControl;
use crate::ui::Reporter;
use crate::warning::ReleaseWarning;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};

/// Name of the record file inside a component directory
pub const RECORD_FILE_NAME: &str = ".release";

/// Validated release state of one component directory
#[derive(Debug, Clone)]
pub struct ReleaseRecord {
    directory: PathBuf,
    absolute: PathBuf,
    version: VersionNumber,
    base_tag: String,
    pre_tag_command: Option<PreTagCommand>,
    watched: Vec<String>,
    watched_paths: Vec<PathBuf>,
}

impl ReleaseRecord {
    /// Build a record for `directory`, validating its watched directories.
    ///
    /// `watched` holds paths relative to `directory`; an empty list means the
    /// directory alone. Entries are normalized to relative form and `.` is
    /// appended when missing.
    pub fn new(
        directory: &Path,
        version: VersionNumber,
        base_tag: impl Into<String>,
        pre_tag_command: Option<PreTagCommand>,
        watched: &[String],
        vcs: &dyn VersionControl,
    ) -> Result<Self> {
        if !directory.is_dir() {
            return Err(ReleaseTagError::NotADirectory(directory.to_path_buf()));
        }
        let absolute = directory.canonicalize()?;
        let (watched, watched_paths) = resolve_watched(&absolute, watched, vcs)?;

        Ok(ReleaseRecord {
            directory: directory.to_path_buf(),
            absolute,
            version,
            base_tag: base_tag.into(),
            pre_tag_command,
            watched,
            watched_paths,
        })
    }

    /// Whether `directory` carries a record file
    pub fn exists_in(directory: &Path) -> bool {
        directory.join(RECORD_FILE_NAME).is_file()
    }

    /// Read and validate the record stored in `directory`.
    ///
    /// A tag whose version differs from the release field is accepted with a
    /// warning; the release field wins.
    pub fn load(directory: &Path, vcs: &dyn VersionControl, reporter: &Reporter) -> Result<Self> {
        if !directory.is_dir() {
            return Err(ReleaseTagError::NotADirectory(directory.to_path_buf()));
        }

        let path = directory.join(RECORD_FILE_NAME);
        if !path.is_file() {
            return Err(ReleaseTagError::MissingConfiguration(directory.to_path_buf()));
        }

        let content = fs::read_to_string(&path)?;
        let file = RecordFile::parse(&content, &path)?;

        let version = VersionNumber::parse(&file.release).map_err(in_file(&path))?;
        let tag = Tag::decompose(&file.tag, Some(&version)).map_err(in_file(&path))?;
        if tag.version != version {
            reporter.warn(&ReleaseWarning::TagMismatch {
                record: path.clone(),
                tag: file.tag.clone(),
                release: file.release.clone(),
            });
        }

        let pre_tag_command = match &file.pre_tag_command {
            Some(template) => PreTagCommand::parse(template).map_err(in_file(&path))?,
            None => None,
        };
        let watched = file.tag_on_changes_in.unwrap_or_default();

        reporter.debug(format!("loaded {} at release {}", path.display(), version));
        Self::new(directory, version, tag.base, pre_tag_command, &watched, vcs)
    }

    /// Write the record file, unless running dry
    pub fn save(&self, dry_run: bool, reporter: &Reporter) -> Result<()> {
        let path = self.record_path();
        if dry_run {
            reporter.debug(format!("would write {}", path.display()));
            return Ok(());
        }
        fs::write(&path, self.to_file().render())?;
        reporter.debug(format!("wrote {}", path.display()));
        Ok(())
    }

    pub fn to_file(&self) -> RecordFile {
        RecordFile {
            release: self.version.to_string(),
            tag: self.tag_name(),
            pre_tag_command: self
                .pre_tag_command
                .as_ref()
                .map(|c| c.template().to_string()),
            tag_on_changes_in: Some(self.watched.clone()),
        }
    }

    /// Directory as it was given
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Canonical directory
    pub fn absolute_directory(&self) -> &Path {
        &self.absolute
    }

    pub fn record_path(&self) -> PathBuf {
        self.absolute.join(RECORD_FILE_NAME)
    }

    pub fn version(&self) -> &VersionNumber {
        &self.version
    }

    pub fn base_tag(&self) -> &str {
        &self.base_tag
    }

    pub fn tag(&self) -> Tag {
        Tag::new(self.base_tag.clone(), self.version)
    }

    pub fn tag_name(&self) -> String {
        self.tag().name()
    }

    pub fn pre_tag_command(&self) -> Option<&PreTagCommand> {
        self.pre_tag_command.as_ref()
    }

    /// Watched directories relative to the component, always including `.`
    pub fn watched_directories(&self) -> &[String] {
        &self.watched
    }

    /// Watched directories as canonical paths, in watch-list order
    pub fn watched_paths(&self) -> &[PathBuf] {
        &self.watched_paths
    }
}

impl PartialEq for ReleaseRecord {
    fn eq(&self, other: &Self) -> bool {
        self.absolute == other.absolute
    }
}

impl Eq for ReleaseRecord {}

impl Hash for ReleaseRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.absolute.hash(state);
    }
}

/// Prefix format errors with the record file they come from
fn in_file(path: &Path) -> impl Fn(ReleaseTagError) -> ReleaseTagError + '_ {
    move |err| match err {
        ReleaseTagError::Format(msg) => {
            ReleaseTagError::format(format!("{}: {}", path.display(), msg))
        }
        other => other,
    }
}

fn resolve_watched(
    absolute: &Path,
    watched: &[String],
    vcs: &dyn VersionControl,
) -> Result<(Vec<String>, Vec<PathBuf>)> {
    let root = vcs.top_level(absolute)?;
    let mut relative = Vec::new();
    let mut paths = Vec::new();

    for entry in watched {
        let target = absolute.join(entry);
        if !target.is_dir() {
            return Err(ReleaseTagError::format(format!(
                "{} of {} is not a directory",
                entry,
                absolute.display()
            )));
        }

        let canonical = target.canonicalize()?;
        if vcs.top_level(&canonical)? != root {
            return Err(ReleaseTagError::format(format!(
                "{} is not in the same git repository as {}",
                entry,
                absolute.display()
            )));
        }

        let rel = relative_path(absolute, &canonical);
        let rel = rel.to_string_lossy().into_owned();
        if !relative.contains(&rel) {
            relative.push(rel);
            paths.push(canonical);
        }
    }

    if !relative.iter().any(|r| r == ".") {
        relative.push(".".to_string());
        paths.push(absolute.to_path_buf());
    }

    Ok((relative, paths))
}

/// Path of `to` relative to `from`; both must be canonical
pub(crate) fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut rel = PathBuf::new();
    for _ in common..from.len() {
        rel.push("..");
    }
    for component in &to[common..] {
        rel.push(component.as_os_str());
    }

    if rel.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        rel
    }
}
