//! Multi-component operations: discovery, validation, initialize, show and bump.

use crate::domain::{PreTagCommand, ReleaseLevel, VersionNumber};
use crate::error::{ReleaseTagError, Result};
use crate::graph;
use crate::record::{BumpOutcome, NewRecord, ReleaseContext, ReleaseRecord, RECORD_FILE_NAME};
use crate::ui::component_line;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Problems found by [ReleaseOrchestrator::validate]
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub issues: Vec<ReleaseTagError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Input of [ReleaseOrchestrator::initialize]
#[derive(Debug, Clone)]
pub struct InitializeRequest {
    pub directories: Vec<PathBuf>,
    pub version: VersionNumber,
    /// Only allowed with a single directory
    pub tag_prefix: Option<String>,
    /// Appended to the directory name when no prefix is given
    pub tag_separator: String,
    pub pre_tag_command: Option<PreTagCommand>,
    pub watched_directories: Vec<String>,
}

pub struct ReleaseOrchestrator<'a> {
    ctx: ReleaseContext<'a>,
}

impl<'a> ReleaseOrchestrator<'a> {
    pub fn new(ctx: ReleaseContext<'a>) -> Self {
        ReleaseOrchestrator { ctx }
    }

    /// Load the records under `roots` in processing order.
    ///
    /// Without `recursive` every root must hold a record. With it, each tree
    /// is walked bottom-up and every directory holding a record is taken.
    /// No roots means the current directory.
    pub fn discover(&self, roots: &[PathBuf], recursive: bool) -> Result<Vec<ReleaseRecord>> {
        let default_root = [PathBuf::from(".")];
        let roots = if roots.is_empty() { &default_root[..] } else { roots };

        let mut records = Vec::new();
        for root in roots {
            if !recursive {
                records.push(ReleaseRecord::load(root, self.ctx.vcs, self.ctx.reporter)?);
                continue;
            }

            if !root.is_dir() {
                return Err(ReleaseTagError::NotADirectory(root.clone()));
            }
            let walker = WalkDir::new(root)
                .contents_first(true)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.file_name() != ".git");
            for entry in walker {
                let entry = entry?;
                if entry.file_type().is_file() && entry.file_name() == RECORD_FILE_NAME {
                    if let Some(dir) = entry.path().parent() {
                        records.push(ReleaseRecord::load(dir, self.ctx.vcs, self.ctx.reporter)?);
                    }
                }
            }
        }

        self.ctx
            .reporter
            .debug(format!("found {} release record(s)", records.len()));
        graph::order_records(records)
    }

    /// Check base tag uniqueness, workspace membership and tag existence.
    /// Every problem is reported; none stops the check.
    pub fn validate(&self, records: &[ReleaseRecord]) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();
        let mut base_tags: HashMap<&str, &ReleaseRecord> = HashMap::new();

        for record in records {
            match base_tags.get(record.base_tag()) {
                Some(existing) => report.issues.push(ReleaseTagError::DuplicateBaseTag {
                    base_tag: record.base_tag().to_string(),
                    path: record.record_path(),
                    existing: existing.record_path(),
                }),
                None => {
                    base_tags.insert(record.base_tag(), record);
                }
            }

            let dir = record.absolute_directory();
            if !self.ctx.vcs.is_inside_work_tree(dir) {
                report
                    .issues
                    .push(ReleaseTagError::NotInWorkspace(record.directory().to_path_buf()));
            } else if !self.ctx.vcs.list_tags(dir)?.contains(&record.tag_name()) {
                report.issues.push(ReleaseTagError::MissingTag {
                    tag: record.tag_name(),
                    path: record.record_path(),
                });
            }
        }

        for issue in &report.issues {
            self.ctx.reporter.report(issue);
        }
        Ok(report)
    }

    /// Initialize every requested directory, deepest first.
    ///
    /// A directory that already has a record, or whose tag already exists, is
    /// reported and skipped; the answer is then `false`. Conflicting prefixes
    /// fail before anything is written.
    pub fn initialize(&self, request: InitializeRequest) -> Result<bool> {
        let mut directories = Vec::with_capacity(request.directories.len());
        for dir in &request.directories {
            if !dir.is_dir() {
                return Err(ReleaseTagError::NotADirectory(dir.clone()));
            }
            let canonical = dir.canonicalize()?;
            if !directories.contains(&canonical) {
                directories.push(canonical);
            }
        }
        directories.sort_by_key(|d| std::cmp::Reverse(d.components().count()));

        if request.tag_prefix.is_some() && directories.len() > 1 {
            return Err(ReleaseTagError::DuplicateBaseTag {
                base_tag: request.tag_prefix.clone().unwrap_or_default(),
                path: directories[1].clone(),
                existing: directories[0].clone(),
            });
        }

        let mut seen: HashMap<String, &PathBuf> = HashMap::new();
        for dir in &directories {
            let base_tag = default_base_tag(dir, &request.tag_separator);
            if let Some(existing) = seen.get(&base_tag) {
                return Err(ReleaseTagError::DuplicateBaseTag {
                    base_tag,
                    path: dir.clone(),
                    existing: (*existing).clone(),
                });
            }
            seen.insert(base_tag, dir);
        }

        let mut ok = true;
        for dir in directories {
            let base_tag = match &request.tag_prefix {
                Some(prefix) => prefix.clone(),
                None => default_base_tag(&dir, &request.tag_separator),
            };
            let new = NewRecord {
                directory: dir,
                version: request.version,
                base_tag,
                pre_tag_command: request.pre_tag_command.clone(),
                watched_directories: request.watched_directories.clone(),
            };

            match ReleaseRecord::initialize(&self.ctx, new) {
                Ok(record) => self.ctx.reporter.info(format!(
                    "initialized {} at release {}",
                    record.directory().display(),
                    record.version()
                )),
                Err(e @ ReleaseTagError::AlreadyInitialized(_))
                | Err(e @ ReleaseTagError::DuplicateTag(_)) => {
                    self.ctx.reporter.report(&e);
                    ok = false;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(ok)
    }

    /// Print the effective version of each record.
    ///
    /// With `tabular` every line carries the directory, and the tag when
    /// `with_tags` is set.
    pub fn show(&self, records: &[ReleaseRecord], tabular: bool, with_tags: bool) -> Result<()> {
        for record in records {
            let version = record.current_version(&self.ctx)?;
            if tabular {
                let tag = with_tags.then(|| record.tag_name());
                self.ctx.reporter.output(component_line(
                    record.directory(),
                    &version,
                    tag.as_deref(),
                ));
            } else {
                self.ctx.reporter.output(version);
            }
        }
        Ok(())
    }

    /// Validate, then bump every record in order. Answers `false` without
    /// touching anything when validation fails.
    pub fn bump(
        &self,
        records: &mut [ReleaseRecord],
        level: ReleaseLevel,
        message: Option<&str>,
        force: bool,
    ) -> Result<bool> {
        if !self.validate(records)?.is_valid() {
            return Ok(false);
        }

        for record in records.iter_mut() {
            let outcome = record.tag_next_release(&self.ctx, level, message, force)?;
            if let BumpOutcome::Tagged(tag) = outcome {
                self.ctx.reporter.debug(format!(
                    "{} is now at {}",
                    record.directory().display(),
                    tag
                ));
            }
        }
        Ok(true)
    }
}

fn default_base_tag(directory: &Path, separator: &str) -> String {
    let name = directory
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}{}", name, separator)
}
