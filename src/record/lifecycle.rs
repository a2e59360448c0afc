use crate::config::MessagesConfig;
use crate::domain::{PreTagCommand, ReleaseLevel, Tag, VersionNumber};
use crate::error::{ReleaseTagError, Result};
use crate::git::VersionControl;
use crate::hooks::HookExecutor;
use crate::record::ReleaseRecord;
use crate::ui::Reporter;
use crate::warning::ReleaseWarning;
use std::path::PathBuf;
use tracing::debug;

/// Collaborators shared by every lifecycle operation
pub struct ReleaseContext<'a> {
    pub vcs: &'a dyn VersionControl,
    pub reporter: &'a Reporter,
    pub messages: &'a MessagesConfig,
    /// Skip record writes and hook execution; pair with a [crate::git::DryRun] vcs
    pub dry_run: bool,
}

/// Input of [ReleaseRecord::initialize]
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub directory: PathBuf,
    pub version: VersionNumber,
    pub base_tag: String,
    pub pre_tag_command: Option<PreTagCommand>,
    pub watched_directories: Vec<String>,
}

/// Result of [ReleaseRecord::tag_next_release]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BumpOutcome {
    /// Nothing changed since the current tag
    Unchanged,
    Tagged(String),
}

impl ReleaseRecord {
    /// Create the record file for a new component.
    ///
    /// Inside a workspace the record is committed and tagged. Outside one it
    /// is only written, with a warning.
    ///
    /// # Errors
    /// * `AlreadyInitialized` when the directory already has a record
    /// * `DuplicateTag` when the initial tag already exists in the repository
    pub fn initialize(ctx: &ReleaseContext, new: NewRecord) -> Result<ReleaseRecord> {
        if !new.directory.is_dir() {
            return Err(ReleaseTagError::NotADirectory(new.directory));
        }
        if ReleaseRecord::exists_in(&new.directory) {
            return Err(ReleaseTagError::AlreadyInitialized(new.directory));
        }

        let record = ReleaseRecord::new(
            &new.directory,
            new.version,
            new.base_tag,
            new.pre_tag_command,
            &new.watched_directories,
            ctx.vcs,
        )?;

        let inside = ctx.vcs.is_inside_work_tree(record.absolute_directory());
        if inside {
            let tag = record.tag_name();
            if ctx.vcs.list_tags(record.absolute_directory())?.contains(&tag) {
                return Err(ReleaseTagError::DuplicateTag(tag));
            }
        }

        record.save(ctx.dry_run, ctx.reporter)?;

        if inside {
            let prefix = ctx.vcs.prefix(record.absolute_directory())?;
            let message = MessagesConfig::render(&ctx.messages.initialize, &prefix, record.version());
            record.commit_and_tag(ctx, &message)?;
        } else {
            ctx.reporter.warn(&ReleaseWarning::NotInWorkspace {
                record: record.record_path(),
            });
        }

        Ok(record)
    }

    /// Summary of changes under the watched directories since the current tag,
    /// empty when there are none
    pub fn changes_since_tag(&self, ctx: &ReleaseContext) -> Result<String> {
        ctx.vcs
            .diff_summary(self.absolute_directory(), &self.tag_name(), self.watched_paths())
    }

    /// Version string reflecting the working tree.
    ///
    /// * `X.Y.Z-<rev>-dirty` with uncommitted changes under watched directories
    /// * `X.Y.Z-<rev>` with committed changes since the tag
    /// * `X.Y.Z` otherwise
    ///
    /// `<rev>` is the short id of the latest commit touching a watched directory.
    pub fn current_version(&self, ctx: &ReleaseContext) -> Result<String> {
        let dir = self.absolute_directory();
        let paths = self.watched_paths();

        if !ctx.vcs.status(dir, paths)?.is_empty() {
            let revision = ctx.vcs.short_revision(dir, paths)?;
            return Ok(format!("{}-{}-dirty", self.version(), revision));
        }

        if !self.changes_since_tag(ctx)?.is_empty() {
            let revision = ctx.vcs.short_revision(dir, paths)?;
            return Ok(format!("{}-{}", self.version(), revision));
        }

        Ok(self.version().to_string())
    }

    /// Bump the release at `level`, then write, commit and tag it.
    ///
    /// Without `force` a component without changes since its tag is left
    /// untouched. The in-memory version only changes once the new tag is known
    /// to be free.
    pub fn tag_next_release(
        &mut self,
        ctx: &ReleaseContext,
        level: ReleaseLevel,
        message: Option<&str>,
        force: bool,
    ) -> Result<BumpOutcome> {
        if !force {
            let changes = self.changes_since_tag(ctx)?;
            if changes.is_empty() {
                ctx.reporter.info(
                    ReleaseWarning::NoChanges {
                        directory: self.directory().to_path_buf(),
                        release: self.version().to_string(),
                    }
                    .to_string(),
                );
                return Ok(BumpOutcome::Unchanged);
            }
            ctx.reporter.info(format!(
                "{}: {} since {}",
                self.directory().display(),
                changes,
                self.version()
            ));
        }

        let next = self.version().bump(level)?;
        let next_tag = Tag::new(self.base_tag(), next).name();
        if ctx.vcs.list_tags(self.absolute_directory())?.contains(&next_tag) {
            return Err(ReleaseTagError::DuplicateTag(next_tag));
        }

        self.version = next;
        self.save(ctx.dry_run, ctx.reporter)?;

        let message = match message {
            Some(m) => m.to_string(),
            None => {
                let prefix = ctx.vcs.prefix(self.absolute_directory())?;
                MessagesConfig::render(&ctx.messages.bump, &prefix, self.version())
            }
        };
        self.commit_and_tag(ctx, &message)?;

        Ok(BumpOutcome::Tagged(next_tag))
    }

    /// Run the pre-tag hook, commit pending changes under the watched
    /// directories and tag the current release
    fn commit_and_tag(&self, ctx: &ReleaseContext, message: &str) -> Result<()> {
        let dir = self.absolute_directory();
        let tag = self.tag();

        if let Some(command) = self.pre_tag_command() {
            if ctx.dry_run {
                ctx.reporter.info(format!("would run: {}", command.render(&tag)));
            } else {
                let output = HookExecutor::execute(command, &tag, dir)?;
                for stream in [&output.stdout, &output.stderr] {
                    if !stream.trim().is_empty() {
                        ctx.reporter.debug(stream.trim_end().to_string());
                    }
                }
            }
        }

        let changed = ctx.vcs.status(dir, self.watched_paths())?;
        if changed.is_empty() {
            ctx.reporter.debug(
                ReleaseWarning::NothingToCommit {
                    directory: self.directory().to_path_buf(),
                }
                .to_string(),
            );
        } else {
            debug!(files = ?changed, "staging changes");
            ctx.vcs.stage(dir, self.watched_paths())?;
            ctx.vcs.commit(dir, message)?;
        }

        ctx.vcs.create_tag(dir, &tag.name())?;
        ctx.reporter.info(format!(
            "tagged release {} of {} as {}",
            self.version(),
            self.directory().display(),
            tag
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{DryRun, MockRepository};
    use crate::record::RECORD_FILE_NAME;
    use crate::ui::{Level, Verbosity};
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        root: PathBuf,
        mock: MockRepository,
        reporter: Reporter,
        messages: MessagesConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let root = temp.path().canonicalize().unwrap();
            fs::create_dir_all(root.join("a")).unwrap();
            fs::create_dir_all(root.join("b")).unwrap();
            Fixture {
                mock: MockRepository::with_workspace(&root),
                _temp: temp,
                root,
                reporter: Reporter::capturing(Verbosity::Verbose),
                messages: MessagesConfig::default(),
            }
        }

        fn ctx(&self) -> ReleaseContext<'_> {
            ReleaseContext {
                vcs: &self.mock,
                reporter: &self.reporter,
                messages: &self.messages,
                dry_run: false,
            }
        }

        fn new_record(&self, dir: &str, base_tag: &str) -> NewRecord {
            NewRecord {
                directory: self.root.join(dir),
                version: VersionNumber::new(0, 0, 0),
                base_tag: base_tag.to_string(),
                pre_tag_command: None,
                watched_directories: Vec::new(),
            }
        }

        fn file(&self, rel: &str) -> PathBuf {
            self.root.join(rel)
        }
    }

    #[test]
    fn test_initialize_writes_record_and_tags() {
        let fx = Fixture::new();
        let record = ReleaseRecord::initialize(&fx.ctx(), fx.new_record("a", "a-")).unwrap();

        assert_eq!(record.tag_name(), "a-0.0.0");
        assert!(fx.root.join("a").join(RECORD_FILE_NAME).is_file());
        assert_eq!(fx.mock.tags(), vec!["a-0.0.0"]);
    }

    #[test]
    fn test_initialize_twice_fails() {
        let fx = Fixture::new();
        ReleaseRecord::initialize(&fx.ctx(), fx.new_record("a", "a-")).unwrap();

        let err = ReleaseRecord::initialize(&fx.ctx(), fx.new_record("a", "a-")).unwrap_err();
        assert!(matches!(err, ReleaseTagError::AlreadyInitialized(_)));
    }

    #[test]
    fn test_initialize_existing_tag_fails() {
        let fx = Fixture::new();
        fx.mock.add_tag("a-0.0.0");

        let err = ReleaseRecord::initialize(&fx.ctx(), fx.new_record("a", "a-")).unwrap_err();
        assert!(matches!(err, ReleaseTagError::DuplicateTag(_)));
        assert!(!ReleaseRecord::exists_in(&fx.root.join("a")));
    }

    #[test]
    fn test_initialize_outside_workspace_warns() {
        let temp = TempDir::new().unwrap();
        let mock = MockRepository::new();
        let reporter = Reporter::capturing(Verbosity::Normal);
        let messages = MessagesConfig::default();
        let ctx = ReleaseContext {
            vcs: &mock,
            reporter: &reporter,
            messages: &messages,
            dry_run: false,
        };

        let record = ReleaseRecord::initialize(
            &ctx,
            NewRecord {
                directory: temp.path().to_path_buf(),
                version: VersionNumber::new(1, 0, 0),
                base_tag: String::new(),
                pre_tag_command: None,
                watched_directories: Vec::new(),
            },
        )
        .unwrap();

        assert_eq!(record.tag_name(), "1.0.0");
        assert!(ReleaseRecord::exists_in(temp.path()));
        assert!(mock.tags().is_empty());
        assert_eq!(reporter.messages(Level::Warning).len(), 1);
    }

    #[test]
    fn test_current_version_states() {
        let fx = Fixture::new();
        let record = ReleaseRecord::initialize(&fx.ctx(), fx.new_record("a", "a-")).unwrap();
        fx.mock.add_commit("init", &[fx.file("a/.release")]);

        assert_eq!(record.current_version(&fx.ctx()).unwrap(), "0.0.0-a000000");

        fx.mock.add_dirty_file(fx.file("a/src.txt"));
        assert_eq!(
            record.current_version(&fx.ctx()).unwrap(),
            "0.0.0-a000000-dirty"
        );
    }

    #[test]
    fn test_current_version_clean() {
        let fx = Fixture::new();
        let record = ReleaseRecord::initialize(&fx.ctx(), fx.new_record("a", "a-")).unwrap();
        fx.mock.add_dirty_file(fx.file("b/other.txt"));

        assert_eq!(record.current_version(&fx.ctx()).unwrap(), "0.0.0");
    }

    #[test]
    fn test_bump_without_changes_is_noop() {
        let fx = Fixture::new();
        let mut record = ReleaseRecord::initialize(&fx.ctx(), fx.new_record("a", "a-")).unwrap();

        let outcome = record
            .tag_next_release(&fx.ctx(), ReleaseLevel::Patch, None, false)
            .unwrap();

        assert_eq!(outcome, BumpOutcome::Unchanged);
        assert_eq!(record.version(), &VersionNumber::new(0, 0, 0));
        assert!(fx
            .reporter
            .messages(Level::Info)
            .iter()
            .any(|m| m.contains("has no changes since 0.0.0")));
    }

    #[test]
    fn test_bump_with_changes() {
        let fx = Fixture::new();
        let mut record = ReleaseRecord::initialize(&fx.ctx(), fx.new_record("a", "a-")).unwrap();
        fx.mock.add_dirty_file(fx.file("a/src.txt"));

        let outcome = record
            .tag_next_release(&fx.ctx(), ReleaseLevel::Minor, None, false)
            .unwrap();

        assert_eq!(outcome, BumpOutcome::Tagged("a-0.1.0".to_string()));
        assert_eq!(fx.mock.tags(), vec!["a-0.0.0", "a-0.1.0"]);
        let last = fx.mock.commit_messages().pop().unwrap();
        assert_eq!(last, "bumped a to release 0.1.0");

        let content = fs::read_to_string(fx.root.join("a").join(RECORD_FILE_NAME)).unwrap();
        assert!(content.contains("release=0.1.0"));
        assert!(content.contains("tag=a-0.1.0"));
    }

    #[test]
    fn test_bump_follows_watched_directory() {
        let fx = Fixture::new();
        let mut new = fx.new_record("a", "a-");
        new.watched_directories = vec!["../b".to_string()];
        let mut record = ReleaseRecord::initialize(&fx.ctx(), new).unwrap();
        fx.mock.add_commit("change b", &[fx.file("b/lib.txt")]);

        let outcome = record
            .tag_next_release(&fx.ctx(), ReleaseLevel::Patch, Some("release a"), false)
            .unwrap();

        assert_eq!(outcome, BumpOutcome::Tagged("a-0.0.1".to_string()));
    }

    #[test]
    fn test_forced_bump_without_changes() {
        let fx = Fixture::new();
        let mut record = ReleaseRecord::initialize(&fx.ctx(), fx.new_record("a", "a-")).unwrap();

        let outcome = record
            .tag_next_release(&fx.ctx(), ReleaseLevel::Major, None, true)
            .unwrap();

        assert_eq!(outcome, BumpOutcome::Tagged("a-1.0.0".to_string()));
        assert!(fx.mock.tags().contains(&"a-1.0.0".to_string()));
    }

    #[test]
    fn test_bump_to_existing_tag_keeps_version() {
        let fx = Fixture::new();
        let mut record = ReleaseRecord::initialize(&fx.ctx(), fx.new_record("a", "a-")).unwrap();
        fx.mock.add_tag("a-0.0.1");

        let err = record
            .tag_next_release(&fx.ctx(), ReleaseLevel::Patch, None, true)
            .unwrap_err();

        assert!(matches!(err, ReleaseTagError::DuplicateTag(ref t) if t == "a-0.0.1"));
        assert_eq!(record.version(), &VersionNumber::new(0, 0, 0));
        let content = fs::read_to_string(fx.root.join("a").join(RECORD_FILE_NAME)).unwrap();
        assert!(content.contains("release=0.0.0"));
    }

    #[test]
    fn test_bump_past_maximum_keeps_version() {
        let fx = Fixture::new();
        let mut new = fx.new_record("a", "a-");
        new.version = VersionNumber::new(u64::MAX, 0, 0);
        let mut record = ReleaseRecord::initialize(&fx.ctx(), new).unwrap();

        let err = record
            .tag_next_release(&fx.ctx(), ReleaseLevel::Major, None, true)
            .unwrap_err();

        assert!(matches!(err, ReleaseTagError::Format(_)));
        assert_eq!(record.version(), &VersionNumber::new(u64::MAX, 0, 0));
        assert_eq!(fx.mock.tags(), vec![format!("a-{}.0.0", u64::MAX)]);
    }

    #[test]
    fn test_pre_tag_command_output_is_reported() {
        let fx = Fixture::new();
        let mut new = fx.new_record("a", "a-");
        new.pre_tag_command =
            PreTagCommand::parse("echo out @@RELEASE@@; echo err @@TAG@@ >&2").unwrap();
        let mut record = ReleaseRecord::initialize(&fx.ctx(), new).unwrap();

        record
            .tag_next_release(&fx.ctx(), ReleaseLevel::Patch, None, true)
            .unwrap();

        let debug = fx.reporter.messages(Level::Debug);
        assert!(debug.contains(&"out 0.0.1".to_string()), "{:?}", debug);
        assert!(debug.contains(&"err a-0.0.1".to_string()), "{:?}", debug);
    }

    #[test]
    fn test_pre_tag_command_runs_in_directory() {
        let fx = Fixture::new();
        let mut new = fx.new_record("a", "a-");
        new.pre_tag_command = PreTagCommand::parse("echo @@RELEASE@@ > release.txt").unwrap();
        let mut record = ReleaseRecord::initialize(&fx.ctx(), new).unwrap();

        record
            .tag_next_release(&fx.ctx(), ReleaseLevel::Patch, None, true)
            .unwrap();

        let written = fs::read_to_string(fx.root.join("a/release.txt")).unwrap();
        assert_eq!(written.trim_end(), "0.0.1");
    }

    #[test]
    fn test_failing_pre_tag_command_prevents_tag() {
        let fx = Fixture::new();
        let mut new = fx.new_record("a", "a-");
        new.pre_tag_command = PreTagCommand::parse("test @@RELEASE@@ != 0.0.1").unwrap();
        let mut record = ReleaseRecord::initialize(&fx.ctx(), new).unwrap();

        let err = record
            .tag_next_release(&fx.ctx(), ReleaseLevel::Patch, None, true)
            .unwrap_err();

        assert!(matches!(err, ReleaseTagError::ExternalCommandFailed(_)));
        assert!(!fx.mock.tags().contains(&"a-0.0.1".to_string()));
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let fx = Fixture::new();
        let dry = DryRun::new(MockRepository::with_workspace(&fx.root));
        let ctx = ReleaseContext {
            vcs: &dry,
            reporter: &fx.reporter,
            messages: &fx.messages,
            dry_run: true,
        };
        let mut new = fx.new_record("a", "a-");
        new.pre_tag_command = PreTagCommand::parse("echo @@RELEASE@@ > release.txt").unwrap();

        let mut record = ReleaseRecord::initialize(&ctx, new).unwrap();
        record
            .tag_next_release(&ctx, ReleaseLevel::Patch, None, true)
            .unwrap();

        assert!(!ReleaseRecord::exists_in(&fx.root.join("a")));
        assert!(!fx.root.join("a/release.txt").exists());
        assert!(dry.into_inner().tags().is_empty());
    }
}
