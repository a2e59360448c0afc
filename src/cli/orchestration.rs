//! Command workflow orchestration
//!
//! Turns parsed command arguments into orchestrator calls. The argument types
//! here mirror the CLI but do not depend on clap, so every command can be run
//! programmatically against any [VersionControl] and [Reporter].

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

use crate::config::{load_config, Config};
use crate::domain::{PreTagCommand, ReleaseLevel, VersionNumber};
use crate::git::{DryRun, Git2Repository, VersionControl};
use crate::orchestrator::{InitializeRequest, ReleaseOrchestrator};
use crate::record::ReleaseContext;
use crate::ui::{Reporter, Verbosity};

/// Options shared by every command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalOptions {
    /// Path to custom config file
    pub config_path: Option<PathBuf>,

    /// Preview mode - don't write records, run hooks, commit or tag
    pub dry_run: bool,

    pub verbosity: Verbosity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitializeArgs {
    pub directories: Vec<PathBuf>,
    /// Falls back to `defaults.initial_release`
    pub initial_release: Option<String>,
    pub tag_prefix: Option<String>,
    pub pre_tag_command: Option<String>,
    pub tag_on_changes_in: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowArgs {
    pub directories: Vec<PathBuf>,
    pub recursive: bool,
    pub with_tags: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BumpArgs {
    pub directories: Vec<PathBuf>,
    pub level: ReleaseLevel,
    pub recursive: bool,
    /// Bump even without changes since the last tag
    pub force: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    pub directories: Vec<PathBuf>,
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Workflow {
    Initialize(InitializeArgs),
    Show(ShowArgs),
    Bump(BumpArgs),
    Validate(ValidateArgs),
}

/// Run a command against the git repositories on disk
///
/// # Returns
///
/// * `Ok(true)` - the command succeeded
/// * `Ok(false)` - the command ran but reported a failure (validation issues,
///   an already initialized directory)
/// * `Err` - the command was aborted
pub fn run_workflow(workflow: Workflow, options: &GlobalOptions) -> Result<bool> {
    let config = load_config(options.config_path.as_deref()).context("Failed to load config")?;
    let reporter = Reporter::new(options.verbosity);

    if options.dry_run {
        let vcs = DryRun::new(Git2Repository::new());
        run_workflow_with(workflow, &vcs, &reporter, &config, true)
    } else {
        let vcs = Git2Repository::new();
        run_workflow_with(workflow, &vcs, &reporter, &config, false)
    }
}

/// Run a command with explicit collaborators
pub fn run_workflow_with(
    workflow: Workflow,
    vcs: &dyn VersionControl,
    reporter: &Reporter,
    config: &Config,
    dry_run: bool,
) -> Result<bool> {
    debug!(?workflow, dry_run, "running workflow");
    let orchestrator = ReleaseOrchestrator::new(ReleaseContext {
        vcs,
        reporter,
        messages: &config.messages,
        dry_run,
    });

    match workflow {
        Workflow::Initialize(args) => {
            let version = match &args.initial_release {
                Some(release) => VersionNumber::parse(release)?,
                None => config.defaults.initial_release()?,
            };
            let pre_tag_command = match &args.pre_tag_command {
                Some(template) => PreTagCommand::parse(template)?,
                None => None,
            };
            let directories = if args.directories.is_empty() {
                vec![PathBuf::from(".")]
            } else {
                args.directories
            };

            let ok = orchestrator.initialize(InitializeRequest {
                directories,
                version,
                tag_prefix: args.tag_prefix,
                tag_separator: config.defaults.tag_separator.clone(),
                pre_tag_command,
                watched_directories: args.tag_on_changes_in,
            })?;
            Ok(ok)
        }

        Workflow::Show(args) => {
            let tabular = args.recursive || args.directories.len() > 1;
            let records = orchestrator.discover(&args.directories, args.recursive)?;
            orchestrator.show(&records, tabular, args.with_tags)?;
            Ok(true)
        }

        Workflow::Bump(args) => {
            let mut records = orchestrator.discover(&args.directories, args.recursive)?;
            let ok = orchestrator.bump(
                &mut records,
                args.level,
                args.message.as_deref(),
                args.force,
            )?;
            Ok(ok)
        }

        Workflow::Validate(args) => {
            let records = orchestrator.discover(&args.directories, args.recursive)?;
            let report = orchestrator.validate(&records)?;
            if report.is_valid() {
                reporter.output("ok");
            }
            Ok(report.is_valid())
        }
    }
}
