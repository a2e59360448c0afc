use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use git_release_tag::cli::orchestration::{BumpArgs, InitializeArgs, ShowArgs, ValidateArgs};
use git_release_tag::cli::{run_workflow, GlobalOptions, Workflow};
use git_release_tag::domain::ReleaseLevel;
use git_release_tag::ui::{formatter, Level, Verbosity};

#[derive(Parser)]
#[command(
    name = "git-release-tag",
    version,
    about = "Semantic release tags for components in a git repository"
)]
struct Args {
    #[arg(long, global = true, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[arg(short, long, global = true, help = "Show every step")]
    verbose: bool,

    #[arg(short, long, global = true, conflicts_with = "verbose", help = "Only print results and errors")]
    quiet: bool,

    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a release record in each directory, commit and tag it
    Initialize {
        #[arg(long, help = "Release to start from [default: defaults.initial_release]")]
        initial_release: Option<String>,

        #[arg(long, help = "Tag prefix, only with a single directory [default: <directory name>-]")]
        tag_prefix: Option<String>,

        #[arg(long, help = "Command to run before tagging, must reference @@RELEASE@@")]
        pre_tag_command: Option<String>,

        #[arg(long, help = "Additional directory whose changes trigger a release")]
        tag_on_changes_in: Vec<String>,

        #[arg(required = true)]
        directories: Vec<PathBuf>,
    },

    /// Show the current version of components
    Show {
        #[arg(short, long, help = "All components below the directories")]
        recursive: bool,

        #[arg(long, help = "Also print the tag of the latest release")]
        with_tags: bool,

        directories: Vec<PathBuf>,
    },

    /// Bump, commit and tag components with changes since their last release
    Bump {
        #[arg(short, long, help = "Level to bump: patch, minor or major")]
        level: ReleaseLevel,

        #[arg(short, long, help = "All components below the directories")]
        recursive: bool,

        #[arg(short, long, help = "Bump even without changes")]
        force: bool,

        #[arg(short, long, help = "Commit message [default: messages.bump]")]
        message: Option<String>,

        directories: Vec<PathBuf>,
    },

    /// Check that every component has a unique tag prefix and an existing tag
    Validate {
        #[arg(short, long, help = "All components below the directories")]
        recursive: bool,

        directories: Vec<PathBuf>,
    },
}

impl From<Command> for Workflow {
    fn from(command: Command) -> Self {
        match command {
            Command::Initialize {
                initial_release,
                tag_prefix,
                pre_tag_command,
                tag_on_changes_in,
                directories,
            } => Workflow::Initialize(InitializeArgs {
                directories,
                initial_release,
                tag_prefix,
                pre_tag_command,
                tag_on_changes_in,
            }),
            Command::Show {
                recursive,
                with_tags,
                directories,
            } => Workflow::Show(ShowArgs {
                directories,
                recursive,
                with_tags,
            }),
            Command::Bump {
                level,
                recursive,
                force,
                message,
                directories,
            } => Workflow::Bump(BumpArgs {
                directories,
                level,
                recursive,
                force,
                message,
            }),
            Command::Validate {
                recursive,
                directories,
            } => Workflow::Validate(ValidateArgs {
                directories,
                recursive,
            }),
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let verbosity = if args.verbose {
        Verbosity::Verbose
    } else if args.quiet {
        Verbosity::Quiet
    } else {
        Verbosity::Normal
    };
    let options = GlobalOptions {
        config_path: args.config,
        dry_run: args.dry_run,
        verbosity,
    };

    match run_workflow(args.command.into(), &options) {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}", formatter::diagnostic(Level::Error, &format!("{:#}", e)));
            std::process::exit(1);
        }
    }
}
