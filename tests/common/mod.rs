#![allow(dead_code)]

use git2::{Commit, IndexAddOption, Repository};
use git_release_tag::cli::orchestration::InitializeArgs;
use git_release_tag::cli::{run_workflow_with, Workflow};
use git_release_tag::config::Config;
use git_release_tag::git::Git2Repository;
use git_release_tag::ui::{Reporter, Verbosity};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A git repository in a temporary directory
pub struct Workspace {
    _temp: TempDir,
    pub root: PathBuf,
    pub repo: Repository,
}

impl Workspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Could not create temp dir");
        let root = temp.path().canonicalize().unwrap();
        let repo = Repository::init(&root).expect("Could not init git repo");
        {
            let mut config = repo.config().expect("Could not get config");
            config
                .set_str("user.name", "Test User")
                .expect("Could not set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Could not set user.email");
        }

        Workspace {
            _temp: temp,
            root,
            repo,
        }
    }

    /// Create a directory below the root and return its path
    pub fn dir(&self, rel: &str) -> PathBuf {
        let path = self.root.join(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root.join(rel)).unwrap()
    }

    /// Stage everything and commit it
    pub fn commit_all(&self, message: &str) {
        let mut index = self.repo.index().unwrap();
        index.read(false).unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();

        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = self.repo.signature().unwrap();
        let parent = self.repo.head().ok().map(|h| h.peel_to_commit().unwrap());
        let parents: Vec<&Commit> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .repo
            .tag_names(None)
            .unwrap()
            .iter()
            .flatten()
            .map(String::from)
            .collect();
        tags.sort();
        tags
    }

    pub fn head_message(&self) -> String {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        head.message().unwrap_or_default().trim().to_string()
    }

    pub fn head_short_id(&self) -> String {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        let short = head.as_object().short_id().unwrap();
        short.as_str().unwrap().to_string()
    }

    pub fn is_clean(&self) -> bool {
        self.repo.statuses(None).unwrap().is_empty()
    }

    /// Initialize one directory with the given prefix, watch list and hook
    pub fn initialize(
        &self,
        rel: &str,
        tag_prefix: Option<&str>,
        watched: &[&str],
        pre_tag_command: Option<&str>,
    ) -> bool {
        let reporter = Reporter::capturing(Verbosity::Normal);
        let workflow = Workflow::Initialize(InitializeArgs {
            directories: vec![self.dir(rel)],
            initial_release: Some("0.1.0".to_string()),
            tag_prefix: tag_prefix.map(String::from),
            pre_tag_command: pre_tag_command.map(String::from),
            tag_on_changes_in: watched.iter().map(|s| s.to_string()).collect(),
        });
        run_workflow_with(workflow, &Git2Repository::new(), &reporter, &Config::default(), false)
            .unwrap()
    }
}

pub fn is_inside_repository(path: &Path) -> bool {
    Repository::discover(path).is_ok()
}
