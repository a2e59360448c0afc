use crate::error::{ReleaseTagError, Result};
use crate::git::VersionControl;
use git2::{
    Commit, DiffOptions, DiffStatsFormat, ErrorCode, IndexAddOption, Repository, Signature,
    StatusOptions, Tree,
};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const FALLBACK_NAME: &str = "git-release-tag";
const FALLBACK_EMAIL: &str = "git-release-tag@localhost";

/// Characters libgit2 interprets in a pathspec
const GLOB_CHARS: [char; 4] = ['\\', '*', '?', '['];

/// [VersionControl] backed by libgit2 through the `git2` crate
///
/// Each call discovers the repository containing the directory it is given,
/// so components from several repositories can be handled by one instance.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Repository;

impl Git2Repository {
    pub fn new() -> Self {
        Git2Repository
    }

    fn open(dir: &Path) -> Result<Repository> {
        Repository::discover(dir).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                ReleaseTagError::NotInWorkspace(dir.to_path_buf())
            } else {
                ReleaseTagError::Git(e)
            }
        })
    }

    fn workdir(repo: &Repository, dir: &Path) -> Result<PathBuf> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| ReleaseTagError::NotInWorkspace(dir.to_path_buf()))?;
        Ok(workdir.canonicalize()?)
    }

    /// Translate absolute directories into pathspecs relative to the working tree root.
    /// An empty result matches everything.
    fn pathspecs(repo: &Repository, dir: &Path, paths: &[PathBuf]) -> Result<Vec<String>> {
        let root = Self::workdir(repo, dir)?;
        let mut specs = Vec::with_capacity(paths.len());

        for path in paths {
            let absolute = path.canonicalize().unwrap_or_else(|_| path.clone());
            let relative = absolute
                .strip_prefix(&root)
                .map_err(|_| ReleaseTagError::NotInWorkspace(absolute.clone()))?;

            let spec = to_pathspec(relative);
            if spec.is_empty() {
                return Ok(Vec::new());
            }
            specs.extend(literal_pathspecs(spec));
        }

        Ok(specs)
    }

    fn diff_options(specs: &[String]) -> DiffOptions {
        let mut opts = DiffOptions::new();
        for spec in specs {
            opts.pathspec(spec.as_str());
        }
        opts
    }

    /// Whether `tree` differs from `parent` under `specs`
    fn touches(
        repo: &Repository,
        parent: Option<&Tree<'_>>,
        tree: &Tree<'_>,
        specs: &[String],
    ) -> Result<bool> {
        let mut opts = Self::diff_options(specs);
        let diff = repo.diff_tree_to_tree(parent, Some(tree), Some(&mut opts))?;
        Ok(diff.deltas().len() > 0)
    }

    fn head_commit(repo: &Repository) -> Result<Option<Commit<'_>>> {
        match repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn to_pathspec(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Pathspecs matching `spec` literally.
///
/// A directory name containing wildcard characters is escaped. An escaped
/// pattern no longer matches as a directory prefix, so its contents are
/// matched by an extra `/*` pattern.
fn literal_pathspecs(spec: String) -> Vec<String> {
    if !spec.contains(GLOB_CHARS) {
        return vec![spec];
    }

    let mut escaped = String::with_capacity(spec.len() + 4);
    for c in spec.chars() {
        if GLOB_CHARS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    vec![format!("{}/*", escaped), escaped]
}

impl VersionControl for Git2Repository {
    fn is_inside_work_tree(&self, dir: &Path) -> bool {
        match Repository::discover(dir) {
            Ok(repo) => !repo.is_bare(),
            Err(_) => false,
        }
    }

    fn top_level(&self, dir: &Path) -> Result<Option<PathBuf>> {
        match Repository::discover(dir) {
            Ok(repo) => match repo.workdir() {
                Some(workdir) => Ok(Some(workdir.canonicalize()?)),
                None => Ok(None),
            },
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn prefix(&self, dir: &Path) -> Result<String> {
        let repo = Self::open(dir)?;
        let root = Self::workdir(&repo, dir)?;
        let absolute = dir.canonicalize()?;
        let relative = absolute
            .strip_prefix(&root)
            .map_err(|_| ReleaseTagError::NotInWorkspace(absolute.clone()))?;
        Ok(to_pathspec(relative))
    }

    fn list_tags(&self, dir: &Path) -> Result<Vec<String>> {
        debug!(dir = %dir.display(), "git tag");
        let repo = Self::open(dir)?;
        let tags = repo.tag_names(None)?;
        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn short_revision(&self, dir: &Path, paths: &[PathBuf]) -> Result<String> {
        let repo = Self::open(dir)?;
        let specs = Self::pathspecs(&repo, dir, paths)?;
        debug!(dir = %dir.display(), ?specs, "git log -n 1 --format=%h");

        let mut commit = match Self::head_commit(&repo)? {
            Some(head) => head,
            None => return Ok(String::new()),
        };

        // A commit without changes under the pathspecs relative to one of its
        // parents hands the walk over to that parent alone, so merges only
        // count when they differ from every parent.
        loop {
            let tree = commit.tree()?;

            let mut unchanged_parent = None;
            for parent in commit.parents() {
                if !Self::touches(&repo, Some(&parent.tree()?), &tree, &specs)? {
                    unchanged_parent = Some(parent);
                    break;
                }
            }

            match unchanged_parent {
                Some(parent) => commit = parent,
                None if commit.parent_count() > 0
                    || Self::touches(&repo, None, &tree, &specs)? =>
                {
                    let short = commit.as_object().short_id()?;
                    return Ok(short.as_str().unwrap_or_default().to_string());
                }
                None => return Ok(String::new()),
            }
        }
    }

    fn status(&self, dir: &Path, paths: &[PathBuf]) -> Result<Vec<String>> {
        let repo = Self::open(dir)?;
        let specs = Self::pathspecs(&repo, dir, paths)?;
        debug!(dir = %dir.display(), ?specs, "git status -s");

        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        for spec in &specs {
            opts.pathspec(spec.as_str());
        }

        let statuses = repo.statuses(Some(&mut opts))?;
        Ok(statuses
            .iter()
            .filter(|entry| !entry.status().is_ignored())
            .filter_map(|entry| entry.path().map(|p| p.to_string()))
            .collect())
    }

    fn diff_summary(&self, dir: &Path, reference: &str, paths: &[PathBuf]) -> Result<String> {
        let repo = Self::open(dir)?;
        let specs = Self::pathspecs(&repo, dir, paths)?;
        debug!(dir = %dir.display(), reference, ?specs, "git diff --shortstat");

        let object = repo
            .revparse_single(&format!("refs/tags/{}", reference))
            .or_else(|_| repo.revparse_single(reference))?;
        let tree = object.peel_to_tree()?;

        let mut opts = Self::diff_options(&specs);
        let diff = repo.diff_tree_to_workdir_with_index(Some(&tree), Some(&mut opts))?;
        let stats = diff.stats()?;
        if stats.files_changed() == 0 {
            return Ok(String::new());
        }

        let buf = stats.to_buf(DiffStatsFormat::SHORT, 80)?;
        Ok(buf.as_str().unwrap_or_default().trim().to_string())
    }

    fn init(&self, dir: &Path) -> Result<()> {
        debug!(dir = %dir.display(), "git init");
        Repository::init(dir)?;
        Ok(())
    }

    fn stage(&self, dir: &Path, paths: &[PathBuf]) -> Result<()> {
        let repo = Self::open(dir)?;
        let specs = Self::pathspecs(&repo, dir, paths)?;
        debug!(dir = %dir.display(), ?specs, "git add");

        let mut index = repo.index()?;
        index.add_all(specs.iter().map(|s| s.as_str()), IndexAddOption::DEFAULT, None)?;
        index.update_all(specs.iter().map(|s| s.as_str()), None)?;
        index.write()?;
        Ok(())
    }

    fn commit(&self, dir: &Path, message: &str) -> Result<()> {
        debug!(dir = %dir.display(), commit_message = message, "git commit");
        let repo = Self::open(dir)?;

        let mut index = repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        let signature = match repo.signature() {
            Ok(signature) => signature,
            Err(_) => Signature::now(FALLBACK_NAME, FALLBACK_EMAIL)?,
        };

        let parent = Self::head_commit(&repo)?;
        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        Ok(())
    }

    fn create_tag(&self, dir: &Path, name: &str) -> Result<()> {
        debug!(dir = %dir.display(), name, "git tag");
        let repo = Self::open(dir)?;
        let head = Self::head_commit(&repo)?.ok_or_else(|| {
            ReleaseTagError::external(format!(
                "cannot create tag {}: {} has no commits",
                name,
                dir.display()
            ))
        })?;

        repo.tag_lightweight(name, head.as_object(), false)
            .map_err(|e| {
                if e.code() == ErrorCode::Exists {
                    ReleaseTagError::DuplicateTag(name.to_string())
                } else {
                    ReleaseTagError::Git(e)
                }
            })?;
        Ok(())
    }
}
