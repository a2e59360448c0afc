use crate::error::{ReleaseTagError, Result};
use crate::git::VersionControl;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct MockCommit {
    id: String,
    message: String,
    files: Vec<PathBuf>,
}

/// Mock repository for testing without actual git operations
///
/// Files are tracked by absolute path. A tag remembers how many commits
/// existed when it was created, which is all `diff_summary` needs.
#[derive(Debug, Default)]
pub struct MockRepository {
    root: RefCell<Option<PathBuf>>,
    commits: RefCell<Vec<MockCommit>>,
    tags: RefCell<BTreeMap<String, usize>>,
    dirty: RefCell<BTreeSet<PathBuf>>,
    staged: RefCell<BTreeSet<PathBuf>>,
}

impl MockRepository {
    /// Create a mock with no workspace at all
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose working tree is rooted at `root`
    pub fn with_workspace(root: impl Into<PathBuf>) -> Self {
        let mock = Self::default();
        *mock.root.borrow_mut() = Some(root.into());
        mock
    }

    /// Mark a file as modified in the working tree
    pub fn add_dirty_file(&self, path: impl Into<PathBuf>) {
        self.dirty.borrow_mut().insert(path.into());
    }

    /// Record a commit touching `files`
    pub fn add_commit(&self, message: &str, files: &[PathBuf]) {
        let mut commits = self.commits.borrow_mut();
        let id = format!("{:07x}", 0xa000000 + commits.len());
        commits.push(MockCommit {
            id,
            message: message.to_string(),
            files: files.to_vec(),
        });
    }

    /// Add a tag on the latest commit
    pub fn add_tag(&self, name: impl Into<String>) {
        let count = self.commits.borrow().len();
        self.tags.borrow_mut().insert(name.into(), count);
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.borrow().keys().cloned().collect()
    }

    pub fn commit_messages(&self) -> Vec<String> {
        self.commits
            .borrow()
            .iter()
            .map(|c| c.message.clone())
            .collect()
    }

    fn under(file: &Path, paths: &[PathBuf]) -> bool {
        paths.is_empty() || paths.iter().any(|p| file.starts_with(p))
    }

    fn relative(&self, file: &Path) -> String {
        match self.root.borrow().as_ref() {
            Some(root) => file
                .strip_prefix(root)
                .unwrap_or(file)
                .to_string_lossy()
                .into_owned(),
            None => file.to_string_lossy().into_owned(),
        }
    }

    fn require_workspace(&self, dir: &Path) -> Result<PathBuf> {
        match self.root.borrow().as_ref() {
            Some(root) if dir.starts_with(root) => Ok(root.clone()),
            _ => Err(ReleaseTagError::NotInWorkspace(dir.to_path_buf())),
        }
    }
}

impl VersionControl for MockRepository {
    fn is_inside_work_tree(&self, dir: &Path) -> bool {
        self.require_workspace(dir).is_ok()
    }

    fn top_level(&self, dir: &Path) -> Result<Option<PathBuf>> {
        Ok(self.require_workspace(dir).ok())
    }

    fn prefix(&self, dir: &Path) -> Result<String> {
        self.require_workspace(dir)?;
        Ok(self.relative(dir))
    }

    fn list_tags(&self, dir: &Path) -> Result<Vec<String>> {
        self.require_workspace(dir)?;
        Ok(self.tags())
    }

    fn short_revision(&self, dir: &Path, paths: &[PathBuf]) -> Result<String> {
        self.require_workspace(dir)?;
        Ok(self
            .commits
            .borrow()
            .iter()
            .rev()
            .find(|c| c.files.iter().any(|f| Self::under(f, paths)))
            .map(|c| c.id.clone())
            .unwrap_or_default())
    }

    fn status(&self, dir: &Path, paths: &[PathBuf]) -> Result<Vec<String>> {
        self.require_workspace(dir)?;
        let dirty = self.dirty.borrow();
        let staged = self.staged.borrow();
        Ok(dirty
            .union(&staged)
            .filter(|f| Self::under(f, paths))
            .map(|f| self.relative(f))
            .collect())
    }

    fn diff_summary(&self, dir: &Path, reference: &str, paths: &[PathBuf]) -> Result<String> {
        self.require_workspace(dir)?;
        let since = *self.tags.borrow().get(reference).ok_or_else(|| {
            ReleaseTagError::external(format!("unknown revision '{}'", reference))
        })?;

        let mut changed: BTreeSet<PathBuf> = self.commits.borrow()[since..]
            .iter()
            .flat_map(|c| c.files.iter().cloned())
            .collect();
        changed.extend(self.dirty.borrow().iter().cloned());
        changed.extend(self.staged.borrow().iter().cloned());
        changed.retain(|f| Self::under(f, paths));

        Ok(match changed.len() {
            0 => String::new(),
            1 => "1 file changed".to_string(),
            n => format!("{} files changed", n),
        })
    }

    fn init(&self, dir: &Path) -> Result<()> {
        *self.root.borrow_mut() = Some(dir.to_path_buf());
        Ok(())
    }

    fn stage(&self, dir: &Path, paths: &[PathBuf]) -> Result<()> {
        self.require_workspace(dir)?;
        let mut dirty = self.dirty.borrow_mut();
        let selected: Vec<PathBuf> = dirty
            .iter()
            .filter(|f| Self::under(f, paths))
            .cloned()
            .collect();
        for file in selected {
            dirty.remove(&file);
            self.staged.borrow_mut().insert(file);
        }
        Ok(())
    }

    fn commit(&self, dir: &Path, message: &str) -> Result<()> {
        self.require_workspace(dir)?;
        let files: Vec<PathBuf> = std::mem::take(&mut *self.staged.borrow_mut())
            .into_iter()
            .collect();
        if files.is_empty() {
            return Err(ReleaseTagError::external("nothing to commit"));
        }
        self.add_commit(message, &files);
        Ok(())
    }

    fn create_tag(&self, dir: &Path, name: &str) -> Result<()> {
        self.require_workspace(dir)?;
        if self.tags.borrow().contains_key(name) {
            return Err(ReleaseTagError::DuplicateTag(name.to_string()));
        }
        self.add_tag(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_repository_default() {
        let repo = MockRepository::default();
        assert!(!repo.is_inside_work_tree(Path::new("/repo")));
        assert_eq!(repo.top_level(Path::new("/repo")).unwrap(), None);
    }

    #[test]
    fn test_mock_repository_tags() {
        let root = PathBuf::from("/repo");
        let repo = MockRepository::with_workspace(&root);
        repo.create_tag(&root, "v1.0.0").unwrap();

        assert_eq!(repo.list_tags(&root).unwrap(), vec!["v1.0.0"]);
        assert!(matches!(
            repo.create_tag(&root, "v1.0.0"),
            Err(ReleaseTagError::DuplicateTag(_))
        ));
    }

    #[test]
    fn test_mock_repository_changes_since_tag() {
        let root = PathBuf::from("/repo");
        let a = root.join("a");
        let b = root.join("b");
        let repo = MockRepository::with_workspace(&root);
        repo.add_commit("initial", &[a.join("x"), b.join("y")]);
        repo.add_tag("t-1.0.0");

        assert_eq!(repo.diff_summary(&root, "t-1.0.0", &[a.clone()]).unwrap(), "");

        repo.add_commit("change a", &[a.join("x")]);
        assert_eq!(
            repo.diff_summary(&root, "t-1.0.0", &[a.clone()]).unwrap(),
            "1 file changed"
        );
        assert_eq!(repo.diff_summary(&root, "t-1.0.0", &[b.clone()]).unwrap(), "");
        assert_eq!(repo.short_revision(&root, &[a]).unwrap(), "a000001");
        assert_eq!(repo.short_revision(&root, &[b]).unwrap(), "a000000");
    }

    #[test]
    fn test_mock_repository_stage_and_commit() {
        let root = PathBuf::from("/repo");
        let repo = MockRepository::with_workspace(&root);
        repo.add_dirty_file(root.join("a/file.txt"));
        repo.add_dirty_file(root.join("b/file.txt"));

        assert_eq!(
            repo.status(&root, &[root.join("a")]).unwrap(),
            vec!["a/file.txt"]
        );

        repo.stage(&root, &[root.join("a")]).unwrap();
        repo.commit(&root, "commit a").unwrap();

        assert!(repo.status(&root, &[root.join("a")]).unwrap().is_empty());
        assert_eq!(repo.status(&root, &[root.clone()]).unwrap(), vec!["b/file.txt"]);
        assert_eq!(repo.commit_messages(), vec!["commit a"]);
        assert!(repo.commit(&root, "empty").is_err());
    }
}
