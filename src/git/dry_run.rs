use crate::error::Result;
use crate::git::VersionControl;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Wraps a [VersionControl] so that queries still run but mutations only get logged
pub struct DryRun<V> {
    inner: V,
}

impl<V: VersionControl> DryRun<V> {
    pub fn new(inner: V) -> Self {
        DryRun { inner }
    }

    pub fn into_inner(self) -> V {
        self.inner
    }
}

impl<V: VersionControl> VersionControl for DryRun<V> {
    fn is_inside_work_tree(&self, dir: &Path) -> bool {
        self.inner.is_inside_work_tree(dir)
    }

    fn top_level(&self, dir: &Path) -> Result<Option<PathBuf>> {
        self.inner.top_level(dir)
    }

    fn prefix(&self, dir: &Path) -> Result<String> {
        self.inner.prefix(dir)
    }

    fn list_tags(&self, dir: &Path) -> Result<Vec<String>> {
        self.inner.list_tags(dir)
    }

    fn short_revision(&self, dir: &Path, paths: &[PathBuf]) -> Result<String> {
        self.inner.short_revision(dir, paths)
    }

    fn status(&self, dir: &Path, paths: &[PathBuf]) -> Result<Vec<String>> {
        self.inner.status(dir, paths)
    }

    fn diff_summary(&self, dir: &Path, reference: &str, paths: &[PathBuf]) -> Result<String> {
        self.inner.diff_summary(dir, reference, paths)
    }

    fn init(&self, dir: &Path) -> Result<()> {
        debug!(dir = %dir.display(), "dry-run: skipping git init");
        Ok(())
    }

    fn stage(&self, dir: &Path, paths: &[PathBuf]) -> Result<()> {
        debug!(dir = %dir.display(), ?paths, "dry-run: skipping git add");
        Ok(())
    }

    fn commit(&self, dir: &Path, message: &str) -> Result<()> {
        debug!(dir = %dir.display(), commit_message = message, "dry-run: skipping git commit");
        Ok(())
    }

    fn create_tag(&self, dir: &Path, name: &str) -> Result<()> {
        debug!(dir = %dir.display(), name, "dry-run: skipping git tag");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;

    #[test]
    fn test_mutations_are_suppressed() {
        let root = PathBuf::from("/repo");
        let mock = MockRepository::with_workspace(&root);
        mock.add_dirty_file(root.join("a/file.txt"));

        let dry = DryRun::new(mock);
        dry.stage(&root, &[root.clone()]).unwrap();
        dry.commit(&root, "message").unwrap();
        dry.create_tag(&root, "a-1.0.0").unwrap();

        let mock = dry.into_inner();
        assert!(mock.tags().is_empty());
        assert!(mock.commit_messages().is_empty());
        assert_eq!(mock.status(&root, &[root.clone()]).unwrap().len(), 1);
    }

    #[test]
    fn test_queries_still_run() {
        let root = PathBuf::from("/repo");
        let mock = MockRepository::with_workspace(&root);
        mock.add_tag("a-1.0.0");

        let dry = DryRun::new(mock);
        assert!(dry.is_inside_work_tree(&root.join("a")));
        assert_eq!(dry.list_tags(&root).unwrap(), vec!["a-1.0.0"]);
    }
}
