//! Line-oriented `key=value` format of a release record file.
//!
//! ```text
//! release=<major>.<minor>.<patch>
//! tag=<base_tag><major>.<minor>.<patch>
//! pre_tag_command=<optional template>
//! tag_on_changes_in=<optional space-separated relative paths>
//! ```
//!
//! Lines starting with `#` and blank lines are ignored.

use crate::error::{ReleaseTagError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Raw, unvalidated content of a record file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordFile {
    pub release: String,
    pub tag: String,
    pub pre_tag_command: Option<String>,
    pub tag_on_changes_in: Option<Vec<String>>,
}

impl RecordFile {
    /// Parse record file content; `path` only serves error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut values: HashMap<&str, &str> = HashMap::new();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim_end();
            if line.is_empty() || line.trim_start().starts_with('#') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| {
                ReleaseTagError::format(format!(
                    "{}:{}: expected <key>=<value>, found '{}'",
                    path.display(),
                    number + 1,
                    line
                ))
            })?;
            values.insert(key.trim(), value.trim());
        }

        let (Some(release), Some(tag)) = (values.get("release"), values.get("tag")) else {
            return Err(ReleaseTagError::format(format!(
                "{} does not contain release and/or tag values",
                path.display()
            )));
        };

        let pre_tag_command = values
            .get("pre_tag_command")
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string());

        let tag_on_changes_in = values
            .get("tag_on_changes_in")
            .map(|v| v.split_whitespace().map(|s| s.to_string()).collect::<Vec<_>>())
            .filter(|dirs| !dirs.is_empty());

        Ok(RecordFile {
            release: release.to_string(),
            tag: tag.to_string(),
            pre_tag_command,
            tag_on_changes_in,
        })
    }

    /// Render the record in its fixed key order
    pub fn render(&self) -> String {
        let mut out = format!("release={}\ntag={}\n", self.release, self.tag);

        if let Some(command) = &self.pre_tag_command {
            out.push_str(&format!("pre_tag_command={}\n", command));
        }

        if let Some(dirs) = &self.tag_on_changes_in {
            if dirs.len() != 1 || dirs[0] != "." {
                out.push_str(&format!("tag_on_changes_in={}\n", dirs.join(" ")));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> &'static Path {
        Path::new("/repo/a/.release")
    }

    #[test]
    fn test_parse_full_record() {
        let content = "# managed by git-release-tag\n\
                       release=1.2.3\n\
                       tag=a-1.2.3\n\
                       pre_tag_command=echo @@RELEASE@@ > VERSION\n\
                       tag_on_changes_in=. ../b\n";
        let record = RecordFile::parse(content, path()).unwrap();

        assert_eq!(record.release, "1.2.3");
        assert_eq!(record.tag, "a-1.2.3");
        assert_eq!(
            record.pre_tag_command.as_deref(),
            Some("echo @@RELEASE@@ > VERSION")
        );
        assert_eq!(
            record.tag_on_changes_in,
            Some(vec![".".to_string(), "../b".to_string()])
        );
    }

    #[test]
    fn test_parse_minimal_record() {
        let record = RecordFile::parse("release=0.1.0\ntag=0.1.0\n", path()).unwrap();
        assert_eq!(record.pre_tag_command, None);
        assert_eq!(record.tag_on_changes_in, None);
    }

    #[test]
    fn test_value_may_contain_equals_sign() {
        let content = "release=0.1.0\ntag=0.1.0\npre_tag_command=X=@@RELEASE@@ make\n";
        let record = RecordFile::parse(content, path()).unwrap();
        assert_eq!(record.pre_tag_command.as_deref(), Some("X=@@RELEASE@@ make"));
    }

    #[test]
    fn test_missing_required_keys() {
        for content in ["release=0.1.0\n", "tag=a-0.1.0\n", ""] {
            let err = RecordFile::parse(content, path()).unwrap_err();
            assert!(matches!(err, ReleaseTagError::Format(_)));
            assert!(err.to_string().contains("does not contain release and/or tag"));
        }
    }

    #[test]
    fn test_line_without_separator() {
        let err = RecordFile::parse("release=0.1.0\ntag=0.1.0\ngarbage\n", path()).unwrap_err();
        assert!(err.to_string().contains(":3:"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let record = RecordFile {
            release: "1.0.0".to_string(),
            tag: "a-1.0.0".to_string(),
            pre_tag_command: Some("echo @@RELEASE@@".to_string()),
            tag_on_changes_in: Some(vec!["../b".to_string(), ".".to_string()]),
        };
        assert_eq!(
            record.render(),
            "release=1.0.0\ntag=a-1.0.0\npre_tag_command=echo @@RELEASE@@\ntag_on_changes_in=../b .\n"
        );
    }

    #[test]
    fn test_render_omits_default_watch_list() {
        let record = RecordFile {
            release: "1.0.0".to_string(),
            tag: "1.0.0".to_string(),
            pre_tag_command: None,
            tag_on_changes_in: Some(vec![".".to_string()]),
        };
        assert_eq!(record.render(), "release=1.0.0\ntag=1.0.0\n");
    }
}
