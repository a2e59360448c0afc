use crate::domain::Tag;
use crate::error::{ReleaseTagError, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;

const RELEASE: &str = "RELEASE";
const TAG: &str = "TAG";
const BASE_TAG: &str = "BASE_TAG";

/// Shell command template run before a release is committed and tagged.
///
/// The template must reference `@@RELEASE@@` and may reference `@@TAG@@` and `@@BASE_TAG@@`.
/// A value of this type has always passed that check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreTagCommand {
    template: String,
}

impl PreTagCommand {
    /// Validate a template. An empty template means no hook.
    pub fn parse(template: &str) -> Result<Option<Self>> {
        if template.trim().is_empty() {
            return Ok(None);
        }

        let re = Regex::new(r"@@([a-zA-Z_]+)@@")
            .map_err(|e| ReleaseTagError::format(format!("invalid placeholder pattern: {}", e)))?;
        let references: BTreeSet<&str> = re
            .captures_iter(template)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();

        let unsupported: Vec<&str> = references
            .iter()
            .copied()
            .filter(|r| ![RELEASE, TAG, BASE_TAG].contains(r))
            .collect();
        if !unsupported.is_empty() {
            return Err(ReleaseTagError::format(format!(
                "found unsupported references {:?} in pre tag command '{}'",
                unsupported, template
            )));
        }

        if !references.contains(RELEASE) {
            return Err(ReleaseTagError::format(format!(
                "expected at least a @@RELEASE@@ reference in pre tag command '{}'",
                template
            )));
        }

        Ok(Some(PreTagCommand {
            template: template.to_string(),
        }))
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Substitute RELEASE, TAG and BASE_TAG, in that order
    pub fn render(&self, tag: &Tag) -> String {
        self.template
            .replace("@@RELEASE@@", &tag.version.to_string())
            .replace("@@TAG@@", &tag.name())
            .replace("@@BASE_TAG@@", &tag.base)
    }
}

impl fmt::Display for PreTagCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
