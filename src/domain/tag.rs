use crate::domain::VersionNumber;
use crate::error::{ReleaseTagError, Result};
use regex::Regex;
use std::fmt;

/// A release tag: base tag followed by the version, e.g. `core-1.2.3`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub base: String,
    pub version: VersionNumber,
}

impl Tag {
    /// Create a new tag from its base and version
    pub fn new(base: impl Into<String>, version: VersionNumber) -> Self {
        Tag {
            base: base.into(),
            version,
        }
    }

    /// Full tag name
    pub fn name(&self) -> String {
        format!("{}{}", self.base, self.version)
    }

    /// Split a tag name into `<base><major.minor.patch>`.
    ///
    /// When `declared` is given and the name ends with it, that suffix is the version. Otherwise
    /// the shortest prefix followed by a complete `major.minor.patch` wins, so `core-10.0.0`
    /// splits into `core-` and `10.0.0`.
    pub fn decompose(name: &str, declared: Option<&VersionNumber>) -> Result<Tag> {
        if let Some(version) = declared {
            if let Some(base) = name.strip_suffix(&version.to_string()) {
                return Ok(Tag::new(base, *version));
            }
        }

        let re = Regex::new(r"^(?P<base>.*?)(?P<release>[0-9]+\.[0-9]+\.[0-9]+)$")
            .map_err(|e| ReleaseTagError::format(format!("invalid tag pattern: {}", e)))?;
        let captures = re.captures(name).ok_or_else(|| {
            ReleaseTagError::format(format!(
                "incorrect format of tag '{}', expected <base><major.minor.patch>",
                name
            ))
        })?;

        let version = VersionNumber::parse(&captures["release"])?;
        Ok(Tag::new(&captures["base"], version))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.version)
    }
}
