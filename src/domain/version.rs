use crate::error::{ReleaseTagError, Result};
use std::fmt;
use std::str::FromStr;

/// Semantic version of a component, strictly `major.minor.patch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionNumber {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl VersionNumber {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        VersionNumber {
            major,
            minor,
            patch,
        }
    }

    /// Parse `"{major}.{minor}.{patch}"`; nothing may precede or follow the triple.
    pub fn parse(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.split('.').collect();
        if parts.len() != 3 {
            return Err(ReleaseTagError::format(format!(
                "could not parse '{}' as release, expected <major>.<minor>.<patch>",
                text
            )));
        }

        let component = |part: &str| -> Result<u64> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ReleaseTagError::format(format!(
                    "could not parse '{}' as release, '{}' is not a number",
                    text, part
                )));
            }
            part.parse::<u64>().map_err(|e| {
                ReleaseTagError::format(format!("could not parse '{}' as release: {}", text, e))
            })
        };

        Ok(VersionNumber {
            major: component(parts[0])?,
            minor: component(parts[1])?,
            patch: component(parts[2])?,
        })
    }

    /// Bump version according to release level
    ///
    /// Fails with a format error when the bumped component would overflow.
    pub fn bump(&self, level: ReleaseLevel) -> Result<Self> {
        let overflow = || {
            ReleaseTagError::format(format!(
                "cannot bump {} release {}, {} version is at its maximum",
                level.name(),
                self,
                level.name()
            ))
        };

        Ok(match level {
            ReleaseLevel::Major => VersionNumber {
                major: self.major.checked_add(1).ok_or_else(overflow)?,
                minor: 0,
                patch: 0,
            },
            ReleaseLevel::Minor => VersionNumber {
                major: self.major,
                minor: self.minor.checked_add(1).ok_or_else(overflow)?,
                patch: 0,
            },
            ReleaseLevel::Patch => VersionNumber {
                major: self.major,
                minor: self.minor,
                patch: self.patch.checked_add(1).ok_or_else(overflow)?,
            },
        })
    }
}

impl Default for VersionNumber {
    fn default() -> Self {
        VersionNumber::new(0, 0, 0)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for VersionNumber {
    type Err = ReleaseTagError;

    fn from_str(s: &str) -> Result<Self> {
        VersionNumber::parse(s)
    }
}

/// Level of a release bump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseLevel {
    Major,
    Minor,
    Patch,
}

impl ReleaseLevel {
    pub fn name(&self) -> &'static str {
        match self {
            ReleaseLevel::Major => "major",
            ReleaseLevel::Minor => "minor",
            ReleaseLevel::Patch => "patch",
        }
    }
}

impl FromStr for ReleaseLevel {
    type Err = ReleaseTagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "major" => Ok(ReleaseLevel::Major),
            "minor" => Ok(ReleaseLevel::Minor),
            "patch" => Ok(ReleaseLevel::Patch),
            other => Err(ReleaseTagError::format(format!(
                "'{}' is not a release level, expected patch, minor or major",
                other
            ))),
        }
    }
}
