use crate::domain::VersionNumber;
use crate::error::{ReleaseTagError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the settings file looked up in the current and the user config directory
pub const CONFIG_FILE_NAME: &str = "release-tag.toml";

/// Represents the complete configuration for git-release-tag.
///
/// Contains the defaults used by `initialize` and the commit message templates.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub messages: MessagesConfig,
}

fn default_initial_release() -> String {
    "0.0.0".to_string()
}

fn default_tag_separator() -> String {
    "-".to_string()
}

fn default_initialize_message() -> String {
    "initialized {prefix} to release {release}".to_string()
}

fn default_bump_message() -> String {
    "bumped {prefix} to release {release}".to_string()
}

/// Defaults for new release records.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DefaultsConfig {
    /// Release written by `initialize` when none is given
    #[serde(default = "default_initial_release")]
    pub initial_release: String,

    /// Appended to the directory name to form the default tag prefix
    #[serde(default = "default_tag_separator")]
    pub tag_separator: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            initial_release: default_initial_release(),
            tag_separator: default_tag_separator(),
        }
    }
}

impl DefaultsConfig {
    pub fn initial_release(&self) -> Result<VersionNumber> {
        VersionNumber::parse(&self.initial_release).map_err(|e| {
            ReleaseTagError::config(format!("invalid defaults.initial_release: {}", e))
        })
    }
}

/// Commit message templates. `{prefix}` is replaced by the component path
/// relative to the repository root, `{release}` by the new version.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MessagesConfig {
    #[serde(default = "default_initialize_message")]
    pub initialize: String,

    #[serde(default = "default_bump_message")]
    pub bump: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        MessagesConfig {
            initialize: default_initialize_message(),
            bump: default_bump_message(),
        }
    }
}

impl MessagesConfig {
    pub fn render(template: &str, prefix: &str, release: &VersionNumber) -> String {
        let prefix = if prefix.is_empty() { "." } else { prefix };
        template
            .replace("{prefix}", prefix)
            .replace("{release}", &release.to_string())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release-tag.toml` in current directory
/// 3. `release-tag.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read, parsed or holds an invalid release
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let path: Option<PathBuf> = if let Some(path) = config_path {
        Some(path.to_path_buf())
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        Some(PathBuf::from(CONFIG_FILE_NAME))
    } else {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .filter(|p| p.exists())
    };

    let Some(path) = path else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&path)?;
    let config: Config = toml::from_str(&content).map_err(|e| {
        ReleaseTagError::config(format!("cannot parse {}: {}", path.display(), e))
    })?;
    config.defaults.initial_release()?;
    Ok(config)
}
