use crate::domain::{PreTagCommand, Tag};
use crate::error::{ReleaseTagError, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Captured output of a successful hook run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Executes pre-tag hook commands
pub struct HookExecutor;

impl HookExecutor {
    /// Render the command for `tag` and run it with `sh -c` inside `directory`
    ///
    /// # Returns
    /// * `Ok(HookOutput)` if the command exits with code 0
    /// * `Err(ExternalCommandFailed)` if it cannot be started or exits non-zero;
    ///   the error carries the exit code, stdout and stderr
    pub fn execute(command: &PreTagCommand, tag: &Tag, directory: &Path) -> Result<HookOutput> {
        let rendered = command.render(tag);
        debug!(cwd = %directory.display(), "$ {}", rendered);

        let output = Command::new("sh")
            .arg("-c")
            .arg(&rendered)
            .current_dir(directory)
            .output()
            .map_err(|e| {
                ReleaseTagError::external(format!(
                    "failed to execute '{}' in {}: {}",
                    rendered,
                    directory.display(),
                    e
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        debug!(status = ?output.status.code(), %stdout, %stderr, "pre tag command finished");

        if !output.status.success() {
            return Err(ReleaseTagError::external(format!(
                "{} in {}, returned {}\nStdout: {}\nStderr: {}",
                command,
                directory.display(),
                output.status.code().unwrap_or(-1),
                stdout,
                stderr
            )));
        }

        Ok(HookOutput { stdout, stderr })
    }
}
