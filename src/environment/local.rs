//! Local execution environment.
//!
//! Runs commands with `sh -c` directly in a host working directory. There is
//! no isolation beyond the directory itself.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::process::Command;

use super::transport::{collect_output, exit_status, shell_script, Transport};
use super::{ensure_command, Environment, EnvironmentConfig, EnvironmentKind, ExecutionResult};
use crate::error::EnvironmentError;

/// Execution handle bound to a directory on the host.
pub struct LocalEnvironment {
    cwd: PathBuf,
    env: BTreeMap<String, String>,
    timeout_secs: u64,
    merge_stderr: bool,
    transport: Transport,
}

impl LocalEnvironment {
    /// Binds a handle to `cwd`.
    ///
    /// # Errors
    ///
    /// Returns `EnvironmentError::WorkingDirectoryNotFound` if `cwd` is not an
    /// existing directory.
    pub fn new(cwd: impl Into<PathBuf>, config: &EnvironmentConfig) -> Result<Self, EnvironmentError> {
        let cwd = cwd.into();
        if !cwd.is_dir() {
            return Err(EnvironmentError::WorkingDirectoryNotFound(cwd));
        }

        Ok(Self {
            cwd,
            env: config.env.clone(),
            timeout_secs: config.timeout,
            merge_stderr: config.merge_stderr,
            transport: Transport::new()?,
        })
    }
}

impl Environment for LocalEnvironment {
    fn kind(&self) -> EnvironmentKind {
        EnvironmentKind::Local
    }

    fn cwd(&self) -> &Path {
        &self.cwd
    }

    fn execute(&self, command: &str) -> Result<ExecutionResult, EnvironmentError> {
        ensure_command(command)?;

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(shell_script(command, self.merge_stderr).as_ref())
            .current_dir(&self.cwd)
            .envs(&self.env);

        let output = self.transport.run(cmd, self.timeout_secs)?;
        Ok(ExecutionResult::new(
            exit_status(&output),
            collect_output(&output.stdout, &output.stderr, self.merge_stderr),
        ))
    }
}
