//! Container execution environment.
//!
//! Drives a container runtime CLI (`docker` by default). A handle either
//! starts its own keep-alive container, which it owns and removes, or attaches
//! to a container someone else manages.
//!
//! ```text
//! docker run -d --name swe-submit-<uuid> -w <cwd> --rm <image> sleep 2h
//! docker exec -w <cwd> -e K=V <container> bash -lc '{ <command>
//! } 2>&1'
//! docker rm -f <container>
//! ```

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;
use uuid::Uuid;

use super::transport::{collect_output, exit_status, shell_script, truncate, Transport};
use super::{ensure_command, Environment, EnvironmentConfig, EnvironmentKind, ExecutionResult};
use crate::error::EnvironmentError;

/// Exit status the docker CLI uses when the daemon itself fails. A command
/// inside the container may exit with the same status, so it only counts
/// together with a runtime marker on stderr.
const RUNTIME_FAILURE_EXIT: i32 = 125;

/// Stderr prefixes that identify a runtime failure rather than command output.
const RUNTIME_FAILURE_MARKERS: &[&str] = &[
    "Error response from daemon",
    "Cannot connect to the Docker daemon",
    "Error: no container with name or ID",
    "OCI runtime exec failed",
];

/// Execution handle bound to a directory inside a container.
pub struct ContainerEnvironment {
    container_id: String,
    owned: bool,
    removed: bool,
    cwd: PathBuf,
    executable: String,
    shell: String,
    env: Vec<(String, String)>,
    timeout_secs: u64,
    merge_stderr: bool,
    transport: Transport,
}

impl ContainerEnvironment {
    /// Provisions a container for `cwd` according to `config`.
    ///
    /// Attaches when `config.container_id` is set, otherwise starts a new
    /// container from `config.image`.
    pub fn start(cwd: impl Into<PathBuf>, config: &EnvironmentConfig) -> Result<Self, EnvironmentError> {
        if let Some(id) = config.container_id.as_deref() {
            return Self::attach(id, cwd, config);
        }

        let image = config.image.as_deref().ok_or(EnvironmentError::MissingImage)?;
        let cwd = cwd.into();
        let transport = Transport::new()?;
        let name = format!("swe-submit-{}", Uuid::new_v4().simple());

        let mut command = Command::new(&config.executable);
        command.args(run_args(&name, &cwd, image, config));

        let output = transport
            .run(command, config.pull_timeout)
            .map_err(|e| match e {
                EnvironmentError::CommandTimedOut { seconds } => {
                    EnvironmentError::EnvironmentUnavailable(format!(
                        "Timed out after {seconds}s starting container from '{image}'"
                    ))
                }
                other => other,
            })?;

        if !output.status.success() {
            return Err(EnvironmentError::EnvironmentUnavailable(format!(
                "Failed to start container from '{}': {}",
                image,
                truncate(String::from_utf8_lossy(&output.stderr).trim(), 500)
            )));
        }

        let container_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(container = %container_id, name = %name, image = image, "Container started");

        Ok(Self::bind(container_id, true, cwd, config, transport))
    }

    /// Attaches to a running container without taking ownership of it.
    ///
    /// # Errors
    ///
    /// Returns `EnvironmentError::EnvironmentUnavailable` if the container
    /// does not exist or is not running.
    pub fn attach(
        container_id: &str,
        cwd: impl Into<PathBuf>,
        config: &EnvironmentConfig,
    ) -> Result<Self, EnvironmentError> {
        let transport = Transport::new()?;

        let mut command = Command::new(&config.executable);
        command.args(["inspect", "-f", "{{.State.Running}}", container_id]);
        let output = transport.run(command, config.timeout)?;

        let running = String::from_utf8_lossy(&output.stdout).trim() == "true";
        if !output.status.success() || !running {
            return Err(EnvironmentError::EnvironmentUnavailable(format!(
                "Container '{}' is not running: {}",
                container_id,
                truncate(String::from_utf8_lossy(&output.stderr).trim(), 500)
            )));
        }

        debug!(container = %container_id, "Attached to container");
        Ok(Self::bind(
            container_id.to_string(),
            false,
            cwd.into(),
            config,
            transport,
        ))
    }

    fn bind(
        container_id: String,
        owned: bool,
        cwd: PathBuf,
        config: &EnvironmentConfig,
        transport: Transport,
    ) -> Self {
        let mut env: Vec<(String, String)> = config
            .forward_env
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|value| (key.clone(), value)))
            .collect();
        env.extend(config.env.iter().map(|(k, v)| (k.clone(), v.clone())));

        Self {
            container_id,
            owned,
            removed: false,
            cwd,
            executable: config.executable.clone(),
            shell: config.shell.clone(),
            env,
            timeout_secs: config.timeout,
            merge_stderr: config.merge_stderr,
            transport,
        }
    }

    /// ID of the container commands run in.
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Whether this handle started the container and will remove it.
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    fn exec_args(&self, command: &str) -> Vec<String> {
        let mut args = vec![
            "exec".to_string(),
            "-w".to_string(),
            self.cwd.display().to_string(),
        ];
        for (key, value) in &self.env {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        args.push(self.container_id.clone());
        args.push(self.shell.clone());
        args.push("-lc".to_string());
        args.push(shell_script(command, self.merge_stderr).into_owned());
        args
    }
}

impl Environment for ContainerEnvironment {
    fn kind(&self) -> EnvironmentKind {
        EnvironmentKind::Container
    }

    fn cwd(&self) -> &Path {
        &self.cwd
    }

    fn execute(&self, command: &str) -> Result<ExecutionResult, EnvironmentError> {
        ensure_command(command)?;
        if self.removed {
            return Err(EnvironmentError::EnvironmentUnavailable(format!(
                "Container '{}' has been removed",
                self.container_id
            )));
        }

        let mut cmd = Command::new(&self.executable);
        cmd.args(self.exec_args(command));
        let output = self.transport.run(cmd, self.timeout_secs)?;

        let status = exit_status(&output);
        if is_runtime_failure(status, &output.stdout, &output.stderr) {
            return Err(EnvironmentError::EnvironmentUnavailable(format!(
                "Container '{}' unreachable: {}",
                self.container_id,
                truncate(String::from_utf8_lossy(&output.stderr).trim(), 500)
            )));
        }

        Ok(ExecutionResult::new(
            status,
            collect_output(&output.stdout, &output.stderr, self.merge_stderr),
        ))
    }

    fn cleanup(&mut self) -> Result<(), EnvironmentError> {
        if !self.owned || self.removed {
            return Ok(());
        }

        let mut command = Command::new(&self.executable);
        command.args(["rm", "-f", self.container_id.as_str()]);
        let output = self.transport.run(command, self.timeout_secs)?;
        self.removed = true;

        if !output.status.success() {
            return Err(EnvironmentError::EnvironmentUnavailable(format!(
                "Failed to remove container '{}': {}",
                self.container_id,
                truncate(String::from_utf8_lossy(&output.stderr).trim(), 500)
            )));
        }

        debug!(container = %self.container_id, "Container removed");
        Ok(())
    }
}

/// Ensure an owned container is removed when dropped (best-effort).
impl Drop for ContainerEnvironment {
    fn drop(&mut self) {
        if !self.owned || self.removed {
            return;
        }
        let executable = self.executable.clone();
        let id = self.container_id.clone();
        std::thread::spawn(move || {
            let _ = std::process::Command::new(executable)
                .args(["rm", "-f", id.as_str()])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
        });
    }
}

fn run_args(name: &str, cwd: &Path, image: &str, config: &EnvironmentConfig) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        name.to_string(),
        "-w".to_string(),
        cwd.display().to_string(),
    ];
    args.extend(config.run_args.iter().cloned());
    args.push(image.to_string());
    args.push("sleep".to_string());
    args.push(config.container_timeout.clone());
    args
}

/// Distinguishes a runtime CLI failure from a command that ran and failed.
///
/// The runtime must have reported the failure on stderr. Status 125 is
/// trusted even after partial output; other statuses only when nothing
/// reached stdout.
fn is_runtime_failure(status: i32, stdout: &[u8], stderr: &[u8]) -> bool {
    if status == 0 {
        return false;
    }
    let stderr = String::from_utf8_lossy(stderr);
    let stderr = stderr.trim_start();
    let reported = RUNTIME_FAILURE_MARKERS
        .iter()
        .any(|marker| stderr.starts_with(marker));
    reported && (status == RUNTIME_FAILURE_EXIT || stdout.is_empty())
}
