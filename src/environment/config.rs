//! Configuration for execution environments.
//!
//! Mirrors the `environment` section of the bridge configuration file. The
//! same section is read by other collaborators, so unrecognized keys are kept
//! in [`EnvironmentConfig::extra`] instead of being rejected.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default per-command timeout in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Default timeout for starting a container (which may pull the image).
pub const DEFAULT_PULL_TIMEOUT_SECS: u64 = 120;

/// Default container runtime executable.
pub const DEFAULT_EXECUTABLE: &str = "docker";

/// Default lifetime handed to the idle keep-alive process of a started container.
pub const DEFAULT_CONTAINER_TIMEOUT: &str = "2h";

/// Default shell used for commands inside a container.
pub const DEFAULT_CONTAINER_SHELL: &str = "bash";

/// Settings consumed by the environment provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Environment kind name (`local` or `docker`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_class: Option<String>,
    /// Working directory commands run in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Variables set for every command.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Host variables forwarded into the container for every command.
    #[serde(default)]
    pub forward_env: Vec<String>,
    /// Per-command timeout in seconds; `0` disables the limit.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Append standard error to the captured output.
    #[serde(default = "default_merge_stderr")]
    pub merge_stderr: bool,
    /// Image to start a container from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Attach to this running container instead of starting one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    /// Container runtime CLI (`docker`, `podman`, ...).
    #[serde(default = "default_executable")]
    pub executable: String,
    /// Extra arguments for `<executable> run`.
    #[serde(default = "default_run_args")]
    pub run_args: Vec<String>,
    /// Argument to `sleep` for the container's keep-alive process.
    #[serde(default = "default_container_timeout")]
    pub container_timeout: String,
    /// Timeout in seconds for starting the container.
    #[serde(default = "default_pull_timeout")]
    pub pull_timeout: u64,
    /// Shell used to interpret commands inside the container.
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Keys owned by other collaborators.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn default_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

fn default_merge_stderr() -> bool {
    true
}

fn default_executable() -> String {
    DEFAULT_EXECUTABLE.to_string()
}

fn default_run_args() -> Vec<String> {
    vec!["--rm".to_string()]
}

fn default_container_timeout() -> String {
    DEFAULT_CONTAINER_TIMEOUT.to_string()
}

fn default_pull_timeout() -> u64 {
    DEFAULT_PULL_TIMEOUT_SECS
}

fn default_shell() -> String {
    DEFAULT_CONTAINER_SHELL.to_string()
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment_class: None,
            cwd: None,
            env: BTreeMap::new(),
            forward_env: Vec::new(),
            timeout: default_timeout(),
            merge_stderr: default_merge_stderr(),
            image: None,
            container_id: None,
            executable: default_executable(),
            run_args: default_run_args(),
            container_timeout: default_container_timeout(),
            pull_timeout: default_pull_timeout(),
            shell: default_shell(),
            extra: BTreeMap::new(),
        }
    }
}

impl EnvironmentConfig {
    /// Sets the environment kind name.
    pub fn with_environment_class(mut self, name: impl Into<String>) -> Self {
        self.environment_class = Some(name.into());
        self
    }

    /// Sets the working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Adds a variable set for every command.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets the per-command timeout in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Controls whether standard error is appended to the output.
    pub fn with_merge_stderr(mut self, merge: bool) -> Self {
        self.merge_stderr = merge;
        self
    }

    /// Sets the image to start a container from.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Attaches to an existing container instead of starting one.
    pub fn with_container_id(mut self, id: impl Into<String>) -> Self {
        self.container_id = Some(id.into());
        self
    }

    /// Sets the container runtime executable.
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config: EnvironmentConfig = serde_yaml::from_str("{}").expect("parse");
        assert_eq!(config, EnvironmentConfig::default());
        assert_eq!(config.timeout, 30);
        assert!(config.merge_stderr);
        assert_eq!(config.executable, "docker");
        assert_eq!(config.run_args, vec!["--rm".to_string()]);
        assert_eq!(config.container_timeout, "2h");
        assert_eq!(config.shell, "bash");
    }

    #[test]
    fn test_unknown_keys_are_kept() {
        let yaml = r#"
environment_class: docker
cwd: /testbed
image: python:3.11-slim
env:
  PAGER: cat
interpreter: ["bash", "-lc"]
"#;
        let config: EnvironmentConfig = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(config.environment_class.as_deref(), Some("docker"));
        assert_eq!(config.cwd, Some(PathBuf::from("/testbed")));
        assert_eq!(config.env.get("PAGER").map(String::as_str), Some("cat"));
        assert!(config.extra.contains_key("interpreter"));
    }

    #[test]
    fn test_builder() {
        let config = EnvironmentConfig::default()
            .with_environment_class("local")
            .with_cwd("/tmp/work")
            .with_env("LANG", "C")
            .with_timeout(5)
            .with_merge_stderr(false)
            .with_executable("podman");

        assert_eq!(config.environment_class.as_deref(), Some("local"));
        assert_eq!(config.cwd, Some(PathBuf::from("/tmp/work")));
        assert_eq!(config.env.len(), 1);
        assert_eq!(config.timeout, 5);
        assert!(!config.merge_stderr);
        assert_eq!(config.executable, "podman");
    }
}
