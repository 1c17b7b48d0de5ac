//! Execution environments for task working directories.
//!
//! An [`Environment`] is a live handle that runs shell commands in one
//! working directory and reports what they printed and how they exited. Two
//! variants exist:
//!
//! - [`LocalEnvironment`]: a directory on the host, commands run via `sh -c`
//! - [`ContainerEnvironment`]: a directory inside a container, commands run
//!   via `<runtime> exec`
//!
//! Handles are obtained from an [`EnvironmentRef`], which is either an
//! existing handle or a kind name looked up in a fixed resolution table.
//!
//! # Example
//!
//! ```ignore
//! use swe_submit::environment::{resolve_environment, EnvironmentConfig, EnvironmentRef};
//!
//! let config = EnvironmentConfig::default().with_cwd("/tmp/task");
//! let env = resolve_environment(EnvironmentRef::from("local"), None, &config)?;
//! let result = env.execute("git status --short")?;
//! println!("{} ({})", result.output, result.exit_status);
//! ```

pub mod config;
pub mod container;
pub mod local;
mod transport;

pub use config::EnvironmentConfig;
pub use container::ContainerEnvironment;
pub use local::LocalEnvironment;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EnvironmentError;

/// Outcome of running one command.
///
/// A non-zero `exit_status` is a data condition, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Process exit status; `-1` if the process was killed by a signal.
    pub exit_status: i32,
    /// Captured standard output, followed by standard error when merged.
    pub output: String,
}

impl ExecutionResult {
    pub fn new(exit_status: i32, output: impl Into<String>) -> Self {
        Self {
            exit_status,
            output: output.into(),
        }
    }

    /// Whether the command exited with status zero.
    pub fn succeeded(&self) -> bool {
        self.exit_status == 0
    }
}

/// The variant of an execution handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentKind {
    Local,
    Container,
}

/// Names accepted by [`EnvironmentKind::from_name`].
const KIND_TABLE: &[(&str, EnvironmentKind)] = &[
    ("local", EnvironmentKind::Local),
    ("docker", EnvironmentKind::Container),
];

impl EnvironmentKind {
    /// Looks up a kind by name.
    ///
    /// # Errors
    ///
    /// Returns `EnvironmentError::UnknownEnvironmentKind` for names outside
    /// the resolution table. There is no fallback kind.
    pub fn from_name(name: &str) -> Result<Self, EnvironmentError> {
        let trimmed = name.trim();
        KIND_TABLE
            .iter()
            .find(|(known, _)| *known == trimmed)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| EnvironmentError::UnknownEnvironmentKind(name.to_string()))
    }

    /// Canonical name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentKind::Local => "local",
            EnvironmentKind::Container => "docker",
        }
    }

    /// All names accepted by [`EnvironmentKind::from_name`].
    pub fn names() -> impl Iterator<Item = &'static str> {
        KIND_TABLE.iter().map(|(name, _)| *name)
    }
}

impl FromStr for EnvironmentKind {
    type Err = EnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for EnvironmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live handle that runs commands in a bound working directory.
///
/// # Panics
///
/// The provided variants drive their processes on a runtime owned by the
/// handle and block the calling thread. Calling [`Environment::execute`] or
/// [`Environment::cleanup`] on one of them from inside an async tokio context
/// panics; use `tokio::task::spawn_blocking` there.
pub trait Environment: Send {
    /// Which variant this handle is.
    fn kind(&self) -> EnvironmentKind;

    /// The working directory commands run in.
    fn cwd(&self) -> &Path;

    /// Runs `command` through a POSIX shell and waits for it to finish.
    ///
    /// # Errors
    ///
    /// Returns `EnvironmentError::EnvironmentUnavailable` when the transport
    /// cannot reach the environment and `EnvironmentError::CommandTimedOut`
    /// when the configured timeout expires. A command that runs and fails is
    /// reported through [`ExecutionResult::exit_status`].
    fn execute(&self, command: &str) -> Result<ExecutionResult, EnvironmentError>;

    /// Releases anything the handle provisioned. Idempotent.
    fn cleanup(&mut self) -> Result<(), EnvironmentError> {
        Ok(())
    }
}

/// Either a ready handle or the name of a kind to construct.
pub enum EnvironmentRef {
    Handle(Box<dyn Environment>),
    Named(String),
}

impl fmt::Debug for EnvironmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentRef::Handle(env) => f
                .debug_struct("Handle")
                .field("kind", &env.kind())
                .field("cwd", &env.cwd())
                .finish(),
            EnvironmentRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

impl From<&str> for EnvironmentRef {
    fn from(name: &str) -> Self {
        EnvironmentRef::Named(name.to_string())
    }
}

impl From<String> for EnvironmentRef {
    fn from(name: String) -> Self {
        EnvironmentRef::Named(name)
    }
}

impl From<Box<dyn Environment>> for EnvironmentRef {
    fn from(env: Box<dyn Environment>) -> Self {
        EnvironmentRef::Handle(env)
    }
}

/// Turns a reference into a ready handle.
///
/// Handles pass through untouched. Names are looked up first, then the
/// working directory is taken from `cwd` or, if absent, from `config.cwd`.
pub fn resolve_environment(
    reference: EnvironmentRef,
    cwd: Option<&Path>,
    config: &EnvironmentConfig,
) -> Result<Box<dyn Environment>, EnvironmentError> {
    match reference {
        EnvironmentRef::Handle(env) => Ok(env),
        EnvironmentRef::Named(name) => {
            let kind = EnvironmentKind::from_name(&name)?;
            build_environment(kind, cwd, config)
        }
    }
}

/// Constructs a handle of `kind`.
pub fn build_environment(
    kind: EnvironmentKind,
    cwd: Option<&Path>,
    config: &EnvironmentConfig,
) -> Result<Box<dyn Environment>, EnvironmentError> {
    let cwd = cwd
        .map(Path::to_path_buf)
        .or_else(|| config.cwd.clone())
        .ok_or(EnvironmentError::MissingWorkingDirectory)?;

    match kind {
        EnvironmentKind::Local => Ok(Box::new(LocalEnvironment::new(cwd, config)?)),
        EnvironmentKind::Container => Ok(Box::new(ContainerEnvironment::start(cwd, config)?)),
    }
}

pub(crate) fn ensure_command(command: &str) -> Result<(), EnvironmentError> {
    if command.trim().is_empty() {
        return Err(EnvironmentError::EmptyCommand);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_name_resolves_to_its_kind() {
        for name in EnvironmentKind::names() {
            let kind = EnvironmentKind::from_name(name).expect("known name");
            assert_eq!(kind.as_str(), name);
        }
        assert_eq!(
            EnvironmentKind::from_name("local").expect("local"),
            EnvironmentKind::Local
        );
        assert_eq!(
            "docker".parse::<EnvironmentKind>().expect("docker"),
            EnvironmentKind::Container
        );
    }

    #[test]
    fn test_unknown_names_do_not_fall_back() {
        for name in ["", "Local", "DOCKER", "container", "podman", "singularity"] {
            match EnvironmentKind::from_name(name) {
                Err(EnvironmentError::UnknownEnvironmentKind(got)) => assert_eq!(got, name),
                other => panic!("expected UnknownEnvironmentKind for {name:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_resolve_local_by_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = EnvironmentConfig::default().with_cwd(dir.path());

        let env = resolve_environment("local".into(), None, &config).expect("resolve");
        assert_eq!(env.kind(), EnvironmentKind::Local);
        assert_eq!(env.cwd(), dir.path());
    }

    #[test]
    fn test_explicit_cwd_wins_over_config() {
        let configured = tempfile::tempdir().expect("tempdir");
        let explicit = tempfile::tempdir().expect("tempdir");
        let config = EnvironmentConfig::default().with_cwd(configured.path());

        let env = resolve_environment("local".into(), Some(explicit.path()), &config)
            .expect("resolve");
        assert_eq!(env.cwd(), explicit.path());
    }

    #[test]
    fn test_resolve_unknown_name_fails_before_cwd_check() {
        let result = resolve_environment("vm".into(), None, &EnvironmentConfig::default());
        assert!(matches!(
            result,
            Err(EnvironmentError::UnknownEnvironmentKind(_))
        ));
    }

    #[test]
    fn test_missing_working_directory() {
        let result = resolve_environment("local".into(), None, &EnvironmentConfig::default());
        assert!(matches!(
            result,
            Err(EnvironmentError::MissingWorkingDirectory)
        ));
    }

    #[test]
    fn test_handle_passes_through() {
        let dir = tempfile::tempdir().expect("tempdir");
        let handle: Box<dyn Environment> = Box::new(
            LocalEnvironment::new(dir.path(), &EnvironmentConfig::default()).expect("local"),
        );

        let reference = EnvironmentRef::from(handle);
        assert!(format!("{reference:?}").starts_with("Handle"));

        let env = resolve_environment(reference, None, &EnvironmentConfig::default())
            .expect("resolve");
        assert_eq!(env.kind(), EnvironmentKind::Local);
        assert_eq!(env.cwd(), dir.path());
    }

    #[test]
    fn test_execution_result() {
        let ok = ExecutionResult::new(0, "done\n");
        let failed = ExecutionResult::new(128, "fatal: not a git repository\n");
        assert!(ok.succeeded());
        assert!(!failed.succeeded());
        assert_eq!(
            serde_json::to_value(&failed).expect("serialize"),
            serde_json::json!({"exit_status": 128, "output": "fatal: not a git repository\n"})
        );
    }
}
