//! Error types for swe-submit operations.
//!
//! Defines the error types for each subsystem:
//! - Environment resolution and command transport
//! - Configuration and task instance loading
//! - Submission formatting
//!
//! A command that runs and exits with a non-zero status is *not* an error;
//! it is reported through [`crate::environment::ExecutionResult`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving an environment or running a command in it.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("Unknown environment kind '{0}': expected one of 'local', 'docker'")]
    UnknownEnvironmentKind(String),

    #[error("Environment unavailable: {0}")]
    EnvironmentUnavailable(String),

    #[error("No working directory configured for the environment")]
    MissingWorkingDirectory,

    #[error("Working directory '{}' does not exist or is not a directory", .0.display())]
    WorkingDirectoryNotFound(PathBuf),

    #[error("No container image configured and no container id to attach to")]
    MissingImage,

    #[error("Command timed out after {seconds} seconds")]
    CommandTimedOut { seconds: u64 },

    #[error("Refusing to execute an empty command")]
    EmptyCommand,
}

/// Errors that can occur while loading configuration or task instances.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid task instance on line {line}: {message}")]
    InvalidInstance { line: usize, message: String },

    #[error("No task instances found in '{}'", .0.display())]
    NoInstances(PathBuf),
}

/// Errors that can occur while formatting a submission.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error("Model configuration has no 'model_name'")]
    MissingModelName,
}
