//! swe-submit: SWE-bench submission formatting.
//!
//! This library runs a fixed stage-then-diff command in a task's working
//! directory (on the host or inside a container), takes the resulting patch
//! and packages it with the model identity as a prediction record.

// Core modules
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod model;
pub mod submission;
pub mod swebench;

// Re-export commonly used types
pub use config::BridgeConfig;
pub use environment::{Environment, EnvironmentKind, EnvironmentRef, ExecutionResult};
pub use error::{ConfigError, EnvironmentError, SubmissionError};
pub use submission::{Submission, SubmissionBridge};
pub use swebench::TaskInstance;
