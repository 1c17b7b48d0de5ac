//! Submission formatting.
//!
//! ```text
//! TaskInstance + BridgeConfig
//!     → ModelResolver        (model_name)
//!     → EnvironmentFactory   (execution handle for the instance)
//!     → extract_patch        (git add -A && git diff --cached)
//!     → Submission::assemble (instance_id, model_name_or_path, model_patch)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use swe_submit::config::BridgeConfig;
//! use swe_submit::submission::SubmissionBridge;
//! use swe_submit::swebench::TaskInstance;
//!
//! let config = BridgeConfig::load("config.yaml")?.with_defaults("gpt-4o", "/testbed");
//! let submission = SubmissionBridge::new()
//!     .format_submission(&TaskInstance::new("django__django-11099"), &config)?;
//! println!("{}", submission.to_json_line()?);
//! ```

pub mod bridge;
pub mod patch;
pub mod record;

pub use bridge::SubmissionBridge;
pub use patch::{extract_patch, Patch, PATCH_COMMAND};
pub use record::Submission;
