//! Command-line interface for swe-submit.
//!
//! Provides commands for formatting submissions and inspecting the
//! per-instance environment images.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli};
