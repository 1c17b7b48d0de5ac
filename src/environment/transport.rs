//! Blocking process transport shared by the environment variants.
//!
//! Each handle owns a current-thread tokio runtime so commands can be bounded
//! by a timeout and killed when it expires, while callers stay synchronous.

use std::borrow::Cow;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::runtime::{Builder, Runtime};

use crate::error::EnvironmentError;

pub(crate) struct Transport {
    runtime: Runtime,
}

impl Transport {
    pub(crate) fn new() -> Result<Self, EnvironmentError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                EnvironmentError::EnvironmentUnavailable(format!(
                    "Failed to build command runtime: {e}"
                ))
            })?;
        Ok(Self { runtime })
    }

    /// Runs `command` to completion, capturing stdout and stderr.
    ///
    /// A spawn failure maps to `EnvironmentUnavailable`; exceeding
    /// `timeout_secs` (when non-zero) kills the child and maps to
    /// `CommandTimedOut`. Non-zero exit statuses are returned as-is.
    pub(crate) fn run(
        &self,
        mut command: Command,
        timeout_secs: u64,
    ) -> Result<Output, EnvironmentError> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let program = command.as_std().get_program().to_string_lossy().into_owned();

        self.runtime.block_on(async move {
            let child = command.spawn().map_err(|e| {
                EnvironmentError::EnvironmentUnavailable(format!("Failed to spawn '{program}': {e}"))
            })?;

            let output = if timeout_secs == 0 {
                child.wait_with_output().await
            } else {
                tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output())
                    .await
                    .map_err(|_| EnvironmentError::CommandTimedOut {
                        seconds: timeout_secs,
                    })?
            };

            output.map_err(|e| {
                EnvironmentError::EnvironmentUnavailable(format!(
                    "Failed to collect output from '{program}': {e}"
                ))
            })
        })
    }
}

/// Shell script that runs `command`, redirecting its stderr into stdout when
/// `merge_stderr` is set so both streams keep their relative order.
///
/// The closing brace sits on its own line so a trailing comment or heredoc in
/// `command` cannot swallow it.
pub(crate) fn shell_script(command: &str, merge_stderr: bool) -> Cow<'_, str> {
    if merge_stderr {
        Cow::Owned(format!("{{ {command}\n}} 2>&1"))
    } else {
        Cow::Borrowed(command)
    }
}

/// Decodes captured streams into the text reported by an execution.
///
/// With `merge_stderr`, the command's own stderr already arrives on stdout
/// (see [`shell_script`]); whatever is left on `stderr` came from the process
/// wrapping the shell and is appended last. A trailing `"\r\n"` becomes
/// `"\n"`; nothing else is trimmed.
pub(crate) fn collect_output(stdout: &[u8], stderr: &[u8], merge_stderr: bool) -> String {
    let mut output = String::from_utf8_lossy(stdout).into_owned();
    if merge_stderr {
        output.push_str(&String::from_utf8_lossy(stderr));
    }
    if output.ends_with("\r\n") {
        output.truncate(output.len() - 2);
        output.push('\n');
    }
    output
}

/// Exit status of a finished process; `-1` when it was killed by a signal.
pub(crate) fn exit_status(output: &Output) -> i32 {
    output.status.code().unwrap_or(-1)
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) && end > 0 {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}
