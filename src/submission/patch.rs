//! Patch extraction from a task working directory.

use crate::environment::Environment;
use crate::error::EnvironmentError;

/// Stages every working-tree change, then diffs the index.
///
/// Staging first makes newly created files show up; a plain `git diff`
/// leaves untracked files out.
pub const PATCH_COMMAND: &str = "git add -A && git diff --cached";

/// Diff text produced by [`extract_patch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Output of [`PATCH_COMMAND`], verbatim.
    pub text: String,
    /// Exit status of [`PATCH_COMMAND`]. Non-zero (for example, no git
    /// repository in the working directory) still carries whatever output
    /// was captured in `text`.
    pub exit_status: i32,
}

impl Patch {
    /// Whether the patch holds no changes (whitespace-only counts as empty).
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Whether the diff command exited with status zero.
    pub fn succeeded(&self) -> bool {
        self.exit_status == 0
    }

    /// Paths of the files the patch touches, one per `diff --git` section,
    /// in order.
    ///
    /// The post-image path is used: `+++ b/<path>`, then `rename to` or
    /// `copy to`, then `--- a/<path>` for deletions, and finally the header
    /// itself. C-style quoted names are unquoted.
    pub fn touched_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        let mut lines = self.text.lines().peekable();

        while let Some(line) = lines.next() {
            let Some(header) = line.strip_prefix("diff --git ") else {
                continue;
            };

            let mut new_path = None;
            let mut moved_to = None;
            let mut old_path = None;
            while let Some(next) = lines.next_if(|l| !l.starts_with("diff --git ")) {
                if next.starts_with("@@") {
                    break;
                }
                if let Some(raw) = next.strip_prefix("+++ ") {
                    new_path = diff_path(raw, "b/");
                } else if let Some(raw) = next.strip_prefix("--- ") {
                    old_path = diff_path(raw, "a/");
                } else if let Some(raw) = next
                    .strip_prefix("rename to ")
                    .or_else(|| next.strip_prefix("copy to "))
                {
                    moved_to = diff_path(raw, "");
                }
            }

            if let Some(path) = new_path
                .or(moved_to)
                .or(old_path)
                .or_else(|| header_path(header))
            {
                files.push(path);
            }
        }

        files
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Runs [`PATCH_COMMAND`] in `env` and returns its output as the patch.
///
/// # Errors
///
/// Transport errors from the environment propagate unchanged. A failing
/// diff command is not an error.
pub fn extract_patch(env: &dyn Environment) -> Result<Patch, EnvironmentError> {
    let result = env.execute(PATCH_COMMAND)?;
    Ok(Patch {
        text: result.output,
        exit_status: result.exit_status,
    })
}

/// Post-image path from the text after `diff --git `.
fn header_path(header: &str) -> Option<String> {
    if header.starts_with('"') {
        let (_, rest) = unquote(header)?;
        return diff_path(rest.strip_prefix(' ')?, "b/");
    }
    // An unquoted pre-image name never contains a quote.
    if let Some(at) = header.find(" \"") {
        return diff_path(&header[at + 1..], "b/");
    }

    // "a/<p> b/<p>": both halves name the same file unless it was renamed.
    if header.len() >= 5 && (header.len() - 5) % 2 == 0 {
        let mid = (header.len() - 1) / 2;
        if let (Some(a), Some(b)) = (header.get(..mid), header.get(mid + 1..)) {
            if header.as_bytes()[mid] == b' ' {
                if let (Some(a), Some(b)) = (a.strip_prefix("a/"), b.strip_prefix("b/")) {
                    if a == b {
                        return Some(b.to_string());
                    }
                }
            }
        }
    }

    header
        .rsplit_once(" b/")
        .map(|(_, path)| path.to_string())
}

/// Strips `prefix` from a possibly quoted path; `/dev/null` yields nothing.
fn diff_path(raw: &str, prefix: &str) -> Option<String> {
    let raw = raw.trim_end_matches('\t');
    if raw == "/dev/null" {
        return None;
    }
    let path = if raw.starts_with('"') {
        unquote(raw)?.0
    } else {
        raw.to_string()
    };
    path.strip_prefix(prefix).map(str::to_string)
}

/// Decodes a C-style quoted name, returning it and the text after the
/// closing quote.
fn unquote(quoted: &str) -> Option<(String, &str)> {
    let body = quoted.strip_prefix('"')?;
    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                return Some((String::from_utf8_lossy(&out).into_owned(), &body[i + 1..]));
            }
            b'\\' => {
                let escape = *bytes.get(i + 1)?;
                if escape.is_ascii_digit() {
                    let digits = bytes.get(i + 1..i + 4)?;
                    let mut value: u32 = 0;
                    for digit in digits {
                        if !(b'0'..=b'7').contains(digit) {
                            return None;
                        }
                        value = value * 8 + u32::from(digit - b'0');
                    }
                    out.push(u8::try_from(value).ok()?);
                    i += 4;
                    continue;
                }
                out.push(match escape {
                    b'a' => 0x07,
                    b'b' => 0x08,
                    b't' => b'\t',
                    b'n' => b'\n',
                    b'v' => 0x0b,
                    b'f' => 0x0c,
                    b'r' => b'\r',
                    b'"' => b'"',
                    b'\\' => b'\\',
                    _ => return None,
                });
                i += 2;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }

    None
}
