//! The submission record handed to the benchmark.

use serde::{Deserialize, Serialize};

/// A task identifier, the model that worked on it, and the patch it produced.
///
/// Fields are fixed at assembly. Serialization emits the benchmark's
/// prediction shape: `instance_id`, `model_name_or_path`, `model_patch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    instance_id: String,
    #[serde(rename = "model_name_or_path")]
    model_name: String,
    model_patch: String,
}

impl Submission {
    /// Combines the three parts into a record. Cannot fail.
    pub fn assemble(
        instance_id: impl Into<String>,
        model_name: impl Into<String>,
        model_patch: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            model_name: model_name.into(),
            model_patch: model_patch.into(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Unified diff text, or empty when nothing changed.
    pub fn model_patch(&self) -> &str {
        &self.model_patch
    }

    /// One line of a predictions JSONL file.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Output keys paired with their values, in submission order.
    pub fn rows(&self) -> [(&'static str, &str); 3] {
        [
            ("instance_id", self.instance_id.as_str()),
            ("model_name_or_path", self.model_name.as_str()),
            ("model_patch", self.model_patch.as_str()),
        ]
    }
}
