//! Model identity resolution.
//!
//! The bridge never talks to a model provider. It only needs the name the
//! model is submitted under, which it reads from the `model` section of the
//! configuration through a [`ModelResolver`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SubmissionError;

/// The `model` section of the bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Provider settings used by other collaborators (`model_kwargs`, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl ModelConfig {
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = Some(name.into());
        self
    }
}

/// Identity metadata of the model that produced a patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    model_name: String,
}

impl ResolvedModel {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn into_model_name(self) -> String {
        self.model_name
    }
}

/// Produces a model identity from the `model` configuration section.
pub trait ModelResolver {
    fn resolve(&self, config: &ModelConfig) -> Result<ResolvedModel, SubmissionError>;
}

/// Reads `model_name` straight from the configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfiguredModelResolver;

impl ModelResolver for ConfiguredModelResolver {
    fn resolve(&self, config: &ModelConfig) -> Result<ResolvedModel, SubmissionError> {
        config
            .model_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .map(ResolvedModel::new)
            .ok_or(SubmissionError::MissingModelName)
    }
}
