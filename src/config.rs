//! Bridge configuration file.
//!
//! A YAML document with a `model` section and an `environment` section.
//! Other top-level sections (agent settings and the like) belong to other
//! tools sharing the file and are carried through untouched.
//!
//! ```yaml
//! model:
//!   model_name: gpt-4o
//! environment:
//!   environment_class: docker
//!   cwd: /testbed
//!   timeout: 60
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentConfig;
use crate::error::ConfigError;
use crate::model::ModelConfig;

/// Parsed bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl BridgeConfig {
    /// Parses a YAML document. An empty document yields the default config.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads and parses a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Fills `model.model_name` and `environment.cwd` when the file left them out.
    pub fn with_defaults(mut self, model_name: &str, cwd: impl Into<PathBuf>) -> Self {
        if self.model.model_name.is_none() {
            self.model.model_name = Some(model_name.to_string());
        }
        if self.environment.cwd.is_none() {
            self.environment.cwd = Some(cwd.into());
        }
        self
    }
}
