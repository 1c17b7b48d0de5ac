//! SWE-bench task instances.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Registry prefix of the prebuilt SWE-bench evaluation images.
const SWEBENCH_IMAGE_PREFIX: &str = "docker.io/swebench/sweb.eval.x86_64";

/// One benchmark task.
///
/// Only `instance_id` (and `image_name`, when present) are read here; the
/// remaining dataset fields are kept for other collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    pub instance_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TaskInstance {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            image_name: None,
            fields: Map::new(),
        }
    }

    /// Looks up a dataset field such as `problem_statement`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The image this instance runs in: `image_name` if set, otherwise the
    /// SWE-bench evaluation image derived from the instance id.
    pub fn image(&self) -> String {
        self.image_name
            .clone()
            .unwrap_or_else(|| swebench_image_name(&self.instance_id))
    }
}

/// Name of the prebuilt SWE-bench evaluation image for an instance.
///
/// Docker repository names cannot contain `__`, so the separator between
/// owner and repository is rewritten to `_1776_` and the name lowercased.
pub fn swebench_image_name(instance_id: &str) -> String {
    let id = instance_id.replace("__", "_1776_");
    format!("{SWEBENCH_IMAGE_PREFIX}.{id}:latest").to_lowercase()
}

/// Loads task instances from a JSON object, a JSON array, or JSON Lines.
pub fn load_instances(path: impl AsRef<Path>) -> Result<Vec<TaskInstance>, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let instances = parse_instances(&content)?;
    if instances.is_empty() {
        return Err(ConfigError::NoInstances(path.to_path_buf()));
    }
    Ok(instances)
}

/// Parses task instances from text; see [`load_instances`].
pub fn parse_instances(content: &str) -> Result<Vec<TaskInstance>, ConfigError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    if let Ok(instance) = serde_json::from_str::<TaskInstance>(trimmed) {
        return Ok(vec![instance]);
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| ConfigError::InvalidInstance {
                line: idx + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swebench_image_name() {
        assert_eq!(
            swebench_image_name("django__django-11099"),
            "docker.io/swebench/sweb.eval.x86_64.django_1776_django-11099:latest"
        );
        assert_eq!(
            swebench_image_name("Repo__Issue-123"),
            "docker.io/swebench/sweb.eval.x86_64.repo_1776_issue-123:latest"
        );
    }

    #[test]
    fn test_explicit_image_name_wins() {
        let mut instance = TaskInstance::new("repo__issue-123");
        assert!(instance.image().ends_with("repo_1776_issue-123:latest"));

        instance.image_name = Some("ghcr.io/acme/task:1".to_string());
        assert_eq!(instance.image(), "ghcr.io/acme/task:1");
    }

    #[test]
    fn test_extra_fields_are_kept() {
        let instance: TaskInstance = serde_json::from_str(
            r#"{"instance_id": "repo__issue-123", "problem_statement": "Fix it", "repo": "acme/repo"}"#,
        )
        .expect("parse");
        assert_eq!(instance.instance_id, "repo__issue-123");
        assert_eq!(
            instance.field("problem_statement"),
            Some(&Value::String("Fix it".to_string()))
        );
        assert!(instance.image_name.is_none());
    }

    #[test]
    fn test_parse_single_pretty_object() {
        let instances = parse_instances("{\n  \"instance_id\": \"a__b-1\"\n}\n").expect("parse");
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].instance_id, "a__b-1");
    }

    #[test]
    fn test_parse_array_and_lines() {
        let array = parse_instances(r#"[{"instance_id": "a"}, {"instance_id": "b"}]"#)
            .expect("parse array");
        assert_eq!(array.len(), 2);

        let lines = parse_instances("{\"instance_id\": \"a\"}\n\n{\"instance_id\": \"b\"}\n")
            .expect("parse lines");
        assert_eq!(
            lines.iter().map(|i| i.instance_id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_parse_reports_bad_line() {
        let result = parse_instances("{\"instance_id\": \"a\"}\n{\"problem_statement\": \"x\"}\n");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidInstance { line: 2, .. })
        ));
    }

    #[test]
    fn test_load_empty_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("instances.jsonl");
        std::fs::write(&path, "\n").expect("write");
        assert!(matches!(
            load_instances(&path),
            Err(ConfigError::NoInstances(_))
        ));
    }
}
