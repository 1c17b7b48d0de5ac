//! End-to-end submission formatting for one task instance.

use tracing::warn;

use super::patch::extract_patch;
use super::record::Submission;
use crate::config::BridgeConfig;
use crate::error::SubmissionError;
use crate::model::{ConfiguredModelResolver, ModelResolver};
use crate::swebench::{EnvironmentFactory, SweBenchEnvironmentFactory, TaskInstance};

/// Formats submissions: resolve the model, build the environment, read the
/// patch, assemble the record.
#[derive(Debug, Clone, Default)]
pub struct SubmissionBridge<F = SweBenchEnvironmentFactory, M = ConfiguredModelResolver> {
    factory: F,
    resolver: M,
}

impl SubmissionBridge {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F, M> SubmissionBridge<F, M>
where
    F: EnvironmentFactory,
    M: ModelResolver,
{
    pub fn with_parts(factory: F, resolver: M) -> Self {
        Self { factory, resolver }
    }

    /// Produces the submission for `instance`.
    ///
    /// Any error from model resolution, environment construction, or patch
    /// extraction aborts this instance and is returned unchanged; no record
    /// is assembled. Environments the factory provisioned are released before
    /// returning.
    pub fn format_submission(
        &self,
        instance: &TaskInstance,
        config: &BridgeConfig,
    ) -> Result<Submission, SubmissionError> {
        let model = self.resolver.resolve(&config.model)?;
        let mut env = self.factory.create(&config.environment, instance)?;

        let patch = extract_patch(env.as_ref());
        if let Err(e) = env.cleanup() {
            warn!(
                instance_id = %instance.instance_id,
                error = %e,
                "Failed to release environment"
            );
        }
        let patch = patch?;

        Ok(Submission::assemble(
            instance.instance_id.clone(),
            model.into_model_name(),
            patch.into_text(),
        ))
    }
}
