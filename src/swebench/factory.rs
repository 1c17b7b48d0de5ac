//! Per-instance environment construction.

use std::borrow::Cow;

use tracing::debug;

use super::TaskInstance;
use crate::environment::{
    build_environment, Environment, EnvironmentConfig, EnvironmentKind,
};
use crate::error::EnvironmentError;

/// Builds the execution handle a task instance's patch is read from.
pub trait EnvironmentFactory {
    fn create(
        &self,
        config: &EnvironmentConfig,
        instance: &TaskInstance,
    ) -> Result<Box<dyn Environment>, EnvironmentError>;
}

impl<F> EnvironmentFactory for F
where
    F: Fn(&EnvironmentConfig, &TaskInstance) -> Result<Box<dyn Environment>, EnvironmentError>,
{
    fn create(
        &self,
        config: &EnvironmentConfig,
        instance: &TaskInstance,
    ) -> Result<Box<dyn Environment>, EnvironmentError> {
        self(config, instance)
    }
}

/// Environment factory for SWE-bench instances.
///
/// The kind comes from `environment_class`, falling back to the factory's
/// default kind when the configuration leaves it out. Containers without an
/// explicit `image` or `container_id` run the instance's evaluation image.
#[derive(Debug, Clone, Copy)]
pub struct SweBenchEnvironmentFactory {
    default_kind: EnvironmentKind,
}

impl SweBenchEnvironmentFactory {
    pub fn new(default_kind: EnvironmentKind) -> Self {
        Self { default_kind }
    }

    pub fn default_kind(&self) -> EnvironmentKind {
        self.default_kind
    }

    /// Resolves the kind and fills in the instance image where needed.
    pub fn instance_config<'a>(
        &self,
        config: &'a EnvironmentConfig,
        instance: &TaskInstance,
    ) -> Result<(EnvironmentKind, Cow<'a, EnvironmentConfig>), EnvironmentError> {
        let kind = match config.environment_class.as_deref() {
            Some(name) => EnvironmentKind::from_name(name)?,
            None => self.default_kind,
        };

        if kind == EnvironmentKind::Container
            && config.image.is_none()
            && config.container_id.is_none()
        {
            let mut owned = config.clone();
            owned.image = Some(instance.image());
            return Ok((kind, Cow::Owned(owned)));
        }

        Ok((kind, Cow::Borrowed(config)))
    }
}

impl Default for SweBenchEnvironmentFactory {
    fn default() -> Self {
        Self::new(EnvironmentKind::Container)
    }
}

impl EnvironmentFactory for SweBenchEnvironmentFactory {
    fn create(
        &self,
        config: &EnvironmentConfig,
        instance: &TaskInstance,
    ) -> Result<Box<dyn Environment>, EnvironmentError> {
        let (kind, config) = self.instance_config(config, instance)?;
        debug!(
            instance_id = %instance.instance_id,
            kind = %kind,
            image = ?config.image,
            "Creating environment"
        );
        build_environment(kind, None, &config)
    }
}
