//! SWE-bench integration: task instances and per-instance environments.

pub mod factory;
pub mod instance;

pub use factory::{EnvironmentFactory, SweBenchEnvironmentFactory};
pub use instance::{load_instances, parse_instances, swebench_image_name, TaskInstance};
