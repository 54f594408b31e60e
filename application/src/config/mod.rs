//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`ExecutionParams`]: orchestration loop control (iterations, prompts)
//! - [`CatalogPolicy`]: tool catalog caching and failure policy

pub mod catalog_policy;
pub mod execution_params;

pub use catalog_policy::CatalogPolicy;
pub use execution_params::{DEFAULT_TOOL_RESULT_PREFIX, ExecutionParams};
