//! Error handling for the atlas compiler.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod aggregate_error;
pub mod assign_error;
pub mod config_error;
pub mod pipeline_error;
pub mod reconcile_error;
pub mod storage_error;

pub use aggregate_error::AggregateError;
pub use assign_error::AssignError;
pub use config_error::ConfigError;
pub use pipeline_error::{PipelineError, PipelineResult, StageError};
pub use reconcile_error::ReconcileError;
pub use storage_error::StorageError;
