//! Occurrence weight aggregation errors.

use super::StorageError;

/// Errors raised by the occurrence weight aggregator.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Observation {record_id} has a zero-area footprint")]
    ZeroAreaFootprint { record_id: String },

    #[error("Unit {unit_key} has no geometry in the reference grid")]
    MissingGeometry { unit_key: String },
}
