//! Opinion reconciliation errors.

use super::StorageError;

/// Errors raised by the opinion reconciler.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid opinion status {value:?} for unit {unit_key}")]
    InvalidStatus { unit_key: String, value: String },

    #[error("Opinion rank/confidence out of range for unit {unit_key}: rank={rank} confidence={confidence}")]
    ScoreOutOfRange {
        unit_key: String,
        rank: i64,
        confidence: i64,
    },
}
