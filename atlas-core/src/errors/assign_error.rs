//! Code assignment errors.

use super::StorageError;

/// Errors raised by the presence code assigner and the code adjuster.
#[derive(Debug, thiserror::Error)]
pub enum AssignError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Stored code {value} for unit {unit_key} is outside the 1-5 legend")]
    UnknownCode { unit_key: String, value: i64 },
}
