//! Pipeline errors and non-fatal error collection.

use crate::types::{Era, EvidenceCategory, PeriodIndex};

use super::{AggregateError, AssignError, ConfigError, ReconcileError, StorageError};

/// Errors that can occur during pipeline execution.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Aggregate error: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("Assign error: {0}")]
    Assign(#[from] AssignError),
}

/// A stage failure with the context needed to locate it: stage name plus the
/// (category, period, era) coordinates the stage was running under.
#[derive(Debug)]
pub struct StageError {
    pub stage: &'static str,
    pub category: Option<EvidenceCategory>,
    pub period: Option<PeriodIndex>,
    pub era: Option<Era>,
    pub error: PipelineError,
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.stage)?;
        if let Some(cat) = self.category {
            write!(f, " [{cat}]")?;
        }
        if let Some(period) = self.period {
            write!(f, " period {period}")?;
        }
        if let Some(era) = self.era {
            write!(f, " ({era})")?;
        }
        write!(f, ": {}", self.error)
    }
}

/// Result of a pipeline run that accumulates non-fatal stage errors.
/// Allows partial results to be returned even when some stages fail.
#[derive(Debug, Default)]
pub struct PipelineResult<T: Default = ()> {
    /// The successful result data.
    pub data: T,
    /// Non-fatal stage errors collected during the run.
    pub errors: Vec<StageError>,
}

impl<T: Default> PipelineResult<T> {
    /// Create a new pipeline result with the given data.
    pub fn new(data: T) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    /// Add a non-fatal stage error to the result.
    pub fn add_error(&mut self, error: StageError) {
        self.errors.push(error);
    }

    /// Returns true if there are no non-fatal errors.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of non-fatal errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_display_carries_context() {
        let err = StageError {
            stage: "aggregate",
            category: Some(EvidenceCategory::Summer),
            period: Some(2),
            era: Some(Era::Recent),
            error: PipelineError::Storage(StorageError::BatchChannelClosed),
        };
        let text = err.to_string();
        assert!(text.contains("aggregate"));
        assert!(text.contains("summer"));
        assert!(text.contains("period 2"));
        assert!(text.contains("recent"));
    }

    #[test]
    fn pipeline_result_accumulates() {
        let mut result: PipelineResult<u32> = PipelineResult::new(7);
        assert!(result.is_clean());
        result.add_error(StageError {
            stage: "reconcile",
            category: None,
            period: None,
            era: None,
            error: PipelineError::Storage(StorageError::BatchChannelClosed),
        });
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.data, 7);
    }
}
