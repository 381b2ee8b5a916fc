//! Event payload types for the compile lifecycle events.

use crate::types::{Era, EvidenceCategory, PeriodIndex};

/// Payload for `on_run_started`.
#[derive(Debug, Clone)]
pub struct RunStartedEvent {
    pub categories: Vec<EvidenceCategory>,
    pub period_count: usize,
}

/// Payload for `on_run_completed`.
#[derive(Debug, Clone)]
pub struct RunCompletedEvent {
    pub stage_error_count: usize,
    pub duration_ms: u64,
}

/// Payload for `on_stage_completed`.
#[derive(Debug, Clone)]
pub struct StageCompletedEvent {
    pub stage: &'static str,
    pub category: Option<EvidenceCategory>,
    pub period: Option<PeriodIndex>,
    pub era: Option<Era>,
}

/// Payload for `on_stage_failed`.
#[derive(Debug, Clone)]
pub struct StageFailedEvent {
    pub stage: &'static str,
    pub category: Option<EvidenceCategory>,
    pub period: Option<PeriodIndex>,
    pub era: Option<Era>,
    pub message: String,
}

/// Payload for `on_category_compiled`.
#[derive(Debug, Clone)]
pub struct CategoryCompiledEvent {
    pub category: EvidenceCategory,
    pub units_coded: usize,
    pub extralimital_flags: usize,
}
