//! The compile event handler trait.

use super::types::*;

/// Receiver for compile lifecycle events.
///
/// All methods default to no-ops so handlers implement only what they need.
pub trait CompileEventHandler: Send + Sync {
    fn on_run_started(&self, _event: &RunStartedEvent) {}
    fn on_run_completed(&self, _event: &RunCompletedEvent) {}
    fn on_stage_completed(&self, _event: &StageCompletedEvent) {}
    fn on_stage_failed(&self, _event: &StageFailedEvent) {}
    fn on_category_compiled(&self, _event: &CategoryCompiledEvent) {}
}
