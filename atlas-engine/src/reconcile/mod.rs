//! Opinion reconciliation — from raw expert records to the adjusted table.

pub mod adjust;
pub mod cleanup;

use atlas_core::errors::{ReconcileError, StorageError};
use atlas_core::types::{
    AdjustedOpinion, EvidenceCategory, Opinion, PeriodIndex, TimePeriod,
};
use atlas_storage::connection::writer::with_immediate_transaction;
use atlas_storage::queries::{evidence, opinions, units};
use atlas_storage::DatabaseManager;

/// Outcome of one reconciliation run: how many adjusted records were written
/// and which categories had to be skipped.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub adjusted_written: usize,
    pub skipped: Vec<(EvidenceCategory, ReconcileError)>,
}

/// Reconciles raw opinions into one adjusted record per (unit, year,
/// category) and writes the result back, replacing the recomputed span.
pub struct OpinionReconciler<'a> {
    manager: &'a DatabaseManager,
}

impl<'a> OpinionReconciler<'a> {
    pub fn new(manager: &'a DatabaseManager) -> Self {
        Self { manager }
    }

    /// Run cleanup and cross-category adjustment for all opinions with years
    /// in the inclusive span. A category whose records fail validation is
    /// skipped and reported; the other categories still commit.
    pub fn reconcile_span(
        &self,
        min_year: i32,
        max_year: i32,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let raw = self
            .manager
            .with_reader(|conn| opinions::raw_in_span(conn, min_year, max_year))?;

        let mut outcome = ReconcileOutcome::default();
        let mut canonical: Vec<Opinion> = Vec::new();

        for category in EvidenceCategory::ALL {
            let records: Vec<Opinion> = raw
                .iter()
                .filter(|r| r.category == category)
                .cloned()
                .collect();
            if records.is_empty() {
                continue;
            }
            match validate(&records) {
                Ok(()) => canonical.extend(cleanup::cleanup(records)),
                Err(error) => {
                    tracing::warn!(
                        category = %category,
                        error = %error,
                        "skipping category during reconciliation"
                    );
                    outcome.skipped.push((category, error));
                }
            }
        }

        let adjusted = adjust::adjust(&canonical);

        outcome.adjusted_written = self.manager.with_writer(|conn| {
            with_immediate_transaction(conn, |tx| {
                opinions::replace_adjusted_span(tx, min_year, max_year, &adjusted)
            })
        })?;

        tracing::info!(
            records = outcome.adjusted_written,
            skipped = outcome.skipped.len(),
            "reconciled opinions for {min_year}-{max_year}"
        );
        Ok(outcome)
    }

    /// Project the reconciled opinions into the evidence rows of one
    /// (category, period): the most recent adjusted opinion inside the
    /// period window becomes the row's opinion status and weight. Units
    /// referenced only by opinions are appended to the store.
    pub fn project_period(
        &self,
        category: EvidenceCategory,
        period_index: PeriodIndex,
        period: TimePeriod,
    ) -> Result<usize, ReconcileError> {
        let latest: Vec<AdjustedOpinion> = self.manager.with_reader(|conn| {
            opinions::latest_adjusted_in_window(
                conn,
                category,
                period.start_year,
                period.end_year,
            )
        })?;

        if latest.is_empty() {
            return Ok(0);
        }

        let count = self.manager.with_writer(|conn| {
            with_immediate_transaction(conn, |tx| {
                let mut written = 0;
                for record in &latest {
                    units::ensure_unit(tx, &record.unit_key)?;
                    evidence::set_opinion(
                        tx,
                        &record.unit_key,
                        category,
                        period_index,
                        record.status,
                        record.weight,
                    )?;
                    written += 1;
                }
                Ok::<usize, StorageError>(written)
            })
        })?;
        Ok(count)
    }
}

/// Reject records whose rank or confidence fall outside the 1-10 scales.
fn validate(records: &[Opinion]) -> Result<(), ReconcileError> {
    for record in records {
        if !(1..=10).contains(&record.rank) || !(1..=10).contains(&record.confidence) {
            return Err(ReconcileError::ScoreOutOfRange {
                unit_key: record.unit_key.clone(),
                rank: record.rank,
                confidence: record.confidence,
            });
        }
    }
    Ok(())
}
