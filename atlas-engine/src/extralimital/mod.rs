//! Extralimital detection — flagging isolated single-period documentation.
//!
//! A unit coded present whose documentation happened in exactly one period
//! and whose centroid sits farther than the cutoff from every stable present
//! unit is suspected to record a stray individual, not established presence.
//! Polygons are reduced to centroids for the distance test, so the whole
//! assessment is approximate.

use atlas_core::errors::AssignError;
use atlas_core::types::{EvidenceCategory, PeriodIndex, Point};
use atlas_storage::connection::writer::with_immediate_transaction;
use atlas_storage::queries::{evidence, units};
use atlas_storage::DatabaseManager;
use rustc_hash::{FxHashMap, FxHashSet};

/// Detects and flags extralimital units per (category, period).
pub struct ExtralimitalDetector<'a> {
    manager: &'a DatabaseManager,
    cutoff_m: f64,
}

impl<'a> ExtralimitalDetector<'a> {
    pub fn new(manager: &'a DatabaseManager, cutoff_m: f64) -> Self {
        Self { manager, cutoff_m }
    }

    /// Flag extralimital units for one (category, period). Returns the
    /// number of units flagged. With fewer than 2 candidates or fewer than
    /// 2 stable present units, no flags are produced — the nearest-neighbor
    /// search is undefined there, and that is a defined empty result.
    pub fn flag_period(
        &self,
        category: EvidenceCategory,
        period: PeriodIndex,
    ) -> Result<usize, AssignError> {
        // Flags from a previous run are recomputed, not accumulated.
        self.manager.with_writer(|conn| {
            evidence::clear_extralimital_for_period(conn, category, period)
        })?;

        let rows = self
            .manager
            .with_reader(|conn| evidence::rows_for_period(conn, category, period))?;

        let present: Vec<String> = rows
            .iter()
            .filter(|r| r.presence_code.map(|c| c.is_present()).unwrap_or(false))
            .map(|r| r.unit_key.clone())
            .collect();

        let documented_counts: FxHashMap<String, i64> = self
            .manager
            .with_reader(|conn| evidence::documented_period_counts(conn, category))?
            .into_iter()
            .collect();

        // Candidates: present units documented in exactly one period total.
        let candidate_set: FxHashSet<&String> = present
            .iter()
            .filter(|unit| documented_counts.get(*unit).copied().unwrap_or(0) == 1)
            .collect();
        let stable: Vec<String> = present
            .iter()
            .filter(|unit| !candidate_set.contains(unit))
            .cloned()
            .collect();
        let candidates: Vec<String> = candidate_set.into_iter().cloned().collect();

        if candidates.len() < 2 || stable.len() < 2 {
            tracing::debug!(
                category = %category,
                period,
                candidates = candidates.len(),
                stable = stable.len(),
                "too few units for extralimital detection"
            );
            return Ok(0);
        }

        let candidate_points = self
            .manager
            .with_reader(|conn| units::centroids_for(conn, &candidates))?;
        let stable_points: Vec<(String, Point)> = self
            .manager
            .with_reader(|conn| units::centroids_for(conn, &stable))?;

        if stable_points.len() < 2 || candidate_points.len() < 2 {
            return Ok(0);
        }

        let mut flagged: Vec<String> = Vec::new();
        for (unit_key, point) in &candidate_points {
            let nearest = stable_points
                .iter()
                .map(|(_, stable_point)| point.distance(stable_point))
                .fold(f64::INFINITY, f64::min);
            if nearest > self.cutoff_m {
                flagged.push(unit_key.clone());
            }
        }

        self.manager.with_writer(|conn| {
            with_immediate_transaction(conn, |tx| {
                for unit_key in &flagged {
                    evidence::set_extralimital(tx, unit_key, category, period, true)?;
                }
                Ok(())
            })
        })?;

        if !flagged.is_empty() {
            tracing::info!(
                category = %category,
                period,
                flagged = flagged.len(),
                "flagged extralimital units"
            );
        }
        Ok(flagged.len())
    }
}
