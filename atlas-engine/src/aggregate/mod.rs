//! Occurrence weight aggregation — one pass per (period, era, category).
//!
//! Each pass selects observations by era and month, intersects their
//! footprints with the reference grid, discards fragments below the species
//! error tolerance, and sums the surviving weights per unit. The recent era
//! feeds the documented flag; the historical era feeds previously-documented.

pub mod dates;

use atlas_core::errors::{AggregateError, StorageError};
use atlas_core::types::{Era, EvidenceCategory, ObservationRecord, PeriodIndex, TimePeriod};
use atlas_storage::connection::writer::with_immediate_transaction;
use atlas_storage::queries::last_record::LastRecord;
use atlas_storage::queries::{evidence, grid, last_record, observations, units};
use atlas_storage::DatabaseManager;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::geometry::overlap_fraction;

/// The computed output of one aggregation pass, ready to commit.
#[derive(Debug, Clone)]
pub struct EraWeights {
    pub category: EvidenceCategory,
    pub period: PeriodIndex,
    pub era: Era,
    /// Per-unit summed weights, sorted by unit key.
    pub unit_weights: Vec<(String, f64)>,
    /// Observations that contributed at least one fragment.
    pub records_used: usize,
}

/// Computes and commits per-unit occurrence weights.
#[derive(Debug, Clone, Copy)]
pub struct OccurrenceAggregator {
    pub documented_threshold: f64,
    pub error_tolerance_pct: f64,
}

impl OccurrenceAggregator {
    pub fn new(documented_threshold: f64, error_tolerance_pct: f64) -> Self {
        Self {
            documented_threshold,
            error_tolerance_pct,
        }
    }

    /// Compute the summed weights for one (category, period, era). Read-only;
    /// safe to run in parallel across passes.
    pub fn compute(
        &self,
        manager: &DatabaseManager,
        category: EvidenceCategory,
        period_index: PeriodIndex,
        period: TimePeriod,
        era: Era,
    ) -> Result<EraWeights, AggregateError> {
        let (min_year, max_year) = match era {
            Era::Recent => (Some(period.start_year), Some(period.end_year)),
            Era::Historical => (None, Some(period.start_year - 1)),
        };
        let records = manager
            .with_reader(|conn| observations::in_year_range(conn, min_year, max_year))?;

        let mut sums: FxHashMap<String, f64> = FxHashMap::default();
        let mut records_used = 0usize;

        for record in &records {
            if !era.matches_year(period, record.event_year) {
                continue;
            }
            if let Some(months) = category.month_filter() {
                if !months.contains(&record.event_month) {
                    continue;
                }
            }

            let fragments = self.attribute_record(manager, record)?;
            if !fragments.is_empty() {
                records_used += 1;
            }
            for (unit_key, weight) in fragments {
                *sums.entry(unit_key).or_insert(0.0) += weight;
            }
        }

        let mut unit_weights: Vec<(String, f64)> = sums.into_iter().collect();
        unit_weights.sort_by(|a, b| a.0.cmp(&b.0));

        tracing::debug!(
            category = %category,
            period = period_index,
            era = %era,
            units = unit_weights.len(),
            records = records_used,
            "aggregated occurrence weights"
        );

        Ok(EraWeights {
            category,
            period: period_index,
            era,
            unit_weights,
            records_used,
        })
    }

    /// Units a record's footprint can be attributed to: grid tiles keeping at
    /// least `100 - error_tolerance` percent of the footprint's area.
    fn attribute_record(
        &self,
        manager: &DatabaseManager,
        record: &ObservationRecord,
    ) -> Result<SmallVec<[(String, f64); 4]>, AggregateError> {
        let mut fragments = SmallVec::new();
        if record.footprint_area() <= f64::EPSILON {
            tracing::warn!(record_id = %record.record_id, "skipping zero-area footprint");
            return Ok(fragments);
        }

        let bbox = record.footprint.bounding_box();
        let tiles = manager.with_reader(|conn| grid::intersecting_bbox(conn, &bbox))?;

        let min_fraction = (100.0 - self.error_tolerance_pct) / 100.0;
        for tile in tiles {
            let fraction = overlap_fraction(&tile.polygon, &record.footprint);
            if fraction >= min_fraction {
                fragments.push((tile.unit_key, record.weight));
            }
        }
        Ok(fragments)
    }

    /// Rebuild the last-record table: for every unit, the most recent
    /// observation attributable to it (same overlap tolerance as the weight
    /// passes) with its age in whole weeks at `assessed_date`.
    pub fn build_last_records(
        &self,
        manager: &DatabaseManager,
        assessed_date: &str,
    ) -> Result<usize, AggregateError> {
        let Some(assessed_days) = dates::parse_iso_days(assessed_date) else {
            return Err(AggregateError::Storage(StorageError::InvalidValue {
                table: "last_record".to_string(),
                message: format!("bad assessment date {assessed_date:?}"),
            }));
        };

        let records = manager.with_reader(|conn| observations::in_year_range(conn, None, None))?;

        // Freshest attributable record per unit.
        let mut latest: FxHashMap<String, (&ObservationRecord, i64)> = FxHashMap::default();
        for record in &records {
            let Some(event_days) = dates::parse_iso_days(&record.event_date) else {
                tracing::warn!(record_id = %record.record_id, "unparseable event date");
                continue;
            };
            for (unit_key, _) in self.attribute_record(manager, record)? {
                match latest.get(&unit_key) {
                    Some((_, existing_days)) if *existing_days >= event_days => {}
                    _ => {
                        latest.insert(unit_key, (record, event_days));
                    }
                }
            }
        }

        let mut rows: Vec<LastRecord> = latest
            .into_iter()
            .map(|(unit_key, (record, event_days))| LastRecord {
                unit_key,
                record_id: record.record_id.clone(),
                event_date: record.event_date.clone(),
                weight: record.weight,
                age_weeks: (assessed_days - event_days).max(0) / 7,
                assessed_date: assessed_date.to_string(),
            })
            .collect();
        rows.sort_by(|a, b| a.unit_key.cmp(&b.unit_key));

        let count = manager.with_writer(|conn| {
            with_immediate_transaction(conn, |tx| last_record::replace_all(tx, &rows))
        })?;
        Ok(count)
    }

    /// Commit one pass's weights: reset the era's columns for the (category,
    /// period), then write each unit's sum and threshold flag. Appends rows
    /// for units new to the category. Overwrite semantics keep reruns
    /// idempotent.
    pub fn commit(
        &self,
        conn: &rusqlite::Connection,
        weights: &EraWeights,
    ) -> Result<usize, AggregateError> {
        let count = with_immediate_transaction(conn, |tx| {
            match weights.era {
                Era::Recent => {
                    tx.execute(
                        "UPDATE evidence SET recent_weight = NULL, documented = 0
                         WHERE category = ?1 AND period = ?2",
                        rusqlite::params![weights.category.as_str(), weights.period as i64],
                    )
                    .map_err(|e| StorageError::SqliteError {
                        message: e.to_string(),
                    })?;
                }
                Era::Historical => {
                    tx.execute(
                        "UPDATE evidence SET historical_weight = NULL,
                                             previously_documented = 0
                         WHERE category = ?1 AND period = ?2",
                        rusqlite::params![weights.category.as_str(), weights.period as i64],
                    )
                    .map_err(|e| StorageError::SqliteError {
                        message: e.to_string(),
                    })?;
                }
            }

            let mut written = 0;
            for (unit_key, weight) in &weights.unit_weights {
                units::ensure_unit(tx, unit_key)?;
                let over_threshold = *weight >= self.documented_threshold;
                match weights.era {
                    Era::Recent => evidence::set_recent_weight(
                        tx,
                        unit_key,
                        weights.category,
                        weights.period,
                        *weight,
                        over_threshold,
                    )?,
                    Era::Historical => evidence::set_historical_weight(
                        tx,
                        unit_key,
                        weights.category,
                        weights.period,
                        *weight,
                        over_threshold,
                    )?,
                }
                written += 1;
            }
            Ok(written)
        })?;
        Ok(count)
    }
}
