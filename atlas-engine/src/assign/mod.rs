//! Presence code assignment — the sequential, per-period state machine.

pub mod legacy;
pub mod stages;

use atlas_core::errors::AssignError;
use atlas_core::types::{EvidenceCategory, LegacyRecord, PeriodSet, PresenceCode};
use atlas_storage::connection::writer::with_immediate_transaction;
use atlas_storage::queries::{evidence, units};
use atlas_storage::DatabaseManager;
use rustc_hash::{FxHashMap, FxHashSet};

use self::legacy::legacy_seed;
use self::stages::{apply_stages, UnitState};

/// Assigns one code per unit per period for a category, strictly in period
/// order: each period's seeding reads the previous period's freshly assigned
/// codes.
pub struct CodeAssigner<'a> {
    manager: &'a DatabaseManager,
    periods: &'a PeriodSet,
    /// Legacy baseline by unit key; empty when the baseline is disabled.
    legacy: FxHashMap<String, LegacyRecord>,
}

impl<'a> CodeAssigner<'a> {
    pub fn new(
        manager: &'a DatabaseManager,
        periods: &'a PeriodSet,
        legacy_records: Vec<LegacyRecord>,
    ) -> Self {
        let legacy = legacy_records
            .into_iter()
            .map(|r| (r.unit_key.clone(), r))
            .collect();
        Self {
            manager,
            periods,
            legacy,
        }
    }

    /// Assign codes for every period of a category. Returns the number of
    /// (unit, period) codes written.
    pub fn assign_category(&self, category: EvidenceCategory) -> Result<usize, AssignError> {
        let mut total = 0usize;
        let mut previous_codes: FxHashMap<String, PresenceCode> = FxHashMap::default();

        for (period_index, _period) in self.periods.iter() {
            let first_period = period_index == self.periods.first_index();

            let rows = self
                .manager
                .with_reader(|conn| evidence::rows_for_period(conn, category, period_index))?;
            let row_map: FxHashMap<String, &atlas_storage::queries::evidence::EvidenceRow> =
                rows.iter().map(|r| (r.unit_key.clone(), r)).collect();

            // Units under consideration: anything with evidence this period,
            // anything coded last period, and (first period only) every
            // legacy unit this category can seed.
            let mut unit_keys: FxHashSet<String> =
                row_map.keys().cloned().collect();
            unit_keys.extend(previous_codes.keys().cloned());
            if first_period {
                for (unit_key, record) in &self.legacy {
                    if legacy_seed(category, record).is_some() {
                        unit_keys.insert(unit_key.clone());
                    }
                }
            }

            let mut ordered: Vec<String> = unit_keys.into_iter().collect();
            ordered.sort();

            let mut assigned: Vec<(String, PresenceCode)> = Vec::new();
            let mut next_previous: FxHashMap<String, PresenceCode> = FxHashMap::default();

            for unit_key in ordered {
                let row = row_map.get(&unit_key);
                let state = UnitState {
                    first_period,
                    legacy_seed: self
                        .legacy
                        .get(&unit_key)
                        .and_then(|record| legacy_seed(category, record)),
                    previous_code: previous_codes.get(&unit_key).copied(),
                    opinion: row.and_then(|r| {
                        r.opinion_status.map(|status| {
                            (status, r.opinion_weight.unwrap_or(0.0))
                        })
                    }),
                    documented: row.map(|r| r.documented).unwrap_or(false),
                    code: None,
                    unit_key,
                };
                let state = apply_stages(state);
                if let Some(code) = state.code {
                    next_previous.insert(state.unit_key.clone(), code);
                    assigned.push((state.unit_key, code));
                }
            }

            total += assigned.len();
            self.manager.with_writer(|conn| {
                with_immediate_transaction(conn, |tx| {
                    for (unit_key, code) in &assigned {
                        units::ensure_unit(tx, unit_key)?;
                        evidence::set_code(tx, unit_key, category, period_index, *code)?;
                    }
                    Ok(())
                })
            })?;

            tracing::debug!(
                category = %category,
                period = period_index,
                coded = assigned.len(),
                "assigned presence codes"
            );
            previous_codes = next_previous;
        }
        Ok(total)
    }
}
