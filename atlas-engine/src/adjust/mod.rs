//! Code adjustment — the post-processing rules applied after every period
//! has an assigned code and every extralimital flag is final.
//!
//! Rules apply per period, in listed order; a later rule may overwrite an
//! earlier rule's code for the same unit. Periods are walked in order, so a
//! period's gap-filling sees the preceding period's already-adjusted code
//! and the following period's unadjusted one.

use atlas_core::errors::AssignError;
use atlas_core::types::{EvidenceCategory, PeriodIndex, PeriodSet, PresenceCode};
use atlas_storage::connection::writer::with_immediate_transaction;
use atlas_storage::queries::evidence;
use atlas_storage::DatabaseManager;
use rustc_hash::{FxHashMap, FxHashSet};

/// In-memory view of one unit's adjustable state in one period.
#[derive(Debug, Clone)]
struct UnitPeriod {
    code: Option<PresenceCode>,
    opinion_weight: Option<f64>,
    extralimital: bool,
}

/// Applies the adjustment rules for a category.
pub struct CodeAdjuster<'a> {
    manager: &'a DatabaseManager,
    periods: &'a PeriodSet,
}

impl<'a> CodeAdjuster<'a> {
    pub fn new(manager: &'a DatabaseManager, periods: &'a PeriodSet) -> Self {
        Self { manager, periods }
    }

    /// Adjust every period of a category. Returns the number of codes
    /// changed.
    pub fn adjust_category(&self, category: EvidenceCategory) -> Result<usize, AssignError> {
        let rows = self
            .manager
            .with_reader(|conn| evidence::rows_for_category(conn, category))?;

        let mut table: FxHashMap<(String, PeriodIndex), UnitPeriod> = FxHashMap::default();
        let mut unit_keys: FxHashSet<String> = FxHashSet::default();
        for row in &rows {
            unit_keys.insert(row.unit_key.clone());
            table.insert(
                (row.unit_key.clone(), row.period),
                UnitPeriod {
                    code: row.presence_code,
                    opinion_weight: row.opinion_weight,
                    extralimital: row.extralimital,
                },
            );
        }

        // Units flagged extralimital in any period of this category.
        let flagged_any: FxHashSet<String> = self
            .manager
            .with_reader(|conn| evidence::extralimital_units(conn, category))?
            .into_iter()
            .collect();

        let mut ordered_units: Vec<String> = unit_keys.into_iter().collect();
        ordered_units.sort();

        let mut changes: Vec<(String, PeriodIndex, PresenceCode)> = Vec::new();

        for (period, _window) in self.periods.iter() {
            let first = period == self.periods.first_index();
            let last = period == self.periods.last_index();

            for unit_key in &ordered_units {
                let Some(current) = table.get(&(unit_key.clone(), period)).cloned() else {
                    continue;
                };
                let mut code = current.code;

                // Rule 1: documented in both neighbor periods with a
                // nontrivial opinion weight bridges the gap as likely present.
                if !first && !last {
                    let prev = table
                        .get(&(unit_key.clone(), period - 1))
                        .and_then(|u| u.code);
                    let next = table
                        .get(&(unit_key.clone(), period + 1))
                        .and_then(|u| u.code);
                    if prev == Some(PresenceCode::Confirmed)
                        && next == Some(PresenceCode::Confirmed)
                        && current.opinion_weight.map(|w| w > 2.0).unwrap_or(false)
                    {
                        code = Some(PresenceCode::Likely);
                    }
                }

                // Rule 2: flagged extralimital in any period, not documented
                // here, and no opinion on record: suspected absent.
                if flagged_any.contains(unit_key)
                    && code.is_some()
                    && code != Some(PresenceCode::Confirmed)
                    && current.opinion_weight.is_none()
                {
                    code = Some(PresenceCode::SuspectedAbsent);
                }

                // Rule 3: seasonal categories demote a documented code that
                // is itself flagged extralimital this period.
                if category.is_seasonal()
                    && code == Some(PresenceCode::Confirmed)
                    && current.extralimital
                {
                    code = Some(PresenceCode::SuspectedAbsent);
                }

                if code != current.code {
                    if let Some(code) = code {
                        table
                            .entry((unit_key.clone(), period))
                            .and_modify(|u| u.code = Some(code));
                        changes.push((unit_key.clone(), period, code));
                    }
                }
            }
        }

        self.manager.with_writer(|conn| {
            with_immediate_transaction(conn, |tx| {
                for (unit_key, period, code) in &changes {
                    evidence::set_code(tx, unit_key, category, *period, *code)?;
                }
                Ok(())
            })
        })?;

        tracing::debug!(
            category = %category,
            changed = changes.len(),
            "adjusted presence codes"
        );
        Ok(changes.len())
    }
}
