//! Cross-category opinion adjustment.
//!
//! Categories are not independent: year-round-present implies summer and
//! winter presence, seasonal presence implies overall presence, and overall
//! absence implies seasonal absence where no seasonal opinion exists. This
//! pass turns the canonical per-category opinions into the final adjusted
//! table, one record per (unit, year, category).

use atlas_core::types::{AdjustedOpinion, EvidenceCategory, Opinion, OpinionStatus};
use rustc_hash::FxHashMap;

/// A category's opinion for one (unit, year) while being adjusted.
/// `base` is the canonical opinion (None for synthesized records);
/// `adjusted` is filled by the cases below.
#[derive(Debug, Clone, Default)]
struct Entry {
    base: Option<(OpinionStatus, f64)>,
    adjusted: Option<(OpinionStatus, f64)>,
}

impl Entry {
    fn from_base(status: OpinionStatus, weight: f64) -> Self {
        Self {
            base: Some((status, weight)),
            adjusted: None,
        }
    }

    fn base_status(&self) -> Option<OpinionStatus> {
        self.base.map(|(status, _)| status)
    }

    fn base_weight(&self) -> Option<f64> {
        self.base.map(|(_, weight)| weight)
    }
}

#[derive(Debug, Clone, Default)]
struct UnitYear {
    presence: Option<Entry>,
    summer: Option<Entry>,
    winter: Option<Entry>,
    year_round: Option<Entry>,
}

impl UnitYear {
    fn slot(&mut self, category: EvidenceCategory) -> &mut Option<Entry> {
        match category {
            EvidenceCategory::Presence => &mut self.presence,
            EvidenceCategory::Summer => &mut self.summer,
            EvidenceCategory::Winter => &mut self.winter,
            EvidenceCategory::YearRound => &mut self.year_round,
        }
    }
}

/// Run the adjustment pass over the canonical opinions of all categories.
/// Input records must already be cleaned (at most one per unit/year/category).
pub fn adjust(canonical: &[Opinion]) -> Vec<AdjustedOpinion> {
    let mut table: FxHashMap<(String, i32), UnitYear> = FxHashMap::default();

    for record in canonical {
        let unit_year = table
            .entry((record.unit_key.clone(), record.year))
            .or_default();
        *unit_year.slot(record.category) =
            Some(Entry::from_base(record.status, record.weight()));
    }

    // Expansion: a year-round opinion stands in for summer and winter where
    // no seasonal opinion of its own exists.
    for unit_year in table.values_mut() {
        if let Some(year_round) = unit_year.year_round.clone() {
            if unit_year.summer.is_none() {
                unit_year.summer = Some(year_round.clone());
            }
            if unit_year.winter.is_none() {
                unit_year.winter = Some(year_round);
            }
        }
    }

    // The four reconciliation cases, one seasonal category at a time.
    // A later season's case (a) may overwrite the presence adjusted value;
    // the fixed order keeps that deterministic.
    for season in EvidenceCategory::SEASONAL {
        for unit_year in table.values_mut() {
            apply_cases(unit_year, season);
        }
    }

    // Records untouched by the cases keep their own values.
    let mut result = Vec::new();
    for ((unit_key, year), unit_year) in table {
        for category in EvidenceCategory::ALL {
            let entry = match category {
                EvidenceCategory::Presence => &unit_year.presence,
                EvidenceCategory::Summer => &unit_year.summer,
                EvidenceCategory::Winter => &unit_year.winter,
                EvidenceCategory::YearRound => &unit_year.year_round,
            };
            let Some(entry) = entry else { continue };
            let value = entry.adjusted.or(entry.base);
            if let Some((status, weight)) = value {
                result.push(AdjustedOpinion {
                    unit_key: unit_key.clone(),
                    year,
                    category,
                    status,
                    weight,
                });
            }
        }
    }
    result.sort_by(|a, b| {
        (&a.unit_key, a.year, a.category).cmp(&(&b.unit_key, b.year, b.category))
    });
    result
}

fn apply_cases(unit_year: &mut UnitYear, season: EvidenceCategory) {
    let presence_base = unit_year.presence.as_ref().and_then(|e| e.base);
    let season_entry = unit_year.slot(season).clone();
    let season_base = season_entry.as_ref().and_then(|e| e.base);

    match (presence_base, season_base) {
        // (a) Both exist and the season says present: the higher weight wins
        // and its status/weight become both categories' adjusted values.
        // A tie keeps each category's existing value.
        (Some((p_status, p_weight)), Some((OpinionStatus::Present, s_weight))) => {
            let (status, weight) = if s_weight > p_weight {
                (OpinionStatus::Present, s_weight)
            } else if p_weight > s_weight {
                (p_status, p_weight)
            } else {
                set_adjusted(unit_year.slot(season), OpinionStatus::Present, s_weight);
                set_adjusted(&mut unit_year.presence, p_status, p_weight);
                return;
            };
            set_adjusted(unit_year.slot(season), status, weight);
            set_adjusted(&mut unit_year.presence, status, weight);
        }
        // (d) Both absent: both keep absent, at the higher of the two weights.
        (Some((OpinionStatus::Absent, p_weight)), Some((OpinionStatus::Absent, s_weight))) => {
            let weight = p_weight.max(s_weight);
            set_adjusted(unit_year.slot(season), OpinionStatus::Absent, weight);
            set_adjusted(&mut unit_year.presence, OpinionStatus::Absent, weight);
        }
        // (b) Overall absent and no seasonal record: synthesize seasonal
        // absence at the overall weight.
        (Some((OpinionStatus::Absent, p_weight)), None) => {
            let slot = unit_year.slot(season);
            if slot.is_none() {
                *slot = Some(Entry {
                    base: None,
                    adjusted: Some((OpinionStatus::Absent, p_weight)),
                });
            }
        }
        // (c) Seasonal present and no overall record: synthesize overall
        // presence at the seasonal weight.
        (None, Some((OpinionStatus::Present, s_weight))) => {
            set_adjusted(unit_year.slot(season), OpinionStatus::Present, s_weight);
            if unit_year.presence.is_none() {
                unit_year.presence = Some(Entry {
                    base: None,
                    adjusted: Some((OpinionStatus::Present, s_weight)),
                });
            }
        }
        _ => {}
    }
}

fn set_adjusted(slot: &mut Option<Entry>, status: OpinionStatus, weight: f64) {
    if let Some(entry) = slot {
        entry.adjusted = Some((status, weight));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opinion(
        unit: &str,
        year: i32,
        category: EvidenceCategory,
        status: OpinionStatus,
        rank: i64,
        confidence: i64,
    ) -> Opinion {
        Opinion {
            unit_key: unit.to_string(),
            year,
            category,
            expert: "e1".to_string(),
            status,
            rank,
            confidence,
            justification: None,
            entry_time: "2021-01-01T00:00:00".to_string(),
        }
    }

    fn find(
        adjusted: &[AdjustedOpinion],
        unit: &str,
        category: EvidenceCategory,
    ) -> AdjustedOpinion {
        adjusted
            .iter()
            .find(|a| a.unit_key == unit && a.category == category)
            .cloned()
            .expect("adjusted record missing")
    }

    #[test]
    fn seasonal_present_beats_weaker_presence() {
        // summer present at weight 4.9 vs presence absent at weight 2.5
        let canonical = vec![
            opinion("U1", 2003, EvidenceCategory::Presence, OpinionStatus::Absent, 5, 5),
            opinion("U1", 2003, EvidenceCategory::Summer, OpinionStatus::Present, 7, 7),
        ];
        let adjusted = adjust(&canonical);
        let presence = find(&adjusted, "U1", EvidenceCategory::Presence);
        let summer = find(&adjusted, "U1", EvidenceCategory::Summer);
        assert_eq!(presence.status, OpinionStatus::Present);
        assert!((presence.weight - 4.9).abs() < 1e-9);
        assert_eq!(summer.status, OpinionStatus::Present);
        assert!((summer.weight - 4.9).abs() < 1e-9);
    }

    #[test]
    fn stronger_presence_overrides_seasonal_present() {
        let canonical = vec![
            opinion("U1", 2003, EvidenceCategory::Presence, OpinionStatus::Absent, 9, 9),
            opinion("U1", 2003, EvidenceCategory::Summer, OpinionStatus::Present, 3, 3),
        ];
        let adjusted = adjust(&canonical);
        let summer = find(&adjusted, "U1", EvidenceCategory::Summer);
        assert_eq!(summer.status, OpinionStatus::Absent);
        assert!((summer.weight - 8.1).abs() < 1e-9);
    }

    #[test]
    fn tie_keeps_each_category_value() {
        let canonical = vec![
            opinion("U1", 2003, EvidenceCategory::Presence, OpinionStatus::Absent, 5, 5),
            opinion("U1", 2003, EvidenceCategory::Summer, OpinionStatus::Present, 5, 5),
        ];
        let adjusted = adjust(&canonical);
        assert_eq!(
            find(&adjusted, "U1", EvidenceCategory::Presence).status,
            OpinionStatus::Absent
        );
        assert_eq!(
            find(&adjusted, "U1", EvidenceCategory::Summer).status,
            OpinionStatus::Present
        );
    }

    #[test]
    fn presence_absent_synthesizes_seasonal_absent() {
        let canonical = vec![opinion(
            "U1",
            2003,
            EvidenceCategory::Presence,
            OpinionStatus::Absent,
            6,
            5,
        )];
        let adjusted = adjust(&canonical);
        for season in EvidenceCategory::SEASONAL {
            let record = find(&adjusted, "U1", season);
            assert_eq!(record.status, OpinionStatus::Absent);
            assert!((record.weight - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn seasonal_present_synthesizes_presence() {
        let canonical = vec![opinion(
            "U2",
            2004,
            EvidenceCategory::Winter,
            OpinionStatus::Present,
            4,
            5,
        )];
        let adjusted = adjust(&canonical);
        let presence = find(&adjusted, "U2", EvidenceCategory::Presence);
        assert_eq!(presence.status, OpinionStatus::Present);
        assert!((presence.weight - 2.0).abs() < 1e-9);
    }

    #[test]
    fn both_absent_takes_max_weight() {
        let canonical = vec![
            opinion("U1", 2003, EvidenceCategory::Presence, OpinionStatus::Absent, 4, 5),
            opinion("U1", 2003, EvidenceCategory::Winter, OpinionStatus::Absent, 8, 5),
        ];
        let adjusted = adjust(&canonical);
        let presence = find(&adjusted, "U1", EvidenceCategory::Presence);
        let winter = find(&adjusted, "U1", EvidenceCategory::Winter);
        assert!((presence.weight - 4.0).abs() < 1e-9);
        assert!((winter.weight - 4.0).abs() < 1e-9);
        assert_eq!(presence.status, OpinionStatus::Absent);
        assert_eq!(winter.status, OpinionStatus::Absent);
    }

    #[test]
    fn year_round_expands_to_summer_and_winter() {
        let canonical = vec![opinion(
            "U3",
            2005,
            EvidenceCategory::YearRound,
            OpinionStatus::Present,
            6,
            5,
        )];
        let adjusted = adjust(&canonical);
        for category in [
            EvidenceCategory::Summer,
            EvidenceCategory::Winter,
            EvidenceCategory::YearRound,
            EvidenceCategory::Presence,
        ] {
            let record = find(&adjusted, "U3", category);
            assert_eq!(record.status, OpinionStatus::Present);
        }
    }

    #[test]
    fn untouched_records_keep_their_values() {
        let canonical = vec![opinion(
            "U5",
            2007,
            EvidenceCategory::Presence,
            OpinionStatus::Present,
            7,
            6,
        )];
        let adjusted = adjust(&canonical);
        assert_eq!(adjusted.len(), 1);
        let presence = find(&adjusted, "U5", EvidenceCategory::Presence);
        assert_eq!(presence.status, OpinionStatus::Present);
        assert!((presence.weight - 4.2).abs() < 1e-9);
    }
}
