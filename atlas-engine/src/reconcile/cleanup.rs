//! Opinion cleanup: the four ordered passes that turn raw records for one
//! evidence category into at most one canonical opinion per (unit, year).
//!
//! Pass order matters and mirrors the resolution policy: duplicates, then
//! per-expert supersession, then negation, then authority.

use atlas_core::types::Opinion;
use rustc_hash::{FxHashMap, FxHashSet};

/// Collapse records that are identical in every field.
pub fn dedupe_exact(records: Vec<Opinion>) -> Vec<Opinion> {
    let mut seen: FxHashSet<(String, i32, String, String, i64, i64, Option<String>, String)> =
        FxHashSet::default();
    let mut result = Vec::with_capacity(records.len());
    for record in records {
        let key = (
            record.unit_key.clone(),
            record.year,
            record.expert.clone(),
            record.status.as_str().to_string(),
            record.rank,
            record.confidence,
            record.justification.clone(),
            record.entry_time.clone(),
        );
        if seen.insert(key) {
            result.push(record);
        }
    }
    result
}

/// Per (unit, year, expert): keep only the most recently entered record.
/// An expert's later submission supersedes their earlier one.
pub fn supersede_by_entry_time(records: Vec<Opinion>) -> Vec<Opinion> {
    let mut latest: FxHashMap<(String, i32, String), Opinion> = FxHashMap::default();
    for record in records {
        let key = (record.unit_key.clone(), record.year, record.expert.clone());
        match latest.get(&key) {
            Some(existing) if existing.entry_time >= record.entry_time => {}
            _ => {
                latest.insert(key, record);
            }
        }
    }
    let mut result: Vec<Opinion> = latest.into_values().collect();
    sort_canonical(&mut result);
    result
}

/// Per (unit, year, rank, confidence): if records disagree on status, all
/// records in the group are omitted. A tie in authority with disagreement is
/// unresolvable and is dropped entirely, never averaged.
pub fn drop_negated(records: Vec<Opinion>) -> Vec<Opinion> {
    let mut statuses: FxHashMap<(String, i32, i64, i64), (bool, bool)> = FxHashMap::default();
    for record in &records {
        let entry = statuses
            .entry((
                record.unit_key.clone(),
                record.year,
                record.rank,
                record.confidence,
            ))
            .or_insert((false, false));
        match record.status {
            atlas_core::types::OpinionStatus::Present => entry.0 = true,
            atlas_core::types::OpinionStatus::Absent => entry.1 = true,
        }
    }

    records
        .into_iter()
        .filter(|record| {
            let key = (
                record.unit_key.clone(),
                record.year,
                record.rank,
                record.confidence,
            );
            let (present, absent) = statuses[&key];
            !(present && absent)
        })
        .collect()
}

/// Per (unit, year): keep the single highest-authority record.
/// Rank wins, then confidence; remaining ties break deterministically on the
/// latest entry time, then the expert key, so reruns are stable.
pub fn resolve_authority(records: Vec<Opinion>) -> Vec<Opinion> {
    let mut best: FxHashMap<(String, i32), Opinion> = FxHashMap::default();
    for record in records {
        let key = (record.unit_key.clone(), record.year);
        match best.get(&key) {
            Some(existing) if !outranks(&record, existing) => {}
            _ => {
                best.insert(key, record);
            }
        }
    }
    let mut result: Vec<Opinion> = best.into_values().collect();
    sort_canonical(&mut result);
    result
}

fn outranks(a: &Opinion, b: &Opinion) -> bool {
    (a.rank, a.confidence, &a.entry_time, std::cmp::Reverse(&a.expert))
        > (b.rank, b.confidence, &b.entry_time, std::cmp::Reverse(&b.expert))
}

fn sort_canonical(records: &mut [Opinion]) {
    records.sort_by(|a, b| {
        (&a.unit_key, a.year, &a.expert, &a.entry_time)
            .cmp(&(&b.unit_key, b.year, &b.expert, &b.entry_time))
    });
}

/// The full cleanup for one category's records, in fixed pass order.
pub fn cleanup(records: Vec<Opinion>) -> Vec<Opinion> {
    resolve_authority(drop_negated(supersede_by_entry_time(dedupe_exact(records))))
}

#[cfg(test)]
mod tests {
    use atlas_core::types::{EvidenceCategory, OpinionStatus};

    use super::*;

    fn opinion(
        unit: &str,
        year: i32,
        expert: &str,
        status: OpinionStatus,
        rank: i64,
        confidence: i64,
        entry_time: &str,
    ) -> Opinion {
        Opinion {
            unit_key: unit.to_string(),
            year,
            category: EvidenceCategory::Presence,
            expert: expert.to_string(),
            status,
            rank,
            confidence,
            justification: None,
            entry_time: entry_time.to_string(),
        }
    }

    #[test]
    fn exact_duplicates_collapse() {
        let a = opinion("U1", 2003, "e1", OpinionStatus::Present, 5, 5, "t1");
        let records = vec![a.clone(), a.clone(), a];
        assert_eq!(dedupe_exact(records).len(), 1);
    }

    #[test]
    fn later_entry_supersedes() {
        let records = vec![
            opinion("U1", 2003, "e1", OpinionStatus::Present, 5, 5, "2020-01-01"),
            opinion("U1", 2003, "e1", OpinionStatus::Absent, 5, 5, "2021-01-01"),
        ];
        let kept = supersede_by_entry_time(records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].status, OpinionStatus::Absent);
    }

    #[test]
    fn equal_authority_disagreement_drops_both() {
        let records = vec![
            opinion("U4", 2003, "e1", OpinionStatus::Present, 5, 5, "t1"),
            opinion("U4", 2003, "e2", OpinionStatus::Absent, 5, 5, "t2"),
        ];
        assert!(drop_negated(records).is_empty());
    }

    #[test]
    fn equal_authority_agreement_survives_negation() {
        let records = vec![
            opinion("U1", 2003, "e1", OpinionStatus::Present, 5, 5, "t1"),
            opinion("U1", 2003, "e2", OpinionStatus::Present, 5, 5, "t2"),
        ];
        assert_eq!(drop_negated(records).len(), 2);
    }

    #[test]
    fn highest_rank_wins_then_confidence() {
        let records = vec![
            opinion("U1", 2003, "e1", OpinionStatus::Absent, 4, 9, "t1"),
            opinion("U1", 2003, "e2", OpinionStatus::Present, 6, 2, "t2"),
            opinion("U1", 2003, "e3", OpinionStatus::Absent, 6, 7, "t3"),
        ];
        let kept = resolve_authority(records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].expert, "e3");
    }

    #[test]
    fn cleanup_is_order_insensitive() {
        let mut records = vec![
            opinion("U1", 2003, "e1", OpinionStatus::Present, 5, 5, "t1"),
            opinion("U1", 2003, "e2", OpinionStatus::Absent, 7, 3, "t2"),
            opinion("U2", 2004, "e3", OpinionStatus::Present, 2, 2, "t3"),
        ];
        let forward = cleanup(records.clone());
        records.reverse();
        let backward = cleanup(records);
        assert_eq!(forward, backward);
    }
}
