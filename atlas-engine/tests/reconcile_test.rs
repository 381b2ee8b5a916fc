//! Store-backed reconciliation tests: cleanup, adjustment, projection.

use atlas_core::types::{EvidenceCategory, Opinion, OpinionStatus, TimePeriod};
use atlas_engine::reconcile::OpinionReconciler;
use atlas_storage::queries::{evidence, opinions};
use atlas_storage::DatabaseManager;

fn opinion(
    unit: &str,
    year: i32,
    category: EvidenceCategory,
    expert: &str,
    status: OpinionStatus,
    rank: i64,
    confidence: i64,
    entry_time: &str,
) -> Opinion {
    Opinion {
        unit_key: unit.to_string(),
        year,
        category,
        expert: expert.to_string(),
        status,
        rank,
        confidence,
        justification: None,
        entry_time: entry_time.to_string(),
    }
}

#[test]
fn reconcile_span_produces_single_adjusted_record_per_key() {
    let manager = DatabaseManager::open_in_memory().unwrap();
    manager
        .with_writer(|conn| {
            opinions::insert_batch(
                conn,
                &[
                    // Superseded by the same expert's later entry.
                    opinion("U1", 2003, EvidenceCategory::Presence, "e1",
                            OpinionStatus::Absent, 5, 5, "2020-01-01"),
                    opinion("U1", 2003, EvidenceCategory::Presence, "e1",
                            OpinionStatus::Present, 5, 5, "2021-06-01"),
                    // Higher rank than e1.
                    opinion("U1", 2003, EvidenceCategory::Presence, "e2",
                            OpinionStatus::Absent, 7, 4, "2021-01-01"),
                ],
            )
            .map(|_| ())
        })
        .unwrap();

    let reconciler = OpinionReconciler::new(&manager);
    let outcome = reconciler.reconcile_span(2001, 2005).unwrap();
    assert!(outcome.skipped.is_empty());

    let adjusted = manager
        .with_reader(|conn| opinions::adjusted_for_category(conn, EvidenceCategory::Presence))
        .unwrap();
    assert_eq!(adjusted.len(), 1);
    // e2 (rank 7) wins over e1 (rank 5): absent, weight 7*4/10.
    assert_eq!(adjusted[0].status, OpinionStatus::Absent);
    assert!((adjusted[0].weight - 2.8).abs() < 1e-9);
}

#[test]
fn negated_opinions_produce_no_adjusted_record() {
    let manager = DatabaseManager::open_in_memory().unwrap();
    manager
        .with_writer(|conn| {
            opinions::insert_batch(
                conn,
                &[
                    opinion("U4", 2003, EvidenceCategory::Presence, "e1",
                            OpinionStatus::Present, 5, 5, "2021-01-01"),
                    opinion("U4", 2003, EvidenceCategory::Presence, "e2",
                            OpinionStatus::Absent, 5, 5, "2021-02-01"),
                ],
            )
            .map(|_| ())
        })
        .unwrap();

    let reconciler = OpinionReconciler::new(&manager);
    reconciler.reconcile_span(2001, 2005).unwrap();

    // Equal rank and confidence, opposite status: both omitted, and the
    // empty group is an explicit no-opinion outcome.
    let adjusted = manager
        .with_reader(|conn| opinions::adjusted_for_category(conn, EvidenceCategory::Presence))
        .unwrap();
    assert!(adjusted.is_empty());
}

#[test]
fn rerun_is_deterministic() {
    let manager = DatabaseManager::open_in_memory().unwrap();
    manager
        .with_writer(|conn| {
            opinions::insert_batch(
                conn,
                &[
                    opinion("U1", 2003, EvidenceCategory::Presence, "e1",
                            OpinionStatus::Present, 6, 6, "2021-01-01"),
                    opinion("U2", 2004, EvidenceCategory::Summer, "e2",
                            OpinionStatus::Present, 4, 5, "2021-01-02"),
                    opinion("U2", 2004, EvidenceCategory::Presence, "e3",
                            OpinionStatus::Absent, 3, 3, "2021-01-03"),
                ],
            )
            .map(|_| ())
        })
        .unwrap();

    let reconciler = OpinionReconciler::new(&manager);
    reconciler.reconcile_span(2001, 2010).unwrap();
    let first: Vec<_> = EvidenceCategory::ALL
        .iter()
        .flat_map(|&c| {
            manager
                .with_reader(|conn| opinions::adjusted_for_category(conn, c))
                .unwrap()
        })
        .collect();

    reconciler.reconcile_span(2001, 2010).unwrap();
    let second: Vec<_> = EvidenceCategory::ALL
        .iter()
        .flat_map(|&c| {
            manager
                .with_reader(|conn| opinions::adjusted_for_category(conn, c))
                .unwrap()
        })
        .collect();

    assert_eq!(first, second);
}

#[test]
fn out_of_range_scores_skip_the_category_only() {
    let manager = DatabaseManager::open_in_memory().unwrap();
    manager
        .with_writer(|conn| {
            opinions::insert_batch(
                conn,
                &[
                    opinion("U1", 2003, EvidenceCategory::Summer, "e1",
                            OpinionStatus::Present, 15, 5, "2021-01-01"),
                    opinion("U2", 2003, EvidenceCategory::Presence, "e2",
                            OpinionStatus::Present, 5, 5, "2021-01-01"),
                ],
            )
            .map(|_| ())
        })
        .unwrap();

    let reconciler = OpinionReconciler::new(&manager);
    let outcome = reconciler.reconcile_span(2001, 2005).unwrap();
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].0, EvidenceCategory::Summer);

    // The presence category still committed.
    let adjusted = manager
        .with_reader(|conn| opinions::adjusted_for_category(conn, EvidenceCategory::Presence))
        .unwrap();
    assert_eq!(adjusted.len(), 1);
}

#[test]
fn projection_writes_latest_opinion_into_evidence() {
    let manager = DatabaseManager::open_in_memory().unwrap();
    manager
        .with_writer(|conn| {
            opinions::insert_batch(
                conn,
                &[
                    opinion("U1", 2002, EvidenceCategory::Presence, "e1",
                            OpinionStatus::Absent, 5, 5, "2021-01-01"),
                    opinion("U1", 2004, EvidenceCategory::Presence, "e1",
                            OpinionStatus::Present, 6, 6, "2022-01-01"),
                ],
            )
            .map(|_| ())
        })
        .unwrap();

    let reconciler = OpinionReconciler::new(&manager);
    reconciler.reconcile_span(2001, 2005).unwrap();
    let written = reconciler
        .project_period(EvidenceCategory::Presence, 0, TimePeriod::new(2001, 2005))
        .unwrap();
    assert_eq!(written, 1);

    let row = manager
        .with_reader(|conn| evidence::get(conn, "U1", EvidenceCategory::Presence, 0))
        .unwrap()
        .unwrap();
    // The 2004 entry is the most recent year in the window.
    assert_eq!(row.opinion_status, Some(OpinionStatus::Present));
    assert!((row.opinion_weight.unwrap() - 3.6).abs() < 1e-9);
}
