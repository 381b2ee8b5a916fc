//! Tests for raw and reconciled opinion storage.

use atlas_core::types::{AdjustedOpinion, EvidenceCategory, Opinion, OpinionStatus};
use atlas_storage::migrations::run_migrations;
use atlas_storage::queries::opinions::*;
use rusqlite::Connection;

fn setup_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    conn
}

fn opinion(unit: &str, year: i32, expert: &str) -> Opinion {
    Opinion {
        unit_key: unit.to_string(),
        year,
        category: EvidenceCategory::Presence,
        expert: expert.to_string(),
        status: OpinionStatus::Present,
        rank: 5,
        confidence: 6,
        justification: Some("seen at feeder".to_string()),
        entry_time: "2021-03-01T10:00:00".to_string(),
    }
}

fn adjusted(unit: &str, year: i32, weight: f64) -> AdjustedOpinion {
    AdjustedOpinion {
        unit_key: unit.to_string(),
        year,
        category: EvidenceCategory::Presence,
        status: OpinionStatus::Present,
        weight,
    }
}

#[test]
fn raw_span_filter() {
    let conn = setup_db();
    insert_batch(
        &conn,
        &[opinion("U1", 2003, "e1"), opinion("U1", 2012, "e1")],
    )
    .unwrap();

    let in_span = raw_in_span(&conn, 2001, 2005).unwrap();
    assert_eq!(in_span.len(), 1);
    assert_eq!(in_span[0].year, 2003);
    assert_eq!(in_span[0].rank, 5);
    assert_eq!(in_span[0].justification.as_deref(), Some("seen at feeder"));
}

#[test]
fn replace_span_replaces_wholesale() {
    let conn = setup_db();
    replace_adjusted_span(&conn, 2001, 2010, &[adjusted("U1", 2003, 3.0)]).unwrap();
    replace_adjusted_span(&conn, 2001, 2010, &[adjusted("U2", 2004, 2.0)]).unwrap();

    let all = adjusted_for_category(&conn, EvidenceCategory::Presence).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].unit_key, "U2");
}

#[test]
fn replace_span_keeps_out_of_span_records() {
    let conn = setup_db();
    replace_adjusted_span(&conn, 2011, 2015, &[adjusted("U1", 2012, 3.0)]).unwrap();
    replace_adjusted_span(&conn, 2001, 2005, &[adjusted("U2", 2003, 2.0)]).unwrap();

    let all = adjusted_for_category(&conn, EvidenceCategory::Presence).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn latest_in_window_picks_most_recent_year() {
    let conn = setup_db();
    replace_adjusted_span(
        &conn,
        2001,
        2005,
        &[
            adjusted("U1", 2002, 1.0),
            adjusted("U1", 2004, 4.0),
            adjusted("U2", 2003, 2.0),
        ],
    )
    .unwrap();

    let latest =
        latest_adjusted_in_window(&conn, EvidenceCategory::Presence, 2001, 2005).unwrap();
    assert_eq!(latest.len(), 2);
    let u1 = latest.iter().find(|a| a.unit_key == "U1").unwrap();
    assert_eq!(u1.year, 2004);
    assert!((u1.weight - 4.0).abs() < 1e-12);
}

#[test]
fn at_most_one_adjusted_per_key() {
    let conn = setup_db();
    // Same (unit, year, category) twice: the second write wins, no duplicate.
    replace_adjusted_span(
        &conn,
        2001,
        2005,
        &[adjusted("U1", 2003, 1.0), adjusted("U1", 2003, 5.0)],
    )
    .unwrap();
    assert_eq!(adjusted_count(&conn).unwrap(), 1);
    let all = adjusted_for_category(&conn, EvidenceCategory::Presence).unwrap();
    assert!((all[0].weight - 5.0).abs() < 1e-12);
}
