//! Aggregation tests: era selection, overlap tolerance, thresholding,
//! idempotence.

use atlas_core::types::{
    Era, EvidenceCategory, ObservationRecord, Point, Polygon, TimePeriod,
};
use atlas_engine::aggregate::OccurrenceAggregator;
use atlas_storage::queries::{evidence, grid, last_record, observations};
use atlas_storage::DatabaseManager;

fn square(x0: f64, y0: f64, size: f64) -> Polygon {
    Polygon::new(vec![
        Point::new(x0, y0),
        Point::new(x0 + size, y0),
        Point::new(x0 + size, y0 + size),
        Point::new(x0, y0 + size),
    ])
    .unwrap()
}

fn observation(id: &str, year: i32, month: u8, weight: f64, footprint: Polygon) -> ObservationRecord {
    ObservationRecord {
        record_id: id.to_string(),
        event_date: format!("{year}-{month:02}-15"),
        event_year: year,
        event_month: month,
        weight,
        weight_notes: None,
        footprint,
    }
}

fn setup() -> DatabaseManager {
    let manager = DatabaseManager::open_in_memory().unwrap();
    manager
        .with_writer(|conn| {
            grid::insert_batch(
                conn,
                &[
                    ("H001".to_string(), square(0.0, 0.0, 1000.0)),
                    ("H002".to_string(), square(1000.0, 0.0, 1000.0)),
                ],
            )
            .map(|_| ())
        })
        .unwrap();
    manager
}

const PERIOD: TimePeriod = TimePeriod {
    start_year: 2001,
    end_year: 2005,
};

#[test]
fn weight_sums_and_documented_threshold() {
    let manager = setup();
    manager
        .with_writer(|conn| {
            observations::insert_batch(
                conn,
                &[
                    observation("r1", 2002, 6, 7.0, square(100.0, 100.0, 50.0)),
                    observation("r2", 2003, 6, 5.0, square(200.0, 200.0, 50.0)),
                    // Inside the other tile, under the threshold alone.
                    observation("r3", 2003, 6, 4.0, square(1500.0, 500.0, 50.0)),
                ],
            )
            .map(|_| ())
        })
        .unwrap();

    let aggregator = OccurrenceAggregator::new(10.0, 10.0);
    let weights = aggregator
        .compute(&manager, EvidenceCategory::Presence, 0, PERIOD, Era::Recent)
        .unwrap();
    assert_eq!(weights.unit_weights.len(), 2);
    manager
        .with_writer(|conn| {
            aggregator.commit(conn, &weights).map(|_| ()).map_err(|e| {
                atlas_core::errors::StorageError::SqliteError {
                    message: e.to_string(),
                }
            })
        })
        .unwrap();

    let h1 = manager
        .with_reader(|conn| evidence::get(conn, "H001", EvidenceCategory::Presence, 0))
        .unwrap()
        .unwrap();
    assert_eq!(h1.recent_weight, Some(12.0));
    assert!(h1.documented);

    let h2 = manager
        .with_reader(|conn| evidence::get(conn, "H002", EvidenceCategory::Presence, 0))
        .unwrap()
        .unwrap();
    assert_eq!(h2.recent_weight, Some(4.0));
    assert!(!h2.documented);
}

#[test]
fn straddling_footprint_attributes_to_no_unit() {
    let manager = setup();
    manager
        .with_writer(|conn| {
            // Centered on the tile boundary: each side keeps 50% < 90%.
            observations::insert_batch(
                conn,
                &[observation("r1", 2002, 6, 20.0, square(900.0, 400.0, 200.0))],
            )
            .map(|_| ())
        })
        .unwrap();

    let aggregator = OccurrenceAggregator::new(10.0, 10.0);
    let weights = aggregator
        .compute(&manager, EvidenceCategory::Presence, 0, PERIOD, Era::Recent)
        .unwrap();
    assert!(weights.unit_weights.is_empty());
    assert_eq!(weights.records_used, 0);
}

#[test]
fn generous_tolerance_keeps_straddling_fragments() {
    let manager = setup();
    manager
        .with_writer(|conn| {
            observations::insert_batch(
                conn,
                &[observation("r1", 2002, 6, 20.0, square(900.0, 400.0, 200.0))],
            )
            .map(|_| ())
        })
        .unwrap();

    // 60% tolerance keeps any fragment holding at least 40% of the area.
    let aggregator = OccurrenceAggregator::new(10.0, 60.0);
    let weights = aggregator
        .compute(&manager, EvidenceCategory::Presence, 0, PERIOD, Era::Recent)
        .unwrap();
    assert_eq!(weights.unit_weights.len(), 2);
}

#[test]
fn eras_partition_by_period_start() {
    let manager = setup();
    manager
        .with_writer(|conn| {
            observations::insert_batch(
                conn,
                &[
                    observation("old", 1995, 6, 11.0, square(100.0, 100.0, 50.0)),
                    observation("new", 2002, 6, 11.0, square(100.0, 100.0, 50.0)),
                ],
            )
            .map(|_| ())
        })
        .unwrap();

    let aggregator = OccurrenceAggregator::new(10.0, 10.0);
    let recent = aggregator
        .compute(&manager, EvidenceCategory::Presence, 0, PERIOD, Era::Recent)
        .unwrap();
    let historical = aggregator
        .compute(&manager, EvidenceCategory::Presence, 0, PERIOD, Era::Historical)
        .unwrap();

    assert_eq!(recent.unit_weights, vec![("H001".to_string(), 11.0)]);
    assert_eq!(historical.unit_weights, vec![("H001".to_string(), 11.0)]);

    manager
        .with_writer(|conn| {
            aggregator
                .commit(conn, &historical)
                .map(|_| ())
                .map_err(|e| atlas_core::errors::StorageError::SqliteError {
                    message: e.to_string(),
                })
        })
        .unwrap();
    let row = manager
        .with_reader(|conn| evidence::get(conn, "H001", EvidenceCategory::Presence, 0))
        .unwrap()
        .unwrap();
    assert!(row.previously_documented);
    assert!(!row.documented);
}

#[test]
fn seasonal_month_filter_applies() {
    let manager = setup();
    manager
        .with_writer(|conn| {
            observations::insert_batch(
                conn,
                &[
                    observation("june", 2002, 6, 11.0, square(100.0, 100.0, 50.0)),
                    observation("december", 2002, 12, 11.0, square(100.0, 100.0, 50.0)),
                ],
            )
            .map(|_| ())
        })
        .unwrap();

    let aggregator = OccurrenceAggregator::new(10.0, 10.0);
    let summer = aggregator
        .compute(&manager, EvidenceCategory::Summer, 0, PERIOD, Era::Recent)
        .unwrap();
    let winter = aggregator
        .compute(&manager, EvidenceCategory::Winter, 0, PERIOD, Era::Recent)
        .unwrap();

    assert_eq!(summer.unit_weights, vec![("H001".to_string(), 11.0)]);
    assert_eq!(winter.unit_weights, vec![("H001".to_string(), 11.0)]);
    assert_eq!(summer.records_used, 1);
    assert_eq!(winter.records_used, 1);
}

#[test]
fn last_record_tracks_freshest_attributable_observation() {
    let manager = setup();
    manager
        .with_writer(|conn| {
            observations::insert_batch(
                conn,
                &[
                    observation("old", 2001, 6, 5.0, square(100.0, 100.0, 50.0)),
                    observation("fresh", 2004, 7, 3.0, square(300.0, 300.0, 50.0)),
                    // Straddles the boundary: attributable to neither tile.
                    observation("straddle", 2005, 8, 9.0, square(900.0, 400.0, 200.0)),
                ],
            )
            .map(|_| ())
        })
        .unwrap();

    let aggregator = OccurrenceAggregator::new(10.0, 10.0);
    let written = aggregator
        .build_last_records(&manager, "2006-07-15")
        .unwrap();
    assert_eq!(written, 1);

    let record = manager
        .with_reader(|conn| last_record::get(conn, "H001"))
        .unwrap()
        .unwrap();
    assert_eq!(record.record_id, "fresh");
    assert_eq!(record.event_date, "2004-07-15");
    // 2004-07-15 to 2006-07-15 is 730 days: 104 full weeks.
    assert_eq!(record.age_weeks, 104);
    assert_eq!(record.assessed_date, "2006-07-15");
}

#[test]
fn rerun_on_unchanged_input_is_idempotent() {
    let manager = setup();
    manager
        .with_writer(|conn| {
            observations::insert_batch(
                conn,
                &[observation("r1", 2002, 6, 12.0, square(100.0, 100.0, 50.0))],
            )
            .map(|_| ())
        })
        .unwrap();

    let aggregator = OccurrenceAggregator::new(10.0, 10.0);
    for _ in 0..2 {
        let weights = aggregator
            .compute(&manager, EvidenceCategory::Presence, 0, PERIOD, Era::Recent)
            .unwrap();
        manager
            .with_writer(|conn| {
                aggregator.commit(conn, &weights).map(|_| ()).map_err(|e| {
                    atlas_core::errors::StorageError::SqliteError {
                        message: e.to_string(),
                    }
                })
            })
            .unwrap();
    }

    let rows = manager
        .with_reader(|conn| evidence::rows_for_period(conn, EvidenceCategory::Presence, 0))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].recent_weight, Some(12.0));
    assert!(rows[0].documented);
}
