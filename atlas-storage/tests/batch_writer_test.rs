//! Tests for the single-writer batch actor: completeness and serialization.

use std::sync::Arc;

use atlas_core::types::EvidenceCategory;
use atlas_storage::queries::evidence;
use atlas_storage::{BatchWriter, DatabaseManager};

#[test]
fn all_submitted_writes_land() {
    let manager = Arc::new(DatabaseManager::open_in_memory().unwrap());
    let writer = BatchWriter::spawn(manager.clone());

    for i in 0..50 {
        let unit = format!("U{i:03}");
        writer
            .submit(move |conn| {
                evidence::set_recent_weight(
                    conn,
                    &unit,
                    EvidenceCategory::Presence,
                    0,
                    i as f64,
                    false,
                )
            })
            .unwrap();
    }
    let failures = writer.shutdown().unwrap();
    assert_eq!(failures, 0);

    let count = manager.with_reader(evidence::count).unwrap();
    assert_eq!(count, 50);
}

#[test]
fn parallel_producers_serialize_through_the_actor() {
    let manager = Arc::new(DatabaseManager::open_in_memory().unwrap());
    let writer = Arc::new(BatchWriter::spawn(manager.clone()));

    let mut handles = Vec::new();
    for t in 0..4 {
        let writer = writer.clone();
        handles.push(std::thread::spawn(move || {
            for i in 0..25 {
                let unit = format!("T{t}-U{i:02}");
                writer
                    .submit(move |conn| {
                        evidence::set_recent_weight(
                            conn,
                            &unit,
                            EvidenceCategory::Presence,
                            0,
                            1.0,
                            false,
                        )
                    })
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    let writer = Arc::into_inner(writer).expect("all producers done");
    assert_eq!(writer.shutdown().unwrap(), 0);

    let count = manager.with_reader(evidence::count).unwrap();
    assert_eq!(count, 100);
}

#[test]
fn failed_ops_are_counted_not_fatal() {
    let manager = Arc::new(DatabaseManager::open_in_memory().unwrap());
    let writer = BatchWriter::spawn(manager.clone());

    writer
        .submit(|conn| {
            conn.execute("INSERT INTO no_such_table VALUES (1)", [])
                .map_err(|e| atlas_core::errors::StorageError::SqliteError {
                    message: e.to_string(),
                })
                .map(|_| ())
        })
        .unwrap();
    writer
        .submit(|conn| {
            evidence::set_recent_weight(conn, "U1", EvidenceCategory::Presence, 0, 2.0, false)
        })
        .unwrap();

    assert_eq!(writer.shutdown().unwrap(), 1);
    let count = manager.with_reader(evidence::count).unwrap();
    assert_eq!(count, 1);
}
