//! Assignment tests against the store: seeding, precedence, persistence.

use atlas_core::types::{
    EvidenceCategory, LegacyRecord, OpinionStatus, PeriodSet, PresenceCode, TimePeriod,
};
use atlas_engine::assign::CodeAssigner;
use atlas_storage::queries::evidence;
use atlas_storage::DatabaseManager;

fn periods(n: usize) -> PeriodSet {
    PeriodSet::new(
        (0..n as i32)
            .map(|i| TimePeriod::new(2001 + i * 5, 2005 + i * 5))
            .collect(),
    )
    .unwrap()
}

fn legacy(unit: &str, presence: i64, season: Option<i64>) -> LegacyRecord {
    LegacyRecord {
        unit_key: unit.to_string(),
        presence,
        origin: None,
        reproduction: None,
        season,
    }
}

fn code_of(
    manager: &DatabaseManager,
    unit: &str,
    category: EvidenceCategory,
    period: usize,
) -> Option<PresenceCode> {
    manager
        .with_reader(|conn| evidence::get(conn, unit, category, period))
        .unwrap()
        .and_then(|row| row.presence_code)
}

#[test]
fn legacy_seeds_first_period_and_persists() {
    let manager = DatabaseManager::open_in_memory().unwrap();
    let periods = periods(3);
    let assigner = CodeAssigner::new(
        &manager,
        &periods,
        vec![legacy("U1", 2, None), legacy("U9", 5, None)],
    );
    let total = assigner.assign_category(EvidenceCategory::Presence).unwrap();
    // Two units coded in each of three periods.
    assert_eq!(total, 6);

    // Legacy {1,2,3} collapses to 3; {4,5} to 4.
    assert_eq!(code_of(&manager, "U1", EvidenceCategory::Presence, 0),
               Some(PresenceCode::Suspected));
    assert_eq!(code_of(&manager, "U9", EvidenceCategory::Presence, 0),
               Some(PresenceCode::SuspectedAbsent));

    // Absent new evidence, codes persist value-preservingly.
    for period in 1..3 {
        assert_eq!(code_of(&manager, "U1", EvidenceCategory::Presence, period),
                   Some(PresenceCode::Suspected));
        assert_eq!(code_of(&manager, "U9", EvidenceCategory::Presence, period),
                   Some(PresenceCode::SuspectedAbsent));
    }
}

#[test]
fn documented_code_persists_into_later_periods() {
    let manager = DatabaseManager::open_in_memory().unwrap();
    let periods = periods(2);
    manager
        .with_writer(|conn| {
            evidence::set_recent_weight(conn, "U3", EvidenceCategory::Presence, 0, 12.0, true)
        })
        .unwrap();

    let assigner = CodeAssigner::new(&manager, &periods, vec![]);
    assigner.assign_category(EvidenceCategory::Presence).unwrap();

    assert_eq!(code_of(&manager, "U3", EvidenceCategory::Presence, 0),
               Some(PresenceCode::Confirmed));
    // The recurrence is a value-preserving copy: 1 stays 1.
    assert_eq!(code_of(&manager, "U3", EvidenceCategory::Presence, 1),
               Some(PresenceCode::Confirmed));
}

#[test]
fn opinion_only_unit_gets_suspected_code() {
    let manager = DatabaseManager::open_in_memory().unwrap();
    let periods = periods(1);
    manager
        .with_writer(|conn| {
            evidence::set_opinion(
                conn,
                "U2",
                EvidenceCategory::Presence,
                0,
                OpinionStatus::Present,
                3.6,
            )
        })
        .unwrap();

    let assigner = CodeAssigner::new(&manager, &periods, vec![]);
    assigner.assign_category(EvidenceCategory::Presence).unwrap();
    assert_eq!(code_of(&manager, "U2", EvidenceCategory::Presence, 0),
               Some(PresenceCode::Suspected));
}

#[test]
fn occurrence_override_beats_strong_contrary_opinion() {
    let manager = DatabaseManager::open_in_memory().unwrap();
    let periods = periods(1);
    manager
        .with_writer(|conn| {
            evidence::set_recent_weight(conn, "U1", EvidenceCategory::Presence, 0, 15.0, true)?;
            evidence::set_opinion(
                conn,
                "U1",
                EvidenceCategory::Presence,
                0,
                OpinionStatus::Absent,
                9.9,
            )
        })
        .unwrap();

    let assigner = CodeAssigner::new(&manager, &periods, vec![legacy("U1", 5, None)]);
    assigner.assign_category(EvidenceCategory::Presence).unwrap();
    // documented = true forces 1 regardless of opinion and legacy.
    assert_eq!(code_of(&manager, "U1", EvidenceCategory::Presence, 0),
               Some(PresenceCode::Confirmed));
}

#[test]
fn strong_opinion_overrides_prior_period_code() {
    let manager = DatabaseManager::open_in_memory().unwrap();
    let periods = periods(2);
    manager
        .with_writer(|conn| {
            evidence::set_opinion(
                conn,
                "U1",
                EvidenceCategory::Presence,
                1,
                OpinionStatus::Absent,
                8.5,
            )
        })
        .unwrap();

    let assigner = CodeAssigner::new(&manager, &periods, vec![legacy("U1", 1, None)]);
    assigner.assign_category(EvidenceCategory::Presence).unwrap();

    assert_eq!(code_of(&manager, "U1", EvidenceCategory::Presence, 0),
               Some(PresenceCode::Suspected));
    // Weight 8.5 > 8.0 strengthens the override to likely absent.
    assert_eq!(code_of(&manager, "U1", EvidenceCategory::Presence, 1),
               Some(PresenceCode::LikelyAbsent));
}

#[test]
fn seasonal_legacy_seeding_respects_season_metadata() {
    let manager = DatabaseManager::open_in_memory().unwrap();
    let periods = periods(1);
    let records = vec![
        legacy("Uyr", 1, Some(1)),  // year-round
        legacy("Usm", 1, Some(4)),  // summer
        legacy("Uwt", 1, Some(3)),  // winter
        legacy("Uab", 4, Some(1)),  // absent presence blocks seasonal seed
    ];

    for category in EvidenceCategory::SEASONAL {
        let assigner = CodeAssigner::new(&manager, &periods, records.clone());
        assigner.assign_category(category).unwrap();
    }

    assert_eq!(code_of(&manager, "Uyr", EvidenceCategory::Summer, 0),
               Some(PresenceCode::Suspected));
    assert_eq!(code_of(&manager, "Uyr", EvidenceCategory::Winter, 0),
               Some(PresenceCode::Suspected));
    assert_eq!(code_of(&manager, "Uyr", EvidenceCategory::YearRound, 0),
               Some(PresenceCode::Suspected));

    assert_eq!(code_of(&manager, "Usm", EvidenceCategory::Summer, 0),
               Some(PresenceCode::Suspected));
    assert_eq!(code_of(&manager, "Usm", EvidenceCategory::Winter, 0), None);

    assert_eq!(code_of(&manager, "Uwt", EvidenceCategory::Winter, 0),
               Some(PresenceCode::Suspected));
    assert_eq!(code_of(&manager, "Uwt", EvidenceCategory::YearRound, 0), None);

    for category in EvidenceCategory::SEASONAL {
        assert_eq!(code_of(&manager, "Uab", category, 0), None);
    }
}
