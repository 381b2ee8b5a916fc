//! Legacy baseline collapse — how the pre-existing classification seeds the
//! first period's code, per evidence category.

use atlas_core::types::code::legacy_season;
use atlas_core::types::{EvidenceCategory, LegacyRecord, PresenceCode};

/// True when the legacy season metadata places the unit in the category's
/// seasonal range.
fn season_matches(category: EvidenceCategory, season: Option<i64>) -> bool {
    let Some(season) = season else { return false };
    match category {
        EvidenceCategory::Summer => {
            season == legacy_season::SUMMER || season == legacy_season::YEAR_ROUND
        }
        EvidenceCategory::Winter => {
            season == legacy_season::WINTER || season == legacy_season::YEAR_ROUND
        }
        EvidenceCategory::YearRound => season == legacy_season::YEAR_ROUND,
        EvidenceCategory::Presence => true,
    }
}

/// The first-period seed a legacy record provides for a category, if any.
///
/// Presence collapses the legacy 1-7 legend: {1,2,3} -> suspected present,
/// {4,5} -> suspected absent; other values provide no seed. Seasonal
/// categories seed suspected present only for units whose legacy season
/// matches the category and whose legacy presence is not 4 or 5.
pub fn legacy_seed(
    category: EvidenceCategory,
    record: &LegacyRecord,
) -> Option<PresenceCode> {
    match category {
        EvidenceCategory::Presence => match record.presence {
            1..=3 => Some(PresenceCode::Suspected),
            4 | 5 => Some(PresenceCode::SuspectedAbsent),
            _ => None,
        },
        EvidenceCategory::Summer | EvidenceCategory::Winter | EvidenceCategory::YearRound => {
            if matches!(record.presence, 4 | 5) {
                return None;
            }
            if season_matches(category, record.season) {
                Some(PresenceCode::Suspected)
            } else {
                None
            }
        }
    }
}
