//! Presence codes and the legacy baseline record.

use serde::{Deserialize, Serialize};

/// The ordinal presence code assigned per (unit, category, period).
/// Lower values mean stronger presence evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(i64)]
pub enum PresenceCode {
    /// 1 — confirmed by documented observation evidence.
    Confirmed = 1,
    /// 2 — likely present.
    Likely = 2,
    /// 3 — suspected present.
    Suspected = 3,
    /// 4 — suspected absent.
    SuspectedAbsent = 4,
    /// 5 — likely absent.
    LikelyAbsent = 5,
}

impl PresenceCode {
    pub fn as_i64(&self) -> i64 {
        *self as i64
    }

    pub fn from_i64(value: i64) -> Option<PresenceCode> {
        match value {
            1 => Some(PresenceCode::Confirmed),
            2 => Some(PresenceCode::Likely),
            3 => Some(PresenceCode::Suspected),
            4 => Some(PresenceCode::SuspectedAbsent),
            5 => Some(PresenceCode::LikelyAbsent),
            _ => None,
        }
    }

    /// Codes 1-3 count as present for range membership purposes.
    pub fn is_present(&self) -> bool {
        matches!(
            self,
            PresenceCode::Confirmed | PresenceCode::Likely | PresenceCode::Suspected
        )
    }
}

impl std::fmt::Display for PresenceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PresenceCode::Confirmed => "confirmed present",
            PresenceCode::Likely => "likely present",
            PresenceCode::Suspected => "suspected present",
            PresenceCode::SuspectedAbsent => "suspected absent",
            PresenceCode::LikelyAbsent => "likely absent",
        };
        f.write_str(label)
    }
}

/// Legacy season codes as delivered by the baseline feed.
/// Only the values the seeding rules inspect are named.
pub mod legacy_season {
    pub const YEAR_ROUND: i64 = 1;
    pub const WINTER: i64 = 3;
    pub const SUMMER: i64 = 4;
}

/// The one-time baseline classification for a spatial unit, consumed
/// read-only by the first period's seeding rules.
///
/// `presence` uses the legacy 1-7 legend (1 known/extant ... 7 unknown);
/// `season` uses the legacy 1-8 legend. Origin and reproduction ride along
/// as metadata and are not consulted by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyRecord {
    pub unit_key: String,
    pub presence: i64,
    pub origin: Option<i64>,
    pub reproduction: Option<i64>,
    pub season: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip() {
        for v in 1..=5 {
            assert_eq!(PresenceCode::from_i64(v).unwrap().as_i64(), v);
        }
        assert!(PresenceCode::from_i64(0).is_none());
        assert!(PresenceCode::from_i64(6).is_none());
    }

    #[test]
    fn present_is_codes_one_through_three() {
        assert!(PresenceCode::Confirmed.is_present());
        assert!(PresenceCode::Likely.is_present());
        assert!(PresenceCode::Suspected.is_present());
        assert!(!PresenceCode::SuspectedAbsent.is_present());
        assert!(!PresenceCode::LikelyAbsent.is_present());
    }
}
