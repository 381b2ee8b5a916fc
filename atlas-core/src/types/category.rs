//! Evidence categories: overall presence plus the three seasonal ranges.

use serde::{Deserialize, Serialize};

/// The four evidence categories a compilation can produce codes for.
///
/// `Presence` is the overall presence/absence map; the other three are
/// seasonal range maps. Categories are not independent: the opinion
/// reconciler's cross-category inference and the code adjuster's seasonal
/// demotion rule both distinguish `Presence` from the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceCategory {
    Presence,
    Summer,
    Winter,
    YearRound,
}

impl EvidenceCategory {
    /// All categories in the fixed processing order: presence first, then the
    /// seasonal categories in the order the reconciler visits them.
    pub const ALL: [EvidenceCategory; 4] = [
        EvidenceCategory::Presence,
        EvidenceCategory::Summer,
        EvidenceCategory::Winter,
        EvidenceCategory::YearRound,
    ];

    /// The seasonal categories (everything except `Presence`).
    pub const SEASONAL: [EvidenceCategory; 3] = [
        EvidenceCategory::Summer,
        EvidenceCategory::Winter,
        EvidenceCategory::YearRound,
    ];

    /// Stable string key used in the store and in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceCategory::Presence => "presence",
            EvidenceCategory::Summer => "summer",
            EvidenceCategory::Winter => "winter",
            EvidenceCategory::YearRound => "year_round",
        }
    }

    /// Parse a stable string key back into a category.
    pub fn parse(s: &str) -> Option<EvidenceCategory> {
        match s {
            "presence" => Some(EvidenceCategory::Presence),
            "summer" => Some(EvidenceCategory::Summer),
            "winter" => Some(EvidenceCategory::Winter),
            "year_round" => Some(EvidenceCategory::YearRound),
            _ => None,
        }
    }

    /// True for the three seasonal range categories.
    pub fn is_seasonal(&self) -> bool {
        !matches!(self, EvidenceCategory::Presence)
    }

    /// Month-of-year filter applied when selecting observations for this
    /// category. `None` means all months participate.
    pub fn month_filter(&self) -> Option<&'static [u8]> {
        match self {
            EvidenceCategory::Summer => Some(&[5, 6, 7]),
            EvidenceCategory::Winter => Some(&[12, 1, 2]),
            EvidenceCategory::Presence | EvidenceCategory::YearRound => None,
        }
    }
}

impl std::fmt::Display for EvidenceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        for cat in EvidenceCategory::ALL {
            assert_eq!(EvidenceCategory::parse(cat.as_str()), Some(cat));
        }
        assert_eq!(EvidenceCategory::parse("autumn"), None);
    }

    #[test]
    fn month_filters() {
        assert_eq!(EvidenceCategory::Summer.month_filter(), Some(&[5u8, 6, 7][..]));
        assert_eq!(EvidenceCategory::Winter.month_filter(), Some(&[12u8, 1, 2][..]));
        assert!(EvidenceCategory::Presence.month_filter().is_none());
        assert!(EvidenceCategory::YearRound.month_filter().is_none());
    }
}
