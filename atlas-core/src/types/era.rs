//! Eras — the recent/historical partition of observation evidence.

use serde::{Deserialize, Serialize};

use super::period::TimePeriod;

/// Partition of observation evidence relative to a period's start year.
///
/// `Recent` evidence feeds the documented flag; `Historical` evidence feeds
/// the previously-documented flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Era {
    Recent,
    Historical,
}

impl Era {
    pub const BOTH: [Era; 2] = [Era::Recent, Era::Historical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Era::Recent => "recent",
            Era::Historical => "historical",
        }
    }

    /// True if an event in `year` belongs to this era relative to `period`.
    /// Recent: within the inclusive window. Historical: strictly before the
    /// window's start year.
    pub fn matches_year(&self, period: TimePeriod, year: i32) -> bool {
        match self {
            Era::Recent => period.contains_year(year),
            Era::Historical => year < period.start_year,
        }
    }
}

impl std::fmt::Display for Era {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn era_year_predicates() {
        let p = TimePeriod::new(2006, 2010);
        assert!(Era::Recent.matches_year(p, 2006));
        assert!(Era::Recent.matches_year(p, 2010));
        assert!(!Era::Recent.matches_year(p, 2005));
        assert!(Era::Historical.matches_year(p, 2005));
        assert!(!Era::Historical.matches_year(p, 2006));
    }
}
