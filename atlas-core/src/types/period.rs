//! Time periods — the ordered multi-year windows evidence is compiled over.

use serde::{Deserialize, Serialize};

/// Index of a period within a [`PeriodSet`]. Period 0 is seeded from the
/// legacy baseline; period `i > 0` is seeded from period `i - 1`.
pub type PeriodIndex = usize;

/// An inclusive multi-year window, e.g. `(2001, 2005)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimePeriod {
    pub start_year: i32,
    pub end_year: i32,
}

impl TimePeriod {
    pub fn new(start_year: i32, end_year: i32) -> Self {
        Self { start_year, end_year }
    }

    /// True if `year` falls inside the inclusive window.
    pub fn contains_year(&self, year: i32) -> bool {
        year >= self.start_year && year <= self.end_year
    }
}

impl std::fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start_year, self.end_year)
    }
}

/// The ordered, non-overlapping sequence of periods spanning the assessment
/// horizon. Validated on construction; iteration order is assignment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSet {
    periods: Vec<TimePeriod>,
}

impl PeriodSet {
    /// Build a period set, validating order and non-overlap.
    /// Returns `None` for an empty list, a window with `end < start`, or a
    /// period that starts at or before its predecessor's end.
    pub fn new(periods: Vec<TimePeriod>) -> Option<Self> {
        if periods.is_empty() {
            return None;
        }
        for p in &periods {
            if p.end_year < p.start_year {
                return None;
            }
        }
        for pair in periods.windows(2) {
            if pair[1].start_year <= pair[0].end_year {
                return None;
            }
        }
        Some(Self { periods })
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn get(&self, index: PeriodIndex) -> Option<TimePeriod> {
        self.periods.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PeriodIndex, TimePeriod)> + '_ {
        self.periods.iter().copied().enumerate()
    }

    pub fn first_index(&self) -> PeriodIndex {
        0
    }

    pub fn last_index(&self) -> PeriodIndex {
        self.periods.len() - 1
    }

    /// Inclusive year range covered by all periods.
    pub fn year_span(&self) -> (i32, i32) {
        (
            self.periods[0].start_year,
            self.periods[self.periods.len() - 1].end_year,
        )
    }
}
