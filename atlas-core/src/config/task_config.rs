//! Per-task compilation parameters: periods, categories, source toggles.

use serde::{Deserialize, Serialize};

use crate::types::{EvidenceCategory, PeriodSet, TimePeriod};

/// Parameters describing one compilation task.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TaskConfig {
    /// Ordered inclusive `[start_year, end_year]` windows. Required.
    pub periods: Vec<[i32; 2]>,
    /// Evidence categories to compile. Empty means all four.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Months of the year whose observations participate at all.
    /// Empty means every month.
    #[serde(default)]
    pub months: Vec<u8>,
    /// Use the occurrence observation source. Default: true.
    pub use_observations: Option<bool>,
    /// Use the expert opinion source. Default: true.
    pub use_opinions: Option<bool>,
    /// Use the legacy baseline. Default: true.
    pub use_legacy: Option<bool>,
}

impl TaskConfig {
    /// The validated period set. `None` if the list is empty, unordered, or
    /// overlapping; callers surface that as a validation failure.
    pub fn period_set(&self) -> Option<PeriodSet> {
        PeriodSet::new(
            self.periods
                .iter()
                .map(|&[start, end]| TimePeriod::new(start, end))
                .collect(),
        )
    }

    /// Enabled categories in fixed processing order, presence first.
    /// Unknown names are reported by `validate`, not silently dropped here.
    pub fn enabled_categories(&self) -> Vec<EvidenceCategory> {
        if self.categories.is_empty() {
            return EvidenceCategory::ALL.to_vec();
        }
        let requested: Vec<EvidenceCategory> = self
            .categories
            .iter()
            .filter_map(|name| EvidenceCategory::parse(name))
            .collect();
        EvidenceCategory::ALL
            .into_iter()
            .filter(|cat| requested.contains(cat))
            .collect()
    }

    /// True when observations for `month` participate in the compilation.
    pub fn month_enabled(&self, month: u8) -> bool {
        self.months.is_empty() || self.months.contains(&month)
    }

    pub fn effective_use_observations(&self) -> bool {
        self.use_observations.unwrap_or(true)
    }

    pub fn effective_use_opinions(&self) -> bool {
        self.use_opinions.unwrap_or(true)
    }

    pub fn effective_use_legacy(&self) -> bool {
        self.use_legacy.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_resolve_in_fixed_order() {
        let config = TaskConfig {
            categories: vec!["winter".to_string(), "presence".to_string()],
            ..TaskConfig::default()
        };
        assert_eq!(
            config.enabled_categories(),
            vec![EvidenceCategory::Presence, EvidenceCategory::Winter]
        );
    }

    #[test]
    fn empty_categories_means_all() {
        let config = TaskConfig::default();
        assert_eq!(config.enabled_categories().len(), 4);
    }

    #[test]
    fn empty_months_enables_all() {
        let config = TaskConfig::default();
        assert!(config.month_enabled(1));
        let limited = TaskConfig {
            months: vec![5, 6, 7],
            ..TaskConfig::default()
        };
        assert!(limited.month_enabled(6));
        assert!(!limited.month_enabled(12));
    }
}
