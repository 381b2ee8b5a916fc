//! Expert opinion records, raw and reconciled.

use serde::{Deserialize, Serialize};

use super::category::EvidenceCategory;

/// The asserted status of an opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpinionStatus {
    Present,
    Absent,
}

impl OpinionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpinionStatus::Present => "present",
            OpinionStatus::Absent => "absent",
        }
    }

    pub fn parse(s: &str) -> Option<OpinionStatus> {
        match s {
            "present" => Some(OpinionStatus::Present),
            "absent" => Some(OpinionStatus::Absent),
            _ => None,
        }
    }
}

/// One expert's assertion for one (unit, year, category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opinion {
    pub unit_key: String,
    pub year: i32,
    pub category: EvidenceCategory,
    pub expert: String,
    pub status: OpinionStatus,
    /// Expert authority, 1-10.
    pub rank: i64,
    /// Expert confidence in this assertion, 1-10.
    pub confidence: i64,
    pub justification: Option<String>,
    /// Submission timestamp, ISO-8601. Later entries supersede earlier ones
    /// from the same expert.
    pub entry_time: String,
}

impl Opinion {
    /// Authority-weighted confidence: rank x confidence / 10, in (0.1, 10].
    pub fn weight(&self) -> f64 {
        self.rank as f64 * self.confidence as f64 / 10.0
    }
}

/// The single reconciled opinion per (unit, year, category) after the
/// cleanup and cross-category adjustment passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedOpinion {
    pub unit_key: String,
    pub year: i32,
    pub category: EvidenceCategory,
    pub status: OpinionStatus,
    pub weight: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_is_rank_times_confidence_over_ten() {
        let op = Opinion {
            unit_key: "U1".to_string(),
            year: 2003,
            category: EvidenceCategory::Presence,
            expert: "e1".to_string(),
            status: OpinionStatus::Present,
            rank: 6,
            confidence: 6,
            justification: None,
            entry_time: "2021-01-01T00:00:00".to_string(),
        };
        assert!((op.weight() - 3.6).abs() < 1e-12);
    }
}
