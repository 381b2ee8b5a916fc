//! Evidence thresholds — the policy knobs of the compilation.

use serde::{Deserialize, Serialize};

/// Thresholds governing how observation evidence is weighed.
///
/// All three are policy constants, not physical laws, so they are exposed as
/// configuration with validated defaults rather than hard-coded.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EvidenceConfig {
    /// Summed occurrence weight at which a unit counts as documented.
    /// Default: 10.0.
    pub documented_weight_threshold: Option<f64>,
    /// Distance in meters beyond which an isolated documented unit is
    /// flagged extralimital. Default: 40 000.
    pub extralimital_cutoff_m: Option<f64>,
    /// Per-species error tolerance, percent of a footprint's area allowed to
    /// fall outside a unit before the overlap is discarded. Default: 10.0.
    pub error_tolerance_pct: Option<f64>,
}

impl EvidenceConfig {
    /// Effective documented-weight threshold, defaulting to 10.0.
    pub fn effective_documented_threshold(&self) -> f64 {
        self.documented_weight_threshold.unwrap_or(10.0)
    }

    /// Effective extralimital cutoff in meters, defaulting to 40 000.
    pub fn effective_extralimital_cutoff_m(&self) -> f64 {
        self.extralimital_cutoff_m.unwrap_or(40_000.0)
    }

    /// Effective error tolerance percentage, defaulting to 10.0.
    pub fn effective_error_tolerance_pct(&self) -> f64 {
        self.error_tolerance_pct.unwrap_or(10.0)
    }
}
