//! The assignment stages as an explicit ordered list of pure functions.
//!
//! Stage order is the precedence order: seeding, then the opinion override,
//! then the occurrence override. A later stage may overwrite an earlier
//! stage's code, never the other way around.

use atlas_core::types::{OpinionStatus, PresenceCode};

/// Everything knowable about one unit when assigning a period's code.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitState {
    pub unit_key: String,
    /// Whether this is the first period (legacy-seeded) of the sequence.
    pub first_period: bool,
    /// The legacy baseline seed for this category, if the unit has one.
    pub legacy_seed: Option<PresenceCode>,
    /// The previous period's assigned code.
    pub previous_code: Option<PresenceCode>,
    /// The projected opinion for this period.
    pub opinion: Option<(OpinionStatus, f64)>,
    /// The documented flag for this period.
    pub documented: bool,
    /// The code being assigned; None until a stage produces one.
    pub code: Option<PresenceCode>,
}

pub type Stage = fn(UnitState) -> UnitState;

/// Seeding: the first period starts from the legacy baseline; later periods
/// copy the previous period's code value-preservingly.
pub fn seed_stage(mut state: UnitState) -> UnitState {
    state.code = if state.first_period {
        state.legacy_seed
    } else {
        state.previous_code
    };
    state
}

/// Opinion override. With no legacy seed, no previous code, and no
/// documentation, any opinion sets a suspected code. A weight above 2.0
/// overrides unconditionally; above 8.0 it strengthens to likely.
pub fn opinion_stage(mut state: UnitState) -> UnitState {
    let Some((status, weight)) = state.opinion else {
        return state;
    };

    if state.legacy_seed.is_none() && state.previous_code.is_none() && !state.documented {
        state.code = Some(match status {
            OpinionStatus::Present => PresenceCode::Suspected,
            OpinionStatus::Absent => PresenceCode::SuspectedAbsent,
        });
    }
    if weight > 2.0 {
        state.code = Some(match status {
            OpinionStatus::Present => PresenceCode::Suspected,
            OpinionStatus::Absent => PresenceCode::SuspectedAbsent,
        });
    }
    if weight > 8.0 {
        state.code = Some(match status {
            OpinionStatus::Present => PresenceCode::Likely,
            OpinionStatus::Absent => PresenceCode::LikelyAbsent,
        });
    }
    state
}

/// Occurrence override: documented observation evidence is the
/// highest-authority signal and forces code 1.
pub fn occurrence_stage(mut state: UnitState) -> UnitState {
    if state.documented {
        state.code = Some(PresenceCode::Confirmed);
    }
    state
}

/// The precedence order, as data.
pub const STAGES: [Stage; 3] = [seed_stage, opinion_stage, occurrence_stage];

/// Apply every stage in precedence order.
pub fn apply_stages(state: UnitState) -> UnitState {
    STAGES.iter().fold(state, |state, stage| stage(state))
}
