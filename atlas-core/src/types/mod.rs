//! Domain types shared by the storage layer and the engine.

pub mod category;
pub mod code;
pub mod era;
pub mod geometry;
pub mod observation;
pub mod opinion;
pub mod period;

pub use category::EvidenceCategory;
pub use code::{LegacyRecord, PresenceCode};
pub use era::Era;
pub use geometry::{BoundingBox, Point, Polygon};
pub use observation::ObservationRecord;
pub use opinion::{AdjustedOpinion, Opinion, OpinionStatus};
pub use period::{PeriodIndex, PeriodSet, TimePeriod};
