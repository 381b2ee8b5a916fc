//! atlas-storage — the SQLite evidence store.
//!
//! Holds every shared mutable table of the compilation: the reference grid,
//! spatial units, observations, opinions (raw and reconciled), the legacy
//! baseline, and the per-(unit, category, period) evidence map. All writes go
//! through a single serialized writer; reads go through a round-robin pool.

pub mod connection;
pub mod migrations;
pub mod queries;

pub use connection::{BatchWriter, DatabaseManager};
