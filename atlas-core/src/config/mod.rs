//! Configuration system for the atlas compiler.
//! TOML-based, layered resolution: env > project > user > defaults.

pub mod atlas_config;
pub mod evidence_config;
pub mod task_config;

pub use atlas_config::AtlasConfig;
pub use evidence_config::EvidenceConfig;
pub use task_config::TaskConfig;
