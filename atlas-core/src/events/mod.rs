//! Compile lifecycle events.
//!
//! The pipeline driver emits these so hosts can observe progress without the
//! engine depending on any particular sink.

pub mod dispatcher;
pub mod handler;
pub mod types;

pub use dispatcher::EventDispatcher;
pub use handler::CompileEventHandler;
pub use types::*;
