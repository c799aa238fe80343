//! Local task manager core: a single-reducer task engine with derived
//! analytics, one level of undo, and defensive persistence.

pub mod analytics;
pub mod app;
pub mod clock;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod persistence;

pub use app::App;
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{reduce, Action, EngineState};
pub use error::StorageError;
