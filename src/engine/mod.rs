//! The single authority over task state: a closed set of [`Action`]s and a
//! pure transition function.

pub mod action;
pub mod reducer;

pub use action::Action;
pub use reducer::{reduce, EngineState};
