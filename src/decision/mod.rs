//! Motion window and decision loop.

pub mod engine;
pub mod window;

pub use engine::{DecisionEngine, DecisionTiming};
pub use window::{HistoricalWindow, TimedSample};
