pub mod approach;
pub mod arrival;
pub mod config;
pub mod core;
pub mod decision;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod frames;
pub mod logging;
pub mod observability;
pub mod projection;
pub mod registry;
pub mod trace;

pub use error::{Result, SimError};
