//! Recorded inputs: head motion, bandwidth and encoded sizes.

pub mod motion;
pub mod network;
pub mod sizes;

pub use motion::{interpolate, read_head_trace};
pub use network::{NetworkCursor, NetworkSegment, NetworkTrace, Transfer};
pub use sizes::SizeTable;
