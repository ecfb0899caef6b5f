//! Frame providers and consumers around the evaluator.
//!
//! Decoding and encoding real video happens outside this crate; the
//! evaluator only sees these traits.

mod memory;
mod synthetic;

pub use memory::MemoryFrameSink;
pub use synthetic::SyntheticFrameSource;

use async_trait::async_trait;

use crate::core::Frame;
use crate::Result;

/// Decoded frames of the streams involved in a run
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Full converted frame encoded at `quality`
    async fn converted_frame(&self, quality: u32, frame_idx: u64) -> Result<Frame>;

    /// Low-resolution background stream
    async fn background_frame(&self, frame_idx: u64) -> Result<Frame>;

    /// Unprocessed source frame, the quality reference
    async fn source_frame(&self, frame_idx: u64) -> Result<Frame>;
}

/// Destination of rendered viewport frames
#[async_trait]
pub trait FrameSink: Send {
    async fn write_frame(&mut self, frame_idx: u64, frame: &Frame) -> Result<()>;
}
