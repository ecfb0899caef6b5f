use async_trait::async_trait;
use std::collections::BTreeMap;

use super::FrameSink;
use crate::core::Frame;
use crate::Result;

/// Keeps every written frame, last write per index wins
#[derive(Debug, Default)]
pub struct MemoryFrameSink {
    frames: BTreeMap<u64, Frame>,
}

impl MemoryFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, frame_idx: u64) -> Option<&Frame> {
        self.frames.get(&frame_idx)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.frames.keys().copied()
    }
}

#[async_trait]
impl FrameSink for MemoryFrameSink {
    async fn write_frame(&mut self, frame_idx: u64, frame: &Frame) -> Result<()> {
        self.frames.insert(frame_idx, frame.clone());
        Ok(())
    }
}
