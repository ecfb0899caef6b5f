//! Chunk-boundary decision loop.

use crate::approach::{Approach, DecisionContext};
use crate::config::{DecisionLocation, SimConfig};
use crate::core::{DecisionRecord, MotionSample, TileChoice};
use crate::projection::{SamplingSize, TileProjection};
use crate::{Result, SimError};

use super::window::HistoricalWindow;

/// Timing parameters of the decision loop, all in milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionTiming {
    pub chunk_ms: u64,
    pub video_duration_ms: u64,
    pub pre_download_ms: u64,
    pub decision_delay_ms: u64,
    pub hw_size_ms: u64,
    pub pw_size: u32,
    /// Shift applied to motion timestamps before they enter the window
    pub motion_delay_ms: f64,
}

impl DecisionTiming {
    pub fn from_config(config: &SimConfig) -> Result<Self> {
        let location: DecisionLocation = config.method.location()?;
        Ok(Self {
            chunk_ms: config.video.chunk_ms(),
            video_duration_ms: config.video.duration_ms(),
            pre_download_ms: config.method.pre_download_ms(),
            decision_delay_ms: config.method.decision_delay,
            hw_size_ms: config.method.hw_size_ms(),
            pw_size: config.method.pw_size,
            motion_delay_ms: location.motion_delay(config.network.rtt),
        })
    }

    fn chunk_count(&self) -> u64 {
        self.video_duration_ms / self.chunk_ms
    }
}

/// Turns a motion stream into the decision log.
///
/// Feed samples with [`push`](Self::push) and poll [`decide`](Self::decide)
/// after each one.
pub struct DecisionEngine {
    approach: Box<dyn Approach>,
    projection: TileProjection,
    sampling: SamplingSize,
    quality_list: Vec<u32>,
    background: bool,
    timing: DecisionTiming,
    window: HistoricalWindow,
    base_ts: Option<f64>,
    next_idx: u64,
    carry_over: Vec<TileChoice>,
}

impl DecisionEngine {
    pub fn new(
        approach: Box<dyn Approach>,
        projection: TileProjection,
        sampling: SamplingSize,
        quality_list: Vec<u32>,
        background: bool,
        timing: DecisionTiming,
    ) -> Result<Self> {
        if timing.chunk_ms == 0 || timing.video_duration_ms % timing.chunk_ms != 0 {
            return Err(SimError::config("video duration must be a whole number of chunks"));
        }
        if timing.pre_download_ms % timing.chunk_ms != 0 {
            return Err(SimError::config(format!(
                "pre_download_duration {}ms is not a multiple of chunk_duration {}ms",
                timing.pre_download_ms, timing.chunk_ms
            )));
        }
        if quality_list.is_empty() {
            return Err(SimError::config("quality_list must not be empty"));
        }

        Ok(Self {
            approach,
            projection,
            sampling,
            quality_list,
            background,
            window: HistoricalWindow::new(timing.hw_size_ms),
            base_ts: None,
            next_idx: timing.pre_download_ms / timing.chunk_ms,
            carry_over: Vec::new(),
            timing,
        })
    }

    /// Build from a validated configuration
    pub fn from_config(config: &SimConfig, approach: Box<dyn Approach>) -> Result<Self> {
        let projection = TileProjection::new(
            config.video.converted.projection,
            config.video.converted.resolution(),
            config.method.tile_grid(),
            config.metric.fov(),
        );
        Self::new(
            approach,
            projection,
            config.metric.decision_sampling(),
            config.video.converted.quality_list.clone(),
            config.method.background.enabled,
            DecisionTiming::from_config(config)?,
        )
    }

    pub fn push(&mut self, motion: MotionSample) {
        let ts = motion.timestamp as f64 + self.timing.motion_delay_ms;
        self.base_ts.get_or_insert(ts);
        self.window.push(ts, motion);
    }

    pub fn window(&self) -> &HistoricalWindow {
        &self.window
    }

    pub fn next_chunk(&self) -> u64 {
        self.next_idx
    }

    /// Hand the approach on to the evaluation stage
    pub fn into_approach(self) -> Box<dyn Approach> {
        self.approach
    }

    pub fn is_done(&self) -> bool {
        self.next_idx >= self.timing.chunk_count()
    }

    /// Run one decision cycle.
    ///
    /// Tiles picked by every cycle accumulate until the next chunk boundary,
    /// where one record per prediction-window chunk is emitted carrying the
    /// accumulated set.
    pub fn decide(&mut self) -> Result<Vec<DecisionRecord>> {
        if self.is_done() {
            return Ok(Vec::new());
        }
        let (Some(base_ts), Some(latest)) = (self.base_ts, self.window.back().map(|s| s.ts)) else {
            return Ok(Vec::new());
        };

        let ctx = DecisionContext {
            chunk_idx: self.next_idx as u32,
            projection: &self.projection,
            sampling: self.sampling,
            quality_list: &self.quality_list,
            background: self.background,
        };
        let predicted = self.approach.predict_motion(&self.window, self.timing.pw_size);
        let tiles = self.approach.tile_decision(&predicted, &ctx);
        let bitrates = self.approach.bitrate_decision(&tiles, &ctx);
        if tiles.len() != bitrates.len() {
            return Err(SimError::malformed(
                "bitrate decision",
                format!("{} tiles but {} bitrates", tiles.len(), bitrates.len()),
            ));
        }

        for (tile_idx, bitrate) in tiles.into_iter().zip(bitrates) {
            if !self.carry_over.iter().any(|c| c.tile_idx == tile_idx) {
                self.carry_over.push(TileChoice { tile_idx, bitrate });
            }
        }

        let boundary = base_ts + (self.next_idx * self.timing.chunk_ms) as f64
            - self.timing.decision_delay_ms as f64;
        if latest < boundary {
            return Ok(Vec::new());
        }

        let mut records = Vec::with_capacity(self.timing.pw_size as usize);
        for _ in 0..self.timing.pw_size {
            if self.is_done() {
                break;
            }
            tracing::debug!(
                chunk = self.next_idx,
                system_ts = latest,
                tiles = self.carry_over.len(),
                "decision"
            );
            records.push(DecisionRecord {
                chunk_idx: self.next_idx as u32,
                system_ts: latest,
                tiles: self.carry_over.clone(),
            });
            self.next_idx += 1;
        }
        self.carry_over.clear();
        Ok(records)
    }

    /// Drain a whole motion trace into the decision log
    pub fn run(&mut self, motion: &[MotionSample]) -> Result<Vec<DecisionRecord>> {
        let mut log = Vec::new();
        for sample in motion {
            self.push(*sample);
            log.extend(self.decide()?);
            if self.is_done() {
                break;
            }
        }
        tracing::info!(records = log.len(), next_chunk = self.next_idx, "decision stage finished");
        Ok(log)
    }
}
