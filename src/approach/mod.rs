//! Streaming strategies.
//!
//! An approach answers four questions for the simulation: where the viewer
//! will look, which tiles to fetch, at which quality, and where each viewport
//! sample reads from the delivered tiles. Every hook has a reference behaviour,
//! so an approach only overrides what it changes.

mod full_frame;
mod on_demand;

pub use full_frame::FullFrame;
pub use on_demand::OnDemand;

use serde_json::Value;

use crate::core::{MotionSample, TileId};
use crate::decision::HistoricalWindow;
use crate::evaluation::{display_samples, DisplayContext, DisplayInput, DisplaySamples};
use crate::projection::{SamplingSize, TileProjection};
use crate::Result;

/// Smoothing factor of the reference predictor
pub const DEFAULT_SMOOTHING: f64 = 0.3;

/// What an approach may consult while deciding one cycle
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    /// First chunk the cycle decides for
    pub chunk_idx: u32,
    pub projection: &'a TileProjection,
    pub sampling: SamplingSize,
    pub quality_list: &'a [u32],
    pub background: bool,
}

pub trait Approach: Send + Sync {
    /// Apply the approach-specific part of the run configuration
    fn on_create(&mut self, _config: &Value) -> Result<()> {
        Ok(())
    }

    /// One predicted sample per chunk of the prediction window
    fn predict_motion(&self, window: &HistoricalWindow, pw_size: u32) -> Vec<MotionSample> {
        predict_constant(window, pw_size, DEFAULT_SMOOTHING)
    }

    /// Tiles to fetch; the union over all predicted samples, in first-seen
    /// order, with the background last when enabled
    fn tile_decision(&self, predicted: &[MotionSample], ctx: &DecisionContext<'_>) -> Vec<TileId> {
        viewport_tiles(predicted, ctx)
    }

    /// Quality of each decided tile, index-aligned with `tiles`
    fn bitrate_decision(&self, tiles: &[TileId], ctx: &DecisionContext<'_>) -> Vec<u32> {
        let lowest = ctx.quality_list.iter().copied().min().unwrap_or_default();
        vec![lowest; tiles.len()]
    }

    /// Where each viewport sample reads on the display canvas.
    ///
    /// The evaluator checks the result out against the arrival ledger before
    /// rendering, so samples claiming tiles that never arrived come out gray.
    fn generate_display_result(&self, input: &DisplayInput<'_>, ctx: &DisplayContext<'_>) -> Result<DisplaySamples> {
        Ok(display_samples(input, ctx))
    }
}

/// Exponential smoothing over the window, seeded with its oldest sample
pub fn exponential_smoothing(window: &HistoricalWindow, alpha: f64) -> Option<MotionSample> {
    let mut samples = window.iter().map(|s| s.motion);
    let mut pred = samples.next()?;
    for s in samples {
        pred.yaw = alpha * pred.yaw + (1.0 - alpha) * s.yaw;
        pred.pitch = alpha * pred.pitch + (1.0 - alpha) * s.pitch;
        pred.scale = alpha * pred.scale + (1.0 - alpha) * s.scale;
        pred.timestamp = s.timestamp;
    }
    Some(pred)
}

/// The same smoothed prediction repeated for every chunk of the window
pub fn predict_constant(window: &HistoricalWindow, pw_size: u32, alpha: f64) -> Vec<MotionSample> {
    match exponential_smoothing(window, alpha) {
        Some(pred) => vec![pred; pw_size as usize],
        None => Vec::new(),
    }
}

/// Union of the viewport footprints of `predicted`
pub fn viewport_tiles(predicted: &[MotionSample], ctx: &DecisionContext<'_>) -> Vec<TileId> {
    let mut tiles: Vec<TileId> = Vec::new();
    for motion in predicted {
        let footprint = ctx.projection.sphere_to_tile(&motion.direction(), ctx.sampling);
        for idx in footprint.tiles {
            let tile = TileId::Tile(idx);
            if !tiles.contains(&tile) {
                tiles.push(tile);
            }
        }
    }
    if ctx.background {
        tiles.push(TileId::Background);
    }
    tiles
}
