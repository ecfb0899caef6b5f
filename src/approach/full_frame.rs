use tilesim_macros::Approach;

use super::{Approach, DecisionContext};
use crate::core::{MotionSample, TileId};

/// Fetch every tile of the frame each cycle, ignoring the viewport
#[derive(Approach, Debug, Clone, Default)]
#[approach_meta(name = "Full frame", description = "All tiles at the lowest quality")]
pub struct FullFrame;

impl Approach for FullFrame {
    fn tile_decision(&self, _predicted: &[MotionSample], ctx: &DecisionContext<'_>) -> Vec<TileId> {
        let mut tiles: Vec<TileId> = (0..ctx.projection.grid.tile_count()).map(TileId::Tile).collect();
        if ctx.background {
            tiles.push(TileId::Background);
        }
        tiles
    }
}
