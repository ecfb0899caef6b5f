//! Tile partitioning of a projected frame.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::format::{ProjectionFormat, Resolution};
use super::pixel::{uv_to_pixel_coord, PixelGrid};
use super::sphere::{sphere_to_uv, FovRange, PolarGrid, SamplingSize};
use crate::core::Direction;

/// Number of tile columns and rows covering the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    pub columns: u32,
    pub rows: u32,
}

impl TileGrid {
    pub fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    pub fn tile_count(&self) -> u32 {
        self.columns * self.rows
    }

    /// Tile containing pixel position (x, y); edges fold into the last tile.
    /// An empty grid puts everything in tile 0.
    pub fn tile_at(&self, x: f64, y: f64, resolution: Resolution) -> u32 {
        let tile_w = (resolution.width / self.columns.max(1) as usize).max(1) as f64;
        let tile_h = (resolution.height / self.rows.max(1) as usize).max(1) as f64;
        let col = ((x / tile_w).floor().max(0.0) as u32).min(self.columns.saturating_sub(1));
        let row = ((y / tile_h).floor().max(0.0) as u32).min(self.rows.saturating_sub(1));
        row * self.columns + col
    }
}

/// Tiles touched by a set of pixel samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFootprint {
    /// Distinct tiles, ascending
    pub tiles: Vec<u32>,
    /// Tile of each sample, in sample order
    pub per_sample: Vec<u32>,
}

impl TileFootprint {
    pub fn contains(&self, tile: u32) -> bool {
        self.tiles.binary_search(&tile).is_ok()
    }
}

pub fn pixel_to_tile(pixels: &PixelGrid, grid: TileGrid, resolution: Resolution) -> TileFootprint {
    let per_sample: Vec<u32> = pixels
        .iter()
        .map(|(x, y)| grid.tile_at(x, y, resolution))
        .collect();
    let tiles = per_sample.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    TileFootprint { tiles, per_sample }
}

/// Projection parameters of the streamed (converted) frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileProjection {
    pub format: ProjectionFormat,
    pub resolution: Resolution,
    pub grid: TileGrid,
    pub fov: FovRange,
}

impl TileProjection {
    pub fn new(format: ProjectionFormat, resolution: Resolution, grid: TileGrid, fov: FovRange) -> Self {
        Self {
            format,
            resolution,
            grid,
            fov,
        }
    }

    pub fn sphere_to_uv(&self, direction: &Direction, sampling: SamplingSize) -> PolarGrid {
        sphere_to_uv(direction, self.fov, sampling)
    }

    pub fn uv_to_pixel(&self, grid: &PolarGrid) -> PixelGrid {
        uv_to_pixel_coord(grid, self.format, self.resolution)
    }

    pub fn pixel_to_tile(&self, pixels: &PixelGrid) -> TileFootprint {
        pixel_to_tile(pixels, self.grid, self.resolution)
    }

    /// Tiles of the viewport looking along `direction`
    pub fn sphere_to_tile(&self, direction: &Direction, sampling: SamplingSize) -> TileFootprint {
        let polar = self.sphere_to_uv(direction, sampling);
        let pixels = self.uv_to_pixel(&polar);
        self.pixel_to_tile(&pixels)
    }
}
