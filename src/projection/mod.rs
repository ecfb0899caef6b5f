//! Projection engine: viewport sampling, sphere/pixel conversion and tiling
//! for ERP, CMP and EAC frames.

pub mod face;
pub mod format;
pub mod pixel;
pub mod sphere;
pub mod tile;

pub use format::{ProjectionFormat, Resolution};
pub use pixel::{pixel_to_polar, polar_to_pixel, projection_to_polar, transform_projection, uv_to_pixel_coord, PixelGrid};
pub use sphere::{sphere_to_uv, FovRange, Polar, PolarGrid, SamplingSize};
pub use tile::{pixel_to_tile, TileFootprint, TileGrid, TileProjection};
