//! Viewport reconstruction from delivered tiles.
//!
//! The converted frame of every quality is laid side by side on one canvas,
//! followed by the background frame. Each viewport sample is pointed at the
//! slot of the quality its tile was delivered in, at the background when the
//! tile is missing, or at the gray sentinel pixel (0, 0) otherwise. Samples
//! are checked out against the arrival ledger before the canvas is sampled,
//! so only delivered tiles ever reach the rendered viewport.

use crate::core::{Direction, Frame, TileArrival, TileChoice, TileId, GRAY};
use crate::projection::{
    sphere_to_uv, uv_to_pixel_coord, FovRange, PixelGrid, PolarGrid, ProjectionFormat, Resolution,
    SamplingSize, TileProjection,
};
use crate::{Result, SimError};

use super::remap::{remap, InterMode};

/// Geometry of the low-resolution background stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundLayout {
    pub format: ProjectionFormat,
    pub resolution: Resolution,
}

/// Fixed per-run rendering parameters
#[derive(Debug, Clone, Copy)]
pub struct DisplayContext<'a> {
    pub converted: &'a TileProjection,
    pub quality_list: &'a [u32],
    pub background: Option<BackgroundLayout>,
    pub fov: FovRange,
    pub fov_sampling: SamplingSize,
    pub inter_mode: InterMode,
}

/// What the client holds at one tick
#[derive(Debug, Clone, Copy)]
pub struct DisplayInput<'a> {
    pub direction: Direction,
    /// Tiles playable at this tick
    pub delivered: &'a [TileArrival],
    /// Converted frame per entry of the quality list
    pub quality_frames: &'a [Frame],
    pub background_frame: Option<&'a Frame>,
}

/// Lay out every quality frame and the background on one canvas
pub fn concat_canvas(ctx: &DisplayContext<'_>, input: &DisplayInput<'_>) -> Result<Frame> {
    let res = ctx.converted.resolution;
    if input.quality_frames.len() != ctx.quality_list.len() {
        return Err(SimError::malformed(
            "display input",
            format!(
                "{} quality frames for {} qualities",
                input.quality_frames.len(),
                ctx.quality_list.len()
            ),
        ));
    }

    let (bg_w, bg_h) = match (ctx.background, input.background_frame) {
        (Some(layout), Some(_)) => (layout.resolution.width, layout.resolution.height),
        _ => (0, 0),
    };
    let width = res.width * ctx.quality_list.len() + bg_w;
    let height = res.height.max(bg_h);

    let mut canvas = Frame::new(width, height);
    for (slot, frame) in input.quality_frames.iter().enumerate() {
        check_size(frame, res)?;
        canvas.blit(frame, slot * res.width, 0);
    }
    if let (Some(layout), Some(bg)) = (ctx.background, input.background_frame) {
        check_size(bg, layout.resolution)?;
        canvas.blit(bg, res.width * ctx.quality_list.len(), 0);
    }
    if width > 0 && height > 0 {
        canvas.set_pixel(0, 0, GRAY);
    }
    Ok(canvas)
}

fn check_size(frame: &Frame, res: Resolution) -> Result<()> {
    if frame.width != res.width || frame.height != res.height {
        return Err(SimError::ShapeMismatch {
            left_w: frame.width,
            left_h: frame.height,
            right_w: res.width,
            right_h: res.height,
        });
    }
    Ok(())
}

/// Where every viewport sample reads on the display canvas
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySamples {
    pub coords: PixelGrid,
    /// Tile and quality each sample reads from; `None` is the gray sentinel
    pub sources: Vec<Option<TileChoice>>,
}

/// Canvas coordinates of every viewport sample
pub fn fov_coordinates(ctx: &DisplayContext<'_>, fov: &PolarGrid, delivered: &[TileArrival]) -> DisplaySamples {
    let res = ctx.converted.resolution;
    let pixels = ctx.converted.uv_to_pixel(fov);
    let footprint = ctx.converted.pixel_to_tile(&pixels);

    let background = delivered.iter().find(|t| t.tile_idx.is_background());
    let bg_pixels = match (ctx.background, background) {
        (Some(layout), Some(bg)) => Some((uv_to_pixel_coord(fov, layout.format, layout.resolution), bg.bitrate)),
        _ => None,
    };
    let bg_offset = (res.width * ctx.quality_list.len()) as f64;

    let mut coords = PixelGrid::with_capacity(fov.width, fov.height);
    let mut sources = Vec::with_capacity(fov.len());
    for (i, (x, y)) in pixels.iter().enumerate() {
        let tile = TileId::Tile(footprint.per_sample[i]);
        let slot = delivered
            .iter()
            .find(|t| t.tile_idx == tile)
            .and_then(|t| ctx.quality_list.iter().position(|&q| q == t.bitrate));

        match (slot, &bg_pixels) {
            (Some(slot), _) => {
                coords.push((slot * res.width) as f64 + x, y);
                sources.push(Some(TileChoice {
                    tile_idx: tile,
                    bitrate: ctx.quality_list[slot],
                }));
            }
            (None, Some((bg, bitrate))) => {
                coords.push(bg_offset + bg.xs[i], bg.ys[i]);
                sources.push(Some(TileChoice {
                    tile_idx: TileId::Background,
                    bitrate: *bitrate,
                }));
            }
            (None, None) => {
                coords.push(0.0, 0.0);
                sources.push(None);
            }
        }
    }
    DisplaySamples { coords, sources }
}

/// Reference sample placement for the viewport of `input`
pub fn display_samples(input: &DisplayInput<'_>, ctx: &DisplayContext<'_>) -> DisplaySamples {
    let fov = sphere_to_uv(&input.direction, ctx.fov, ctx.fov_sampling);
    fov_coordinates(ctx, &fov, input.delivered)
}

/// Point every sample that does not read a delivered tile at the gray
/// sentinel.
///
/// A sample survives only when its tile arrived at the claimed quality and
/// its coordinate lies inside that tile's slot on the canvas.
pub fn checkout_tiles(
    ctx: &DisplayContext<'_>,
    samples: &DisplaySamples,
    delivered: &[TileArrival],
) -> Result<PixelGrid> {
    if samples.sources.len() != samples.coords.len() {
        return Err(SimError::malformed(
            "display samples",
            format!(
                "{} sources for {} coordinates",
                samples.sources.len(),
                samples.coords.len()
            ),
        ));
    }

    let mut coords = PixelGrid::with_capacity(samples.coords.width, samples.coords.height);
    let mut masked = 0usize;
    for ((x, y), source) in samples.coords.iter().zip(&samples.sources) {
        let readable = source.is_some_and(|choice| {
            delivered
                .iter()
                .any(|d| d.tile_idx == choice.tile_idx && d.bitrate == choice.bitrate)
                && reads_inside(ctx, &choice, x, y)
        });
        if readable {
            coords.push(x, y);
        } else {
            masked += 1;
            coords.push(0.0, 0.0);
        }
    }
    if masked > 0 {
        tracing::trace!(masked, samples = coords.len(), "samples masked at checkout");
    }
    Ok(coords)
}

/// Slack for the slot offset round trip on canvas x coordinates
const SLOT_TOLERANCE: f64 = 1e-6;

fn reads_inside(ctx: &DisplayContext<'_>, choice: &TileChoice, x: f64, y: f64) -> bool {
    let res = ctx.converted.resolution;
    let bg_offset = (res.width * ctx.quality_list.len()) as f64;
    match choice.tile_idx {
        TileId::Background => match ctx.background {
            Some(layout) => {
                x >= bg_offset
                    && x < bg_offset + layout.resolution.width as f64
                    && y >= 0.0
                    && y < layout.resolution.height as f64
            }
            None => false,
        },
        TileId::Tile(tile) => {
            let Some(slot) = ctx.quality_list.iter().position(|&q| q == choice.bitrate) else {
                return false;
            };
            let local_x = x - (slot * res.width) as f64;
            local_x >= 0.0
                && local_x < res.width as f64
                && y >= 0.0
                && y < res.height as f64
                && [local_x - SLOT_TOLERANCE, local_x + SLOT_TOLERANCE]
                    .iter()
                    .any(|&lx| ctx.converted.grid.tile_at(lx, y, res) == tile)
        }
    }
}

/// Render `samples` against the delivered tiles of `input`
pub fn render_display(
    input: &DisplayInput<'_>,
    ctx: &DisplayContext<'_>,
    samples: &DisplaySamples,
) -> Result<Frame> {
    let canvas = concat_canvas(ctx, input)?;
    let coords = checkout_tiles(ctx, samples, input.delivered)?;
    Ok(remap(&canvas, &coords, ctx.inter_mode))
}

/// Reference viewport renderer
pub fn reconstruct_viewport(input: &DisplayInput<'_>, ctx: &DisplayContext<'_>) -> Result<Frame> {
    render_display(input, ctx, &display_samples(input, ctx))
}

/// Viewport as seen on the unprocessed source frame
pub fn ground_truth(
    source: &Frame,
    format: ProjectionFormat,
    direction: &Direction,
    fov: FovRange,
    sampling: SamplingSize,
    mode: InterMode,
) -> Frame {
    let polar = sphere_to_uv(direction, fov, sampling);
    let coords = uv_to_pixel_coord(&polar, format, Resolution::new(source.width, source.height));
    remap(source, &coords, mode)
}
