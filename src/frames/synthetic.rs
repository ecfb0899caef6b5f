use async_trait::async_trait;

use super::FrameSource;
use crate::config::SimConfig;
use crate::core::{Frame, CHANNELS};
use crate::projection::{projection_to_polar, Polar, PolarGrid, ProjectionFormat, Resolution};
use crate::Result;

/// Quantization step of the background stream
const BACKGROUND_STEP: u8 = 16;

/// Procedural 360° scene rendered into any projection.
///
/// The scene is a smooth function of the sphere position that drifts in
/// azimuth with the frame index, so every stream shows the same content in
/// its own layout. Encoding loss is modelled as quantization that grows with
/// the quality parameter.
pub struct SyntheticFrameSource {
    source: PolarGrid,
    converted: PolarGrid,
    background: Option<PolarGrid>,
    drift_per_frame: f64,
}

impl SyntheticFrameSource {
    pub fn new(
        source: (ProjectionFormat, Resolution),
        converted: (ProjectionFormat, Resolution),
        background: Option<(ProjectionFormat, Resolution)>,
    ) -> Self {
        Self {
            source: projection_to_polar(source.0, source.1),
            converted: projection_to_polar(converted.0, converted.1),
            background: background.map(|(f, r)| projection_to_polar(f, r)),
            drift_per_frame: 0.01,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        let bg = &config.method.background;
        Self::new(
            (config.video.origin.projection, config.video.origin.resolution()),
            (config.video.converted.projection, config.video.converted.resolution()),
            bg.enabled.then(|| (bg.projection, bg.resolution())),
        )
    }

    /// Azimuth drift per frame in radians; 0 keeps the scene still
    pub fn with_drift(mut self, drift_per_frame: f64) -> Self {
        self.drift_per_frame = drift_per_frame;
        self
    }

    fn render(&self, grid: &PolarGrid, frame_idx: u64, step: u8) -> Frame {
        let shift = frame_idx as f64 * self.drift_per_frame;
        let mut frame = Frame::new(grid.width, grid.height);
        for (i, p) in grid.points.iter().enumerate() {
            let rgb = scene(*p, shift).map(|v| quantize(v, step));
            frame.data[i * CHANNELS..(i + 1) * CHANNELS].copy_from_slice(&rgb);
        }
        frame
    }
}

fn scene(p: Polar, shift: f64) -> [u8; CHANNELS] {
    let r = 128.0 + 100.0 * (4.0 * p.phi + shift).sin();
    let g = 128.0 + 100.0 * (6.0 * p.theta).sin();
    let b = 128.0 + 60.0 * (3.0 * p.phi - 2.0 * p.theta).cos();
    [r, g, b].map(|v| v.round().clamp(0.0, 255.0) as u8)
}

fn quantize(v: u8, step: u8) -> u8 {
    if step <= 1 {
        v
    } else {
        v - v % step
    }
}

/// Quality parameters behave like QP: larger means coarser
fn quality_step(quality: u32) -> u8 {
    (quality / 8).clamp(1, 64) as u8
}

#[async_trait]
impl FrameSource for SyntheticFrameSource {
    async fn converted_frame(&self, quality: u32, frame_idx: u64) -> Result<Frame> {
        Ok(self.render(&self.converted, frame_idx, quality_step(quality)))
    }

    async fn background_frame(&self, frame_idx: u64) -> Result<Frame> {
        match &self.background {
            Some(grid) => Ok(self.render(grid, frame_idx, BACKGROUND_STEP)),
            None => Ok(Frame::new(0, 0)),
        }
    }

    async fn source_frame(&self, frame_idx: u64) -> Result<Frame> {
        Ok(self.render(&self.source, frame_idx, 1))
    }
}
