//! Conversions between sphere points and frame pixel coordinates.

use glam::DVec3;
use std::f64::consts::PI;

use super::face::{self, FACE_COLUMNS, FACE_ROWS};
use super::format::{ProjectionFormat, Resolution};
use super::sphere::{Polar, PolarGrid};

/// Sub-pixel coordinates, row-major, one entry per sphere sample
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    pub width: usize,
    pub height: usize,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl PixelGrid {
    pub fn with_capacity(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            xs: Vec::with_capacity(width * height),
            ys: Vec::with_capacity(width * height),
        }
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.xs.push(x);
        self.ys.push(y);
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }
}

fn round9(v: f64) -> f64 {
    (v * 1e9).round() / 1e9
}

/// Project one sphere point into `format` at `resolution`.
///
/// Results are clamped to the frame (ERP) or to the owning face (CMP/EAC).
pub fn polar_to_pixel(p: Polar, format: ProjectionFormat, resolution: Resolution) -> (f64, f64) {
    let w = resolution.width as f64;
    let h = resolution.height as f64;

    match format {
        ProjectionFormat::Erp => {
            let x = (p.phi / (2.0 * PI) + 0.5) * w - 0.5;
            let y = (0.5 - p.theta / PI) * h - 0.5;
            (x.clamp(0.0, w - 1.0), y.clamp(0.0, h - 1.0))
        }
        ProjectionFormat::Cmp | ProjectionFormat::Eac => {
            let c = p.to_cartesian();
            let c = DVec3::new(round9(c.x), round9(c.y), round9(c.z));
            let f = face::classify_face(c);
            let (mut u, mut v) = face::face_uv(f, c);
            if format == ProjectionFormat::Eac {
                u = face::eac_warp(u);
                v = face::eac_warp(v);
            }

            let face_w = (resolution.width / FACE_COLUMNS) as f64;
            let face_h = (resolution.height / FACE_ROWS) as f64;
            let m = (u + 1.0) * face_w / 2.0 - 0.5;
            let n = (v + 1.0) * face_h / 2.0 - 0.5;

            let left = (f % FACE_COLUMNS) as f64 * face_w;
            let top = (f / FACE_COLUMNS) as f64 * face_h;
            (
                (left + m).clamp(left, left + face_w - 1.0),
                (top + n).clamp(top, top + face_h - 1.0),
            )
        }
    }
}

/// Inverse of [`polar_to_pixel`] for a pixel position in `format`
pub fn pixel_to_polar(x: f64, y: f64, format: ProjectionFormat, resolution: Resolution) -> Polar {
    let w = resolution.width as f64;
    let h = resolution.height as f64;

    match format {
        ProjectionFormat::Erp => {
            let phi = ((x + 0.5) / w - 0.5) * 2.0 * PI;
            let theta = (0.5 - (y + 0.5) / h) * PI;
            Polar::new(phi, theta)
        }
        ProjectionFormat::Cmp | ProjectionFormat::Eac => {
            let face_w = (resolution.width / FACE_COLUMNS) as f64;
            let face_h = (resolution.height / FACE_ROWS) as f64;
            let col = ((x / face_w).floor().max(0.0) as usize).min(FACE_COLUMNS - 1);
            let row = ((y / face_h).floor().max(0.0) as usize).min(FACE_ROWS - 1);
            let f = row * FACE_COLUMNS + col;

            let m = x - col as f64 * face_w;
            let n = y - row as f64 * face_h;
            let mut u = (m + 0.5) * 2.0 / face_w - 1.0;
            let mut v = (n + 0.5) * 2.0 / face_h - 1.0;
            if format == ProjectionFormat::Eac {
                u = face::eac_unwarp(u);
                v = face::eac_unwarp(v);
            }

            Polar::from_cartesian(face::face_point(f, u, v).normalize())
        }
    }
}

/// Map every point of a polar grid to pixel coordinates
pub fn uv_to_pixel_coord(grid: &PolarGrid, format: ProjectionFormat, resolution: Resolution) -> PixelGrid {
    let mut out = PixelGrid::with_capacity(grid.width, grid.height);
    for p in &grid.points {
        let (x, y) = polar_to_pixel(*p, format, resolution);
        out.push(x, y);
    }
    out
}

/// Sphere position of every pixel centre of a frame
pub fn projection_to_polar(format: ProjectionFormat, resolution: Resolution) -> PolarGrid {
    let mut points = Vec::with_capacity(resolution.pixel_count());
    for row in 0..resolution.height {
        for col in 0..resolution.width {
            points.push(pixel_to_polar(col as f64, row as f64, format, resolution));
        }
    }
    PolarGrid {
        width: resolution.width,
        height: resolution.height,
        points,
    }
}

/// For every pixel of a `dst` frame, the position to sample in a `src` frame
pub fn transform_projection(
    dst: ProjectionFormat,
    src: ProjectionFormat,
    dst_resolution: Resolution,
    src_resolution: Resolution,
) -> PixelGrid {
    let polar = projection_to_polar(dst, dst_resolution);
    uv_to_pixel_coord(&polar, src, src_resolution)
}
