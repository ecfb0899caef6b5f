//! Resampling an image through a coordinate map.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::{Frame, CHANNELS};
use crate::projection::PixelGrid;
use crate::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterMode {
    Nearest,
    Bilinear,
}

impl FromStr for InterMode {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            other => Err(SimError::UnsupportedInterpolation(other.to_string())),
        }
    }
}

impl fmt::Display for InterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("nearest"),
            Self::Bilinear => f.write_str("bilinear"),
        }
    }
}

/// Sample `src` at every map position; the result has the map's shape.
/// Positions outside `src` are clamped to its border.
pub fn remap(src: &Frame, map: &PixelGrid, mode: InterMode) -> Frame {
    let mut out = Frame::new(map.width, map.height);
    if src.width == 0 || src.height == 0 {
        return out;
    }
    let max_x = (src.width - 1) as f64;
    let max_y = (src.height - 1) as f64;

    for (i, (x, y)) in map.iter().enumerate() {
        let (x, y) = (x.clamp(0.0, max_x), y.clamp(0.0, max_y));
        let pixel = match mode {
            InterMode::Nearest => src.pixel(x.round() as usize, y.round() as usize),
            InterMode::Bilinear => bilinear(src, x, y),
        };
        out.data[i * CHANNELS..(i + 1) * CHANNELS].copy_from_slice(&pixel);
    }
    out
}

fn bilinear(src: &Frame, x: f64, y: f64) -> [u8; CHANNELS] {
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(src.width - 1);
    let y1 = (y0 + 1).min(src.height - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let (p00, p10, p01, p11) = (src.pixel(x0, y0), src.pixel(x1, y0), src.pixel(x0, y1), src.pixel(x1, y1));
    let mut out = [0u8; CHANNELS];
    for c in 0..CHANNELS {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Frame {
        let mut f = Frame::new(2, 2);
        f.set_pixel(0, 0, [0, 0, 0]);
        f.set_pixel(1, 0, [100, 100, 100]);
        f.set_pixel(0, 1, [200, 200, 200]);
        f.set_pixel(1, 1, [100, 100, 100]);
        f
    }

    fn single(x: f64, y: f64) -> PixelGrid {
        let mut map = PixelGrid::with_capacity(1, 1);
        map.push(x, y);
        map
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!("nearest".parse::<InterMode>().unwrap(), InterMode::Nearest);
        assert!(matches!(
            "cubic".parse::<InterMode>(),
            Err(SimError::UnsupportedInterpolation(_))
        ));
    }

    #[test]
    fn test_bilinear_midpoint() {
        let out = remap(&checker(), &single(0.5, 0.5), InterMode::Bilinear);
        assert_eq!(out.pixel(0, 0), [100, 100, 100]);
    }

    #[test]
    fn test_nearest_and_clamp() {
        let src = checker();
        assert_eq!(remap(&src, &single(0.6, 0.2), InterMode::Nearest).pixel(0, 0), [100, 100, 100]);
        assert_eq!(remap(&src, &single(-3.0, 9.0), InterMode::Nearest).pixel(0, 0), [200, 200, 200]);
    }
}
