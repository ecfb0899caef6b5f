//! Viewport sampling on the unit sphere.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::core::Direction;

/// Angular extent of the field of view, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FovRange {
    pub width_deg: f64,
    pub height_deg: f64,
}

impl FovRange {
    pub const DEFAULT: FovRange = FovRange {
        width_deg: 90.0,
        height_deg: 90.0,
    };

    pub fn new(width_deg: f64, height_deg: f64) -> Self {
        Self { width_deg, height_deg }
    }

    pub fn is_valid(&self) -> bool {
        let ok = |d: f64| d.is_finite() && d > 0.0 && d < 180.0;
        ok(self.width_deg) && ok(self.height_deg)
    }

    /// The range itself, or 90x90 when it cannot describe a rectilinear view
    pub fn or_default(self) -> Self {
        if self.is_valid() {
            self
        } else {
            tracing::warn!(
                width = self.width_deg,
                height = self.height_deg,
                "fov range out of bounds, using 90x90"
            );
            Self::DEFAULT
        }
    }
}

impl Default for FovRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Sampling grid dimensions (rows x columns)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingSize {
    pub height: usize,
    pub width: usize,
}

impl SamplingSize {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    pub fn count(&self) -> usize {
        self.height * self.width
    }
}

/// Point on the unit sphere: azimuth `phi` in [-pi, pi], elevation `theta`
/// in [-pi/2, pi/2] (positive up)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Polar {
    pub phi: f64,
    pub theta: f64,
}

impl Polar {
    pub fn new(phi: f64, theta: f64) -> Self {
        Self { phi, theta }
    }

    pub fn from_cartesian(v: DVec3) -> Self {
        let phi = v.y.atan2(v.x);
        let theta = v.z.atan2(v.truncate().length());
        Self { phi, theta }
    }

    /// Unit vector; +x is the front, +y the right-hand side, +z up
    pub fn to_cartesian(&self) -> DVec3 {
        let (st, ct) = self.theta.sin_cos();
        let (sp, cp) = self.phi.sin_cos();
        DVec3::new(ct * cp, ct * sp, st)
    }
}

/// Row-major grid of sphere points
#[derive(Debug, Clone, PartialEq)]
pub struct PolarGrid {
    pub width: usize,
    pub height: usize,
    pub points: Vec<Polar>,
}

impl PolarGrid {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Polar {
        self.points[row * self.width + col]
    }

    /// Sample at the grid centre (exact for odd dimensions)
    pub fn center(&self) -> Polar {
        self.get(self.height / 2, self.width / 2)
    }
}

/// Intrinsic rotation: yaw about the vertical axis, then pitch, then roll.
fn orientation(direction: &Direction) -> DQuat {
    let yaw = DQuat::from_rotation_z(direction.yaw);
    // positive pitch looks up, i.e. a negative rotation about the lateral axis
    let pitch = DQuat::from_rotation_y(-direction.pitch);
    let roll = DQuat::from_rotation_x(direction.roll);
    yaw * pitch * roll
}

/// Sample a rectilinear viewport looking along `direction`.
///
/// The sampling plane is tangent to the unit sphere at distance 1 and spans
/// `tan(fov/2)` each way; samples sit at pixel centres. Out-of-range fov
/// falls back to 90x90.
pub fn sphere_to_uv(direction: &Direction, fov: FovRange, sampling: SamplingSize) -> PolarGrid {
    let fov = fov.or_default();
    let tan_w = (fov.width_deg * PI / 180.0 / 2.0).tan();
    let tan_h = (fov.height_deg * PI / 180.0 / 2.0).tan();
    let rot = orientation(direction);

    let mut points = Vec::with_capacity(sampling.count());
    for n in 0..sampling.height {
        let z = -((n as f64 + 0.5) * 2.0 * tan_h / sampling.height as f64) + tan_h;
        for m in 0..sampling.width {
            let y = (m as f64 + 0.5) * 2.0 * tan_w / sampling.width as f64 - tan_w;
            let ray = DVec3::new(1.0, y, z).normalize();
            let rotated = (rot * ray).clamp(DVec3::NEG_ONE, DVec3::ONE);
            points.push(Polar::from_cartesian(rotated));
        }
    }

    PolarGrid {
        width: sampling.width,
        height: sampling.height,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_center_sample_follows_direction() {
        let dirs = [
            Direction::new(0.0, 0.0, 0.0),
            Direction::new(PI / 2.0, 0.0, 0.0),
            Direction::new(0.0, PI / 4.0, 0.0),
            Direction::new(-2.0, -0.6, 0.3),
        ];
        for dir in dirs {
            let grid = sphere_to_uv(&dir, FovRange::new(90.0, 90.0), SamplingSize::new(5, 5));
            let c = grid.center();
            assert!((c.phi - dir.yaw).abs() < EPS, "{:?} -> {:?}", dir, c);
            assert!((c.theta - dir.pitch).abs() < EPS, "{:?} -> {:?}", dir, c);
        }
    }

    #[test]
    fn test_grid_orientation() {
        let grid = sphere_to_uv(&Direction::default(), FovRange::new(90.0, 90.0), SamplingSize::new(3, 3));
        // top row is above the horizon, left column at smaller azimuth
        assert!(grid.get(0, 1).theta > 0.0);
        assert!(grid.get(2, 1).theta < 0.0);
        assert!(grid.get(1, 0).phi < grid.get(1, 2).phi);
    }

    #[test]
    fn test_invalid_fov_falls_back_to_default() {
        let dir = Direction::new(0.4, 0.1, 0.0);
        let size = SamplingSize::new(4, 6);
        let fallback = sphere_to_uv(&dir, FovRange::new(f64::NAN, 200.0), size);
        let default = sphere_to_uv(&dir, FovRange::DEFAULT, size);
        assert_eq!(fallback, default);
    }

    #[test]
    fn test_polar_cartesian_roundtrip() {
        let p = Polar::new(2.5, -0.7);
        let v = p.to_cartesian();
        assert!((v.length() - 1.0).abs() < EPS);
        let back = Polar::from_cartesian(v);
        assert!((back.phi - p.phi).abs() < EPS);
        assert!((back.theta - p.theta).abs() < EPS);
    }

    #[test]
    fn test_orientation_axes() {
        // yaw turns the front towards the right-hand side
        let front = orientation(&Direction::new(PI / 2.0, 0.0, 0.0)) * DVec3::X;
        assert!(front.abs_diff_eq(DVec3::Y, EPS));
        // pitch up lifts the front towards +z
        let up = orientation(&Direction::new(0.0, PI / 2.0, 0.0)) * DVec3::X;
        assert!(up.abs_diff_eq(DVec3::Z, EPS));
        // roll leaves the view axis in place
        let rolled = orientation(&Direction::new(0.0, 0.0, 1.0)) * DVec3::X;
        assert!(rolled.abs_diff_eq(DVec3::X, EPS));
    }
}
