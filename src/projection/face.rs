//! Cube face geometry shared by the CMP and EAC layouts.
//!
//! Faces are numbered 0..6 and laid out in a 3x2 atlas, row-major:
//! `0 1 2` on top and `3 4 5` below.

use glam::DVec3;
use std::f64::consts::PI;

/// Faces per atlas row
pub const FACE_COLUMNS: usize = 3;
/// Atlas rows
pub const FACE_ROWS: usize = 2;

/// First face whose test passes wins; each test is a strict sign check on
/// the dominant axis plus a magnitude check against the other two.
pub fn classify_face(p: DVec3) -> usize {
    let DVec3 { x, y, z } = p;
    let DVec3 { x: ax, y: ay, z: az } = p.abs();
    let y_dom = ay >= ax && ay >= az;
    let x_dom = ax >= ay && ax >= az;
    let z_dom = az >= ax && az >= ay;

    if y < 0.0 && y_dom {
        0
    } else if x > 0.0 && x_dom {
        1
    } else if y > 0.0 && y_dom {
        2
    } else if z < 0.0 && z_dom {
        3
    } else if x < 0.0 && x_dom {
        4
    } else if z > 0.0 && z_dom {
        5
    } else {
        // origin; every test above is strict on the sign
        1
    }
}

/// In-face coordinates in [-1, 1] for a point on the given face
pub fn face_uv(face: usize, p: DVec3) -> (f64, f64) {
    let DVec3 { x, y, z } = p;
    match face {
        0 => (x / y.abs(), -z / y.abs()),
        1 => (y / x.abs(), -z / x.abs()),
        2 => (-x / y.abs(), -z / y.abs()),
        3 => (-x / z.abs(), -y / z.abs()),
        4 => (z / x.abs(), -y / x.abs()),
        _ => (x / z.abs(), -y / z.abs()),
    }
}

/// Inverse of [`face_uv`]; the returned point lies on the cube surface
pub fn face_point(face: usize, u: f64, v: f64) -> DVec3 {
    match face {
        0 => DVec3::new(u, -1.0, -v),
        1 => DVec3::new(1.0, u, -v),
        2 => DVec3::new(-u, 1.0, -v),
        3 => DVec3::new(-u, -v, -1.0),
        4 => DVec3::new(-1.0, -v, u),
        _ => DVec3::new(u, -v, 1.0),
    }
}

/// Equi-angular warp applied to cube coordinates
pub fn eac_warp(t: f64) -> f64 {
    t.atan() * 4.0 / PI
}

pub fn eac_unwarp(t: f64) -> f64 {
    (t * PI / 4.0).tan()
}
