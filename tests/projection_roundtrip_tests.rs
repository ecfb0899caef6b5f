use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use tilesim::core::Direction;
use tilesim::projection::face::{classify_face, face_point, face_uv};
use tilesim::projection::{
    pixel_to_polar, polar_to_pixel, sphere_to_uv, transform_projection, uv_to_pixel_coord, FovRange, Polar,
    ProjectionFormat, Resolution, SamplingSize, TileGrid, TileProjection,
};

fn random_unit(rng: &mut StdRng) -> DVec3 {
    let z: f64 = rng.gen_range(-1.0..1.0);
    let phi: f64 = rng.gen_range(-PI..PI);
    let r = (1.0 - z * z).sqrt();
    DVec3::new(r * phi.cos(), r * phi.sin(), z)
}

fn angle_between(a: DVec3, b: DVec3) -> f64 {
    a.dot(b).clamp(-1.0, 1.0).acos()
}

#[test]
fn test_faces_partition_the_sphere() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut counts = [0usize; 6];

    for _ in 0..10_000 {
        let p = random_unit(&mut rng);
        let face = classify_face(p);
        assert!(face < 6);
        counts[face] += 1;

        // the face is the signed dominant axis
        let DVec3 { x, y, z } = p;
        let (ax, ay, az) = (x.abs(), y.abs(), z.abs());
        let ok = match face {
            0 => y < 0.0 && ay >= ax && ay >= az,
            1 => x > 0.0 && ax >= ay && ax >= az,
            2 => y > 0.0 && ay >= ax && ay >= az,
            3 => z < 0.0 && az >= ax && az >= ay,
            4 => x < 0.0 && ax >= ay && ax >= az,
            _ => z > 0.0 && az >= ax && az >= ay,
        };
        assert!(ok, "({x}, {y}, {z}) put on face {face}");

        let (u, v) = face_uv(face, p);
        assert!(u.abs() <= 1.0 + 1e-12 && v.abs() <= 1.0 + 1e-12, "uv ({u}, {v}) off face {face}");

        let back = face_point(face, u, v).normalize();
        assert!(angle_between(back, p) < 1e-9);
    }

    // six faces of equal solid angle
    for (face, &count) in counts.iter().enumerate() {
        assert!((1400..1950).contains(&count), "face {face} got {count} of 10000");
    }
}

/// Angular size of one pixel at the coarsest point of the layout
fn pixel_angle(format: ProjectionFormat, res: Resolution) -> f64 {
    if format.is_cube() {
        2.0 / (res.width / 3) as f64
    } else {
        2.0 * PI / res.width as f64
    }
}

#[test]
fn test_viewport_roundtrip_at_reference_directions() {
    let formats = [
        (ProjectionFormat::Erp, Resolution::new(2048, 1024)),
        (ProjectionFormat::Cmp, Resolution::new(1536, 1024)),
        (ProjectionFormat::Eac, Resolution::new(1536, 1024)),
    ];
    // direction, and whether its centre is off every seam in ERP / CMP / EAC
    let directions = [
        (Direction::new(0.0, 0.0, 0.0), [true, true, true]),
        (Direction::new(PI / 2.0, 0.0, 0.0), [true, true, true]),
        (Direction::new(0.0, PI / 4.0, 0.0), [true, false, false]),
        (Direction::new(PI / 4.0, 0.0, 0.0), [true, false, false]),
        (Direction::new(-3.0 * PI / 4.0, 0.2, 0.0), [true, false, false]),
        (Direction::new(PI, 0.0, 0.0), [false, true, true]),
        (Direction::new(0.3, -0.2, 0.5), [true, true, true]),
    ];
    let fov = FovRange::new(90.0, 90.0);
    let sampling = SamplingSize::new(9, 9);

    for (direction, off_seam) in directions {
        let grid = sphere_to_uv(&direction, fov, sampling);
        for (i, (format, res)) in formats.into_iter().enumerate() {
            let pixels = uv_to_pixel_coord(&grid, format, res);
            let bound = pixel_angle(format, res);

            for (point, (x, y)) in grid.points.iter().zip(pixels.iter()) {
                let back = pixel_to_polar(x, y, format, res);
                let err = angle_between(point.to_cartesian(), back.to_cartesian());
                assert!(err < bound, "{format} {direction:?}: sample {point:?} came back {err} rad off");
            }

            let (cx, cy) = polar_to_pixel(grid.center(), format, res);
            let centre = pixel_to_polar(cx, cy, format, res);
            let err = angle_between(
                Polar::new(direction.yaw, direction.pitch).to_cartesian(),
                centre.to_cartesian(),
            );
            let tolerance = if off_seam[i] { 1e-6 } else { bound };
            assert!(err < tolerance, "{format} {direction:?}: centre {err} rad off");
        }
    }
}

#[test]
fn test_polar_pixel_roundtrip_in_every_format() {
    let mut rng = StdRng::seed_from_u64(7);
    let cases = [
        (ProjectionFormat::Erp, Resolution::new(1024, 512)),
        (ProjectionFormat::Cmp, Resolution::new(768, 512)),
        (ProjectionFormat::Eac, Resolution::new(768, 512)),
    ];

    for (format, res) in cases {
        for _ in 0..2_000 {
            let phi: f64 = rng.gen_range(-PI..PI);
            let theta: f64 = rng.gen_range(-1.5..1.5);
            let p = Polar::new(phi, theta);

            let (x, y) = polar_to_pixel(p, format, res);
            assert!(x >= 0.0 && x <= res.width as f64 - 1.0);
            assert!(y >= 0.0 && y <= res.height as f64 - 1.0);

            let back = pixel_to_polar(x, y, format, res);
            let err = angle_between(p.to_cartesian(), back.to_cartesian());
            // clamping at frame and face edges costs at most about one pixel
            assert!(err < 0.01, "{format} ({phi}, {theta}) came back {err} rad off");
        }
    }
}

#[test]
fn test_transform_projection_preserves_sphere_position() {
    let dst_res = Resolution::new(96, 64);
    let src_res = Resolution::new(256, 128);
    let grid = transform_projection(ProjectionFormat::Cmp, ProjectionFormat::Erp, dst_res, src_res);
    assert_eq!(grid.len(), dst_res.pixel_count());

    for (i, (sx, sy)) in grid.iter().enumerate() {
        let (col, row) = (i % dst_res.width, i / dst_res.width);
        let dst = pixel_to_polar(col as f64, row as f64, ProjectionFormat::Cmp, dst_res);
        let src = pixel_to_polar(sx, sy, ProjectionFormat::Erp, src_res);
        let err = angle_between(dst.to_cartesian(), src.to_cartesian());
        assert!(err < 0.03, "pixel ({col}, {row}) maps {err} rad away");
    }
}

#[test]
fn test_viewport_footprint_is_consistent() {
    let mut rng = StdRng::seed_from_u64(11);
    let sampling = SamplingSize::new(20, 20);

    for format in [ProjectionFormat::Erp, ProjectionFormat::Cmp, ProjectionFormat::Eac] {
        let res = if format.is_cube() {
            Resolution::new(600, 400)
        } else {
            Resolution::new(640, 320)
        };
        let projection = TileProjection::new(format, res, TileGrid::new(6, 4), FovRange::new(90.0, 90.0));

        for _ in 0..200 {
            let direction = Direction::new(rng.gen_range(-PI..PI), rng.gen_range(-1.4..1.4), 0.0);
            let footprint = projection.sphere_to_tile(&direction, sampling);

            assert_eq!(footprint.per_sample.len(), sampling.count());
            assert!(footprint.tiles.windows(2).all(|w| w[0] < w[1]));
            assert!(footprint.per_sample.iter().all(|t| footprint.contains(*t)));
            assert!(footprint.tiles.iter().all(|t| footprint.per_sample.contains(t)));
            assert!(footprint.tiles.iter().all(|&t| t < 24));
        }
    }
}
