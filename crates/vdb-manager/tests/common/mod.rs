//! Meshes shared by the integration tests, in the column-blocked layout.

#![allow(dead_code)]

use std::f64::consts::PI;

use nalgebra::{Matrix4, Point3, Vector3};
use vdb_manager::Pose;

/// Lays out points and zero-based triangles as `[x.., y.., z..]` vertices
/// and one-based `[a.., b.., c..]` faces.
#[allow(clippy::cast_precision_loss)]
pub fn column_blocked(points: &[Point3<f64>], triangles: &[[usize; 3]]) -> (Vec<f64>, Vec<f64>) {
    let mut vertices = Vec::with_capacity(points.len() * 3);
    for axis in 0..3 {
        vertices.extend(points.iter().map(|p| p[axis]));
    }
    let mut faces = Vec::with_capacity(triangles.len() * 3);
    for corner in 0..3 {
        faces.extend(triangles.iter().map(|t| (t[corner] + 1) as f64));
    }
    (vertices, faces)
}

/// Axis-aligned cube of edge `side` centered at `center`.
pub fn cube(center: Point3<f64>, side: f64) -> (Vec<f64>, Vec<f64>) {
    let h = side / 2.0;
    let corners: Vec<Point3<f64>> = [
        [-h, -h, -h],
        [h, -h, -h],
        [h, h, -h],
        [-h, h, -h],
        [-h, -h, h],
        [h, -h, h],
        [h, h, h],
        [-h, h, h],
    ]
    .iter()
    .map(|c| center + Vector3::new(c[0], c[1], c[2]))
    .collect();
    let triangles = [
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [2, 3, 7],
        [2, 7, 6],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ];
    column_blocked(&corners, &triangles)
}

/// Latitude-longitude sphere with outward-facing triangles.
pub fn uv_sphere(center: Point3<f64>, radius: f64, rings: usize, segments: usize) -> (Vec<f64>, Vec<f64>) {
    let mut points = vec![center + Vector3::new(0.0, 0.0, radius)];
    for ring in 1..rings {
        #[allow(clippy::cast_precision_loss)]
        let theta = PI * ring as f64 / rings as f64;
        for seg in 0..segments {
            #[allow(clippy::cast_precision_loss)]
            let phi = 2.0 * PI * seg as f64 / segments as f64;
            points.push(
                center
                    + radius
                        * Vector3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()),
            );
        }
    }
    let south = points.len();
    points.push(center - Vector3::new(0.0, 0.0, radius));

    let at = |ring: usize, seg: usize| 1 + (ring - 1) * segments + seg % segments;
    let mut triangles = Vec::new();
    for seg in 0..segments {
        triangles.push([0, at(1, seg), at(1, seg + 1)]);
        triangles.push([south, at(rings - 1, seg + 1), at(rings - 1, seg)]);
    }
    for ring in 1..rings - 1 {
        for seg in 0..segments {
            let (a, b) = (at(ring, seg), at(ring, seg + 1));
            let (c, d) = (at(ring + 1, seg), at(ring + 1, seg + 1));
            triangles.push([a, c, d]);
            triangles.push([a, d, b]);
        }
    }
    column_blocked(&points, &triangles)
}

/// Routes library logs to the test harness, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Pure translation.
pub fn translation(x: f64, y: f64, z: f64) -> Pose {
    Pose(Matrix4::new_translation(&Vector3::new(x, y, z)))
}

/// A regular lattice of points spanning `[-extent, extent]^3`.
pub fn probe_lattice(extent: f64, steps: i32) -> Vec<Point3<f64>> {
    let mut points = Vec::new();
    for i in -steps..=steps {
        for j in -steps..=steps {
            for k in -steps..=steps {
                let s = extent / f64::from(steps);
                points.push(Point3::new(f64::from(i) * s, f64::from(j) * s, f64::from(k) * s));
            }
        }
    }
    points
}
