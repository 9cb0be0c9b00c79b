//! Point sampling of sparse grids.
//!
//! Each sampler has an index-space entry point and a world-space one that
//! goes through the grid's transform first. Inactive coordinates contribute
//! their resolved inactive value, so sampling near the band edge blends
//! toward the background.

use nalgebra::Point3;

use crate::grid::{GridValue, SparseGrid};
use crate::voxel::VoxelCoord;

/// Value of the voxel nearest to a world-space point.
#[must_use]
pub fn sample_nearest<T: GridValue>(grid: &SparseGrid<T>, world: &Point3<f64>) -> f64 {
    let ijk = grid.transform().world_to_index_cell_centered(world);
    grid.value(ijk).to_f64()
}

/// Trilinear interpolation at a world-space point.
#[must_use]
pub fn sample_box<T: GridValue>(grid: &SparseGrid<T>, world: &Point3<f64>) -> f64 {
    sample_box_index(grid, &grid.transform().world_to_index(world))
}

/// Triquadratic interpolation at a world-space point.
#[must_use]
pub fn sample_quadratic<T: GridValue>(grid: &SparseGrid<T>, world: &Point3<f64>) -> f64 {
    sample_quadratic_index(grid, &grid.transform().world_to_index(world))
}

/// Trilinear interpolation at a continuous index-space position.
///
/// # Example
///
/// ```
/// use vdb_grid::{sample_box_index, FloatGrid, VoxelCoord};
/// use nalgebra::Point3;
///
/// let mut grid = FloatGrid::new(0.0);
/// grid.set_value(VoxelCoord::new(1, 0, 0), 4.0);
/// let v = sample_box_index(&grid, &Point3::new(0.25, 0.0, 0.0));
/// assert!((v - 1.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn sample_box_index<T: GridValue>(grid: &SparseGrid<T>, ijk: &Point3<f64>) -> f64 {
    let base = VoxelCoord::floor(ijk);
    let u = ijk.x - f64::from(base.x);
    let v = ijk.y - f64::from(base.y);
    let w = ijk.z - f64::from(base.z);

    let at = |dx, dy, dz| grid.value(base.offset(dx, dy, dz)).to_f64();
    let lerp = |a: f64, b: f64, t: f64| a + (b - a) * t;

    let x00 = lerp(at(0, 0, 0), at(1, 0, 0), u);
    let x10 = lerp(at(0, 1, 0), at(1, 1, 0), u);
    let x01 = lerp(at(0, 0, 1), at(1, 0, 1), u);
    let x11 = lerp(at(0, 1, 1), at(1, 1, 1), u);
    lerp(lerp(x00, x10, v), lerp(x01, x11, v), w)
}

/// Triquadratic interpolation at a continuous index-space position.
///
/// A parabola is fitted through each run of three samples around the floor
/// voxel, first along z, then y, then x, and evaluated at the fractional offset.
#[must_use]
pub fn sample_quadratic_index<T: GridValue>(grid: &SparseGrid<T>, ijk: &Point3<f64>) -> f64 {
    let base = VoxelCoord::floor(ijk);
    let u = ijk.x - f64::from(base.x);
    let v = ijk.y - f64::from(base.y);
    let w = ijk.z - f64::from(base.z);

    let mut along_x = [0.0; 3];
    for (dx, slot_x) in (-1..=1).zip(along_x.iter_mut()) {
        let mut along_y = [0.0; 3];
        for (dy, slot_y) in (-1..=1).zip(along_y.iter_mut()) {
            let vz = [-1, 0, 1].map(|dz| grid.value(base.offset(dx, dy, dz)).to_f64());
            *slot_y = parabola(vz, w);
        }
        *slot_x = parabola(along_y, v);
    }
    parabola(along_x, u)
}

/// Evaluates the parabola through `(-1, s0)`, `(0, s1)`, `(1, s2)` at `t`.
fn parabola(s: [f64; 3], t: f64) -> f64 {
    let a = 0.5 * (s[0] + s[2]) - s[1];
    let b = 0.5 * (s[2] - s[0]);
    t * (t * a + b) + s[1]
}
