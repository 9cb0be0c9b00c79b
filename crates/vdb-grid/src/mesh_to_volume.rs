//! Conversion of triangle meshes into narrow-band signed distance grids.
//!
//! The conversion runs in four stages:
//!
//! 1. **Seeding**: every voxel within [`SEED_RADIUS`] of a triangle gets its
//!    exact unsigned distance and the index of the closest triangle.
//! 2. **Propagation**: the band grows outward from the seed shell in order of
//!    distance until the exterior or interior half-width is reached. Each new
//!    voxel is measured exactly against the polygons carried by its frozen
//!    face neighbors and keeps the closest one.
//! 3. **Sign**: inside/outside is decided by ray parity along +X, evaluated
//!    once per index-space row.
//! 4. **Interior fill**: inactive interior regions are set to the negative
//!    background, whole tiles at a time where possible.
//!
//! A propagated distance is exact for the polygon it carries. It can only
//! exceed the true distance where the closest polygon was never carried into
//! the voxel's neighborhood.
//!
//! The active shell is never thinner than [`MIN_HALF_WIDTH`] voxels, so every
//! tile the surface crosses holds active voxels. Stored magnitudes are capped
//! at the requested half-widths.

// Voxel counts and index ranges stay far below 2^52.
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};
use nalgebra::Point3;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::bounds::{Aabb, GridBounds};
use crate::error::{GridError, GridResult};
use crate::grid::{FloatGrid, Int32Grid};
use crate::transform::Transform;
use crate::triangle::Triangle;
use crate::voxel::{TILE_DIM, VoxelCoord};

/// Background of a polygon index grid.
pub const INVALID_POLYGON: i32 = -1;

/// Voxels closer than this (in voxels) to a triangle get exact seed distances.
pub const SEED_RADIUS: f64 = 1.5;

/// Smallest half-width, in voxels, used to activate the band.
///
/// Every surface point lies within `sqrt(3) / 2` voxels of a voxel center.
pub const MIN_HALF_WIDTH: f64 = 1.0;

// Seed boxes must cover every voxel within SEED_RADIUS of the triangle.
const SEED_MARGIN: i32 = 2;

// Parity rays are nudged off the lattice so they do not graze shared edges.
const ROW_JITTER_Y: f64 = 1.234_567e-7;
const ROW_JITTER_Z: f64 = 2.718_281e-7;

/// A polygon soup that can report its corners in a grid's index space.
///
/// Only triangles are supported; `corner` is always in `0..3`.
pub trait PolygonSource {
    /// Number of polygons.
    fn polygon_count(&self) -> usize;

    /// Number of distinct points.
    fn point_count(&self) -> usize;

    /// Corner `corner` of polygon `polygon`, in index space.
    fn index_space_point(&self, polygon: usize, corner: usize) -> Point3<f64>;

    /// The polygon as an index-space triangle.
    fn triangle(&self, polygon: usize) -> Triangle {
        Triangle::new(
            self.index_space_point(polygon, 0),
            self.index_space_point(polygon, 1),
            self.index_space_point(polygon, 2),
        )
    }
}

/// Parameters for [`mesh_to_volume`].
///
/// # Example
///
/// ```
/// use vdb_grid::MeshToVolumeParams;
///
/// let params = MeshToVolumeParams::new(3.0).fill_interior().with_polygon_index(true);
/// assert!(params.interior_band > 1e30);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshToVolumeParams {
    /// Exterior half-width in voxels.
    pub exterior_band: f32,
    /// Interior half-width in voxels; `f32::MAX` fills the whole interior.
    pub interior_band: f32,
    /// Whether to return the closest-polygon index of each active voxel.
    pub polygon_index: bool,
}

impl Default for MeshToVolumeParams {
    fn default() -> Self {
        Self::new(3.0)
    }
}

impl MeshToVolumeParams {
    /// Symmetric band of `half_width` voxels on both sides.
    #[must_use]
    pub const fn new(half_width: f32) -> Self {
        Self {
            exterior_band: half_width,
            interior_band: half_width,
            polygon_index: false,
        }
    }

    /// Sets the exterior half-width.
    #[must_use]
    pub const fn with_exterior_band(mut self, voxels: f32) -> Self {
        self.exterior_band = voxels;
        self
    }

    /// Sets the interior half-width.
    #[must_use]
    pub const fn with_interior_band(mut self, voxels: f32) -> Self {
        self.interior_band = voxels;
        self
    }

    /// Activates every interior voxel.
    #[must_use]
    pub const fn fill_interior(mut self) -> Self {
        self.interior_band = f32::MAX;
        self
    }

    /// Requests the polygon index grid.
    #[must_use]
    pub const fn with_polygon_index(mut self, enabled: bool) -> Self {
        self.polygon_index = enabled;
        self
    }

    /// Checks that both half-widths are positive.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidBandWidth`] otherwise.
    pub fn validate(&self) -> GridResult<()> {
        if self.exterior_band > 0.0 && self.interior_band > 0.0 {
            Ok(())
        } else {
            Err(GridError::InvalidBandWidth {
                exterior: self.exterior_band,
                interior: self.interior_band,
            })
        }
    }
}

/// Output of [`mesh_to_volume`].
#[derive(Debug, Clone)]
pub struct MeshVolume {
    /// Signed distances in world units; negative inside.
    pub distance: FloatGrid,
    /// Closest polygon per active voxel, when requested.
    pub polygon_index: Option<Int32Grid>,
}

/// Converts a triangle mesh into a signed distance grid.
///
/// Distances are stored in world units using the x voxel size of
/// `transform`. The background is `exterior_band * voxel_size`; inactive
/// interior coordinates resolve to its negation.
///
/// # Errors
///
/// Returns [`GridError::InvalidBandWidth`] for non-positive band widths.
///
/// # Example
///
/// ```
/// use vdb_grid::{mesh_to_volume, MeshToVolumeParams, PolygonSource, Transform};
/// use nalgebra::Point3;
///
/// struct Tetra([Point3<f64>; 4]);
///
/// impl PolygonSource for Tetra {
///     fn polygon_count(&self) -> usize { 4 }
///     fn point_count(&self) -> usize { 4 }
///     fn index_space_point(&self, polygon: usize, corner: usize) -> Point3<f64> {
///         const FACES: [[usize; 3]; 4] = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]];
///         self.0[FACES[polygon][corner]]
///     }
/// }
///
/// let tetra = Tetra([
///     Point3::new(-4.3, -4.3, -4.3),
///     Point3::new(6.1, -4.3, -4.3),
///     Point3::new(-4.3, 6.1, -4.3),
///     Point3::new(-4.3, -4.3, 6.1),
/// ]);
/// let volume = mesh_to_volume(&tetra, &Transform::identity(), &MeshToVolumeParams::new(2.0)).unwrap();
/// assert!(volume.distance.active_voxel_count() > 0);
/// assert!(volume.distance.value(vdb_grid::VoxelCoord::new(-2, -2, -2)) < 0.0);
/// ```
pub fn mesh_to_volume<M>(
    mesh: &M,
    transform: &Transform,
    params: &MeshToVolumeParams,
) -> GridResult<MeshVolume>
where
    M: PolygonSource + ?Sized,
{
    params.validate()?;

    let voxel_size = transform.voxel_size().x;
    let background = (f64::from(params.exterior_band) * voxel_size) as f32;
    let mut distance = FloatGrid::with_transform(background, transform.clone());
    let mut polygon_index = params
        .polygon_index
        .then(|| Int32Grid::with_transform(INVALID_POLYGON, transform.clone()));

    let triangles: Vec<Triangle> = (0..mesh.polygon_count()).map(|p| mesh.triangle(p)).collect();
    let Some(mesh_bounds) = index_bounds(&triangles) else {
        warn!("mesh has no polygons; producing an empty grid");
        return Ok(MeshVolume {
            distance,
            polygon_index,
        });
    };

    let exterior_cap = f64::from(params.exterior_band) * voxel_size;
    let interior_cap = f64::from(params.interior_band) * voxel_size;
    let exterior = f64::from(params.exterior_band).max(MIN_HALF_WIDTH);
    let interior = f64::from(params.interior_band).max(MIN_HALF_WIDTH);
    let margin = exterior.ceil().min(f64::from(i32::MAX / 4)) as i32 + 1;
    let region = mesh_bounds.dilated(margin);

    debug!(
        polygons = triangles.len(),
        points = mesh.point_count(),
        exterior,
        interior,
        "converting mesh to level set"
    );

    let parity = ParityTable::build(&triangles, &region);
    let limit = |c: VoxelCoord| {
        if parity.is_inside(c) {
            interior
        } else {
            exterior
        }
    };

    let mut band = seed_shell(&triangles, &region);
    propagate(&mut band, &triangles, &region, limit);

    for (coord, cell) in &band {
        let inside = parity.is_inside(*coord);
        let (half_width, cap) = if inside {
            (interior, interior_cap)
        } else {
            (exterior, exterior_cap)
        };
        if cell.distance >= half_width {
            continue;
        }
        let world = (cell.distance * voxel_size).min(cap);
        let signed = if inside { -world } else { world };
        distance.set_value(*coord, signed as f32);
        if let Some(index_grid) = polygon_index.as_mut() {
            index_grid.set_value(*coord, cell.polygon);
        }
    }

    fill_interior(&mut distance, &mesh_bounds, &parity);

    info!(
        polygons = triangles.len(),
        active_voxels = distance.active_voxel_count(),
        "mesh converted to level set"
    );

    Ok(MeshVolume {
        distance,
        polygon_index,
    })
}

#[derive(Debug, Clone, Copy)]
struct BandCell {
    distance: f64,
    polygon: i32,
}

fn index_bounds(triangles: &[Triangle]) -> Option<GridBounds> {
    let aabb = Aabb::from_points(triangles.iter().flat_map(|t| [t.a, t.b, t.c]))?;
    Some(GridBounds::new(
        VoxelCoord::floor(&aabb.min),
        VoxelCoord::floor(&aabb.max).offset(1, 1, 1),
    ))
}

fn clamp_to(bounds: &GridBounds, region: &GridBounds) -> Option<GridBounds> {
    let min = VoxelCoord::new(
        bounds.min.x.max(region.min.x),
        bounds.min.y.max(region.min.y),
        bounds.min.z.max(region.min.z),
    );
    let max = VoxelCoord::new(
        bounds.max.x.min(region.max.x),
        bounds.max.y.min(region.max.y),
        bounds.max.z.min(region.max.z),
    );
    (min.x <= max.x && min.y <= max.y && min.z <= max.z).then_some(GridBounds { min, max })
}

/// Exact distances for every voxel within [`SEED_RADIUS`] of the surface.
fn seed_shell(triangles: &[Triangle], region: &GridBounds) -> HashMap<VoxelCoord, BandCell> {
    let mut shell: HashMap<VoxelCoord, BandCell> = HashMap::new();
    for (polygon, tri) in triangles.iter().enumerate() {
        let Some(bounds) = index_bounds(std::slice::from_ref(tri))
            .map(|b| b.dilated(SEED_MARGIN))
            .and_then(|b| clamp_to(&b, region))
        else {
            continue;
        };
        for coord in &bounds {
            let d = tri.distance(&coord.to_point());
            if d > SEED_RADIUS {
                continue;
            }
            let cell = BandCell {
                distance: d,
                polygon: i32::try_from(polygon).unwrap_or(i32::MAX),
            };
            shell
                .entry(coord)
                .and_modify(|c| {
                    if d < c.distance {
                        *c = cell;
                    }
                })
                .or_insert(cell);
        }
    }
    shell
}

#[derive(Debug, PartialEq)]
struct Trial {
    distance: f64,
    coord: VoxelCoord,
}

impl Eq for Trial {}

impl Ord for Trial {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on distance.
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

impl PartialOrd for Trial {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Grows the band from the frozen seed shell, closest voxels first.
fn propagate<F>(
    band: &mut HashMap<VoxelCoord, BandCell>,
    triangles: &[Triangle],
    region: &GridBounds,
    limit: F,
) where
    F: Fn(VoxelCoord) -> f64,
{
    let mut heap = BinaryHeap::new();
    let seeds: Vec<VoxelCoord> = band.keys().copied().collect();
    for c in seeds {
        push_neighbors(band, triangles, &mut heap, region, c);
    }

    while let Some(Trial { coord, .. }) = heap.pop() {
        if band.contains_key(&coord) {
            continue;
        }
        let Some(cell) = closest_carried(band, triangles, coord) else {
            continue;
        };
        if cell.distance >= limit(coord) {
            continue;
        }
        band.insert(coord, cell);
        push_neighbors(band, triangles, &mut heap, region, coord);
    }
}

fn push_neighbors(
    band: &HashMap<VoxelCoord, BandCell>,
    triangles: &[Triangle],
    heap: &mut BinaryHeap<Trial>,
    region: &GridBounds,
    c: VoxelCoord,
) {
    for n in c.face_neighbors() {
        if region.contains(n) && !band.contains_key(&n) {
            if let Some(cell) = closest_carried(band, triangles, n) {
                heap.push(Trial {
                    distance: cell.distance,
                    coord: n,
                });
            }
        }
    }
}

/// Exact distance from `c` to the closest polygon carried by a frozen face
/// neighbor.
fn closest_carried(
    band: &HashMap<VoxelCoord, BandCell>,
    triangles: &[Triangle],
    c: VoxelCoord,
) -> Option<BandCell> {
    let p = c.to_point();
    let mut best: Option<BandCell> = None;
    for n in c.face_neighbors() {
        let Some(neighbor) = band.get(&n) else {
            continue;
        };
        if best.is_some_and(|b| b.polygon == neighbor.polygon) {
            continue;
        }
        let Some(tri) = usize::try_from(neighbor.polygon)
            .ok()
            .and_then(|i| triangles.get(i))
        else {
            continue;
        };
        let distance = tri.distance(&p);
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(BandCell {
                distance,
                polygon: neighbor.polygon,
            });
        }
    }
    best
}

/// Sorted +X crossings of the mesh for each `(y, z)` row of a region.
struct ParityTable {
    rows: HashMap<(i32, i32), Vec<f64>>,
}

impl ParityTable {
    fn build(triangles: &[Triangle], region: &GridBounds) -> Self {
        let mut bins: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
        for (i, tri) in triangles.iter().enumerate() {
            let (lo, hi) = (tri.min(), tri.max());
            let y0 = ((lo.y - ROW_JITTER_Y).ceil() as i32).max(region.min.y);
            let y1 = ((hi.y - ROW_JITTER_Y).floor() as i32).min(region.max.y);
            let z0 = ((lo.z - ROW_JITTER_Z).ceil() as i32).max(region.min.z);
            let z1 = ((hi.z - ROW_JITTER_Z).floor() as i32).min(region.max.z);
            for y in y0..=y1 {
                for z in z0..=z1 {
                    bins.entry((y, z)).or_default().push(i);
                }
            }
        }

        let bins: Vec<_> = bins.into_iter().collect();
        let rows = bins
            .par_iter()
            .map(|((y, z), tris)| {
                let ry = f64::from(*y) + ROW_JITTER_Y;
                let rz = f64::from(*z) + ROW_JITTER_Z;
                let mut xs: Vec<f64> = tris
                    .iter()
                    .filter_map(|&i| triangles[i].x_crossing(ry, rz))
                    .collect();
                xs.sort_by(f64::total_cmp);
                ((*y, *z), xs)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .collect();

        Self { rows }
    }

    fn is_inside(&self, c: VoxelCoord) -> bool {
        self.rows.get(&(c.y, c.z)).is_some_and(|xs| {
            let x = f64::from(c.x);
            let beyond = xs.len() - xs.partition_point(|&cx| cx <= x);
            beyond % 2 == 1
        })
    }
}

/// Marks inactive interior coordinates with the negative background.
fn fill_interior(grid: &mut FloatGrid, mesh_bounds: &GridBounds, parity: &ParityTable) {
    let inside_value = -grid.background();
    let occupied: HashSet<VoxelCoord> = grid.iter_active().map(|(c, _)| c.tile_origin()).collect();

    let first = mesh_bounds.min.tile_origin();
    let last = mesh_bounds.max.tile_origin();
    let mut tiles = 0usize;
    let mut voxels = 0usize;

    let mut tz = first.z;
    while tz <= last.z {
        let mut ty = first.y;
        while ty <= last.y {
            let mut tx = first.x;
            while tx <= last.x {
                let origin = VoxelCoord::new(tx, ty, tz);
                let span = GridBounds::new(
                    origin,
                    origin.offset(TILE_DIM - 1, TILE_DIM - 1, TILE_DIM - 1),
                );
                if occupied.contains(&origin) {
                    for c in &span {
                        if !grid.is_active(c) && parity.is_inside(c) {
                            grid.set_inactive_value(c, inside_value);
                            voxels += 1;
                        }
                    }
                } else if parity.is_inside(origin.offset(TILE_DIM / 2, TILE_DIM / 2, TILE_DIM / 2)) {
                    grid.set_tile(origin, inside_value);
                    tiles += 1;
                }
                tx += TILE_DIM;
            }
            ty += TILE_DIM;
        }
        tz += TILE_DIM;
    }
    debug!(tiles, voxels, "filled inactive interior");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Axis-aligned box with outward-facing triangles, in index space.
    struct BoxMesh {
        points: [Point3<f64>; 8],
    }

    const BOX_FACES: [[usize; 3]; 12] = [
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [2, 3, 7],
        [2, 7, 6],
        [1, 2, 6],
        [1, 6, 5],
        [0, 4, 7],
        [0, 7, 3],
    ];

    impl BoxMesh {
        fn new(min: f64, max: f64) -> Self {
            Self {
                points: [
                    Point3::new(min, min, min),
                    Point3::new(max, min, min),
                    Point3::new(max, max, min),
                    Point3::new(min, max, min),
                    Point3::new(min, min, max),
                    Point3::new(max, min, max),
                    Point3::new(max, max, max),
                    Point3::new(min, max, max),
                ],
            }
        }
    }

    impl PolygonSource for BoxMesh {
        fn polygon_count(&self) -> usize {
            BOX_FACES.len()
        }

        fn point_count(&self) -> usize {
            self.points.len()
        }

        fn index_space_point(&self, polygon: usize, corner: usize) -> Point3<f64> {
            self.points[BOX_FACES[polygon][corner]]
        }
    }

    #[test]
    fn test_closest_carried_picks_nearest_polygon() {
        let triangles = [
            Triangle::new(
                Point3::new(0.0, -9.0, -9.0),
                Point3::new(0.0, 9.0, -9.0),
                Point3::new(0.0, 0.0, 9.0),
            ),
            Triangle::new(
                Point3::new(6.0, -9.0, -9.0),
                Point3::new(6.0, 9.0, -9.0),
                Point3::new(6.0, 0.0, 9.0),
            ),
        ];
        let mut band = HashMap::new();
        band.insert(VoxelCoord::new(1, 0, 0), BandCell { distance: 1.0, polygon: 0 });
        band.insert(VoxelCoord::new(3, 0, 0), BandCell { distance: 3.0, polygon: 1 });

        let cell = closest_carried(&band, &triangles, VoxelCoord::new(2, 0, 0)).unwrap();
        assert_eq!(cell.polygon, 0);
        assert_relative_eq!(cell.distance, 2.0);
        assert!(closest_carried(&band, &triangles, VoxelCoord::new(9, 9, 9)).is_none());
    }

    #[test]
    fn test_invalid_band_rejected() {
        let mesh = BoxMesh::new(-5.5, 4.5);
        let params = MeshToVolumeParams::new(0.0);
        assert!(matches!(
            mesh_to_volume(&mesh, &Transform::identity(), &params),
            Err(GridError::InvalidBandWidth { .. })
        ));
    }

    #[test]
    fn test_box_signs_and_band() {
        let mesh = BoxMesh::new(-5.5, 4.5);
        let params = MeshToVolumeParams::new(3.0).with_polygon_index(true);
        let volume = mesh_to_volume(&mesh, &Transform::identity(), &params).unwrap();
        let grid = &volume.distance;

        assert_eq!(grid.background(), 3.0);
        // Just inside the -x face.
        assert_relative_eq!(grid.value(VoxelCoord::new(-5, 0, 0)), -0.5, epsilon = 1e-6);
        // Just outside the +x face.
        assert_relative_eq!(grid.value(VoxelCoord::new(5, 0, 0)), 0.5, epsilon = 1e-6);
        // Propagated along the face normal stays exact.
        assert_relative_eq!(grid.value(VoxelCoord::new(6, 0, 0)), 1.5, epsilon = 1e-6);
        // Beyond the band: background outside, negative background inside.
        assert_eq!(grid.value(VoxelCoord::new(9, 0, 0)), 3.0);
        assert!(!grid.is_active(VoxelCoord::new(-1, 0, 0)));
        assert_eq!(grid.value(VoxelCoord::new(-1, 0, 0)), -3.0);

        for (_, v) in grid.iter_active() {
            assert!(v.abs() < 3.0);
        }

        let index = volume.polygon_index.unwrap();
        assert_eq!(index.active_voxel_count(), grid.active_voxel_count());
        let p = index.value(VoxelCoord::new(5, 0, 0));
        assert!((0..12).contains(&p));
        assert_eq!(index.value(VoxelCoord::new(50, 0, 0)), INVALID_POLYGON);
    }

    #[test]
    fn test_fill_interior_activates_core() {
        let mesh = BoxMesh::new(-5.5, 4.5);
        let params = MeshToVolumeParams::new(2.0).fill_interior();
        let volume = mesh_to_volume(&mesh, &Transform::identity(), &params).unwrap();
        let grid = &volume.distance;
        let center = VoxelCoord::new(-1, 0, 0);
        assert!(grid.is_active(center));
        // Equidistant from the -x, +y and +z faces.
        assert_relative_eq!(grid.value(center), -4.5, epsilon = 1e-5);
        // Deep voxels off the center keep exact depths too.
        assert_relative_eq!(grid.value(VoxelCoord::new(-3, -2, 1)), -2.5, epsilon = 1e-5);
        assert!(volume.polygon_index.is_none());
    }

    #[test]
    fn test_sub_voxel_band_keeps_a_closed_shell() {
        let mesh = BoxMesh::new(-5.5, 4.5);
        let params = MeshToVolumeParams::new(0.4);
        let volume = mesh_to_volume(&mesh, &Transform::identity(), &params).unwrap();
        let grid = &volume.distance;

        assert_relative_eq!(grid.background(), 0.4, epsilon = 1e-6);
        assert!(grid.active_voxel_count() > 0);
        // Half a voxel from the faces: active, capped at the band.
        assert!(grid.is_active(VoxelCoord::new(5, 0, 0)));
        assert_relative_eq!(grid.value(VoxelCoord::new(5, 0, 0)), 0.4, epsilon = 1e-6);
        assert_relative_eq!(grid.value(VoxelCoord::new(-5, 0, 0)), -0.4, epsilon = 1e-6);
        assert_relative_eq!(grid.value(VoxelCoord::new(4, 2, -3)), -0.4, epsilon = 1e-6);
        // Outside the shell the sign still follows the mesh.
        assert_eq!(grid.value(VoxelCoord::new(7, 0, 0)), 0.4);
        assert_eq!(grid.value(VoxelCoord::new(0, 0, 0)), -0.4);
        for (_, v) in grid.iter_active() {
            assert!(v.abs() <= 0.4 + 1e-6);
        }
    }

    #[test]
    fn test_scaled_transform_uses_world_units() {
        let mesh = BoxMesh::new(-5.5, 4.5);
        let params = MeshToVolumeParams::new(3.0);
        let volume = mesh_to_volume(&mesh, &Transform::linear(0.1).unwrap(), &params).unwrap();
        assert_relative_eq!(volume.distance.background(), 0.3, epsilon = 1e-6);
        assert_relative_eq!(
            volume.distance.value(VoxelCoord::new(5, 0, 0)),
            0.05,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_empty_mesh() {
        struct Empty;
        impl PolygonSource for Empty {
            fn polygon_count(&self) -> usize {
                0
            }
            fn point_count(&self) -> usize {
                0
            }
            fn index_space_point(&self, _: usize, _: usize) -> Point3<f64> {
                Point3::origin()
            }
        }
        let volume =
            mesh_to_volume(&Empty, &Transform::identity(), &MeshToVolumeParams::default()).unwrap();
        assert_eq!(volume.distance.active_voxel_count(), 0);
    }
}
