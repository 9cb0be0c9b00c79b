//! Point-cloud fusion into paired TSDF and weight grids.
//!
//! Depth measurements are integrated with projective truncated signed
//! distances along each sensor ray, and the fused zero level set is turned
//! back into a triangle mesh with surface nets. A layer of the map is the
//! pair of grids stored under the same ID in a distance manager and a weight
//! manager.

use std::collections::BTreeSet;

use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::{debug, info};
use vdb_grid::{FloatGrid, Ray, VoxelCoord, VoxelTraversal};

use crate::error::{ManagerError, ManagerResult};
use crate::manager::VdbManager;
use crate::pose::{Pose, apply_pose_to_grid, create_local_transform};

/// Weight function giving every observation the same weight, so fused
/// values are the running mean of the measurements.
#[must_use]
pub const fn mean_weight(_sdf: f32) -> f32 {
    1.0
}

/// Options for integrating clouds and extracting meshes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FusionParams {
    /// Trace each ray from the sensor origin instead of only through the
    /// band around the measured point, clearing free space on the way.
    pub space_carving: bool,

    /// Keep active corners that carry zero weight during extraction instead
    /// of skipping the cells that touch them. Corners below `min_weight` are
    /// skipped either way.
    pub fill_holes: bool,

    /// Minimum accumulated weight for a voxel to count as observed.
    pub min_weight: f32,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            space_carving: false,
            fill_holes: true,
            min_weight: 0.5,
        }
    }
}

impl FusionParams {
    /// Set whether rays are traced from the origin.
    #[must_use]
    pub const fn with_space_carving(mut self, enabled: bool) -> Self {
        self.space_carving = enabled;
        self
    }

    /// Set whether active zero-weight corners take part in extraction.
    #[must_use]
    pub const fn with_fill_holes(mut self, enabled: bool) -> Self {
        self.fill_holes = enabled;
        self
    }

    /// Set the minimum observed weight.
    #[must_use]
    pub const fn with_min_weight(mut self, weight: f32) -> Self {
        self.min_weight = weight;
        self
    }

    /// Validate the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::InvalidConfig`] if `min_weight` is negative or
    /// not finite.
    pub fn validate(&self) -> ManagerResult<()> {
        if !self.min_weight.is_finite() || self.min_weight < 0.0 {
            return Err(ManagerError::invalid_config(format!(
                "min_weight must be finite and non-negative, got {}",
                self.min_weight
            )));
        }
        Ok(())
    }
}

/// An indexed triangle mesh in world space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,
    /// Zero-based vertex indices, counter-clockwise seen from outside.
    pub triangles: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// True when the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// A volume that fuses depth measurements and yields a surface.
pub trait VolumeFusion {
    /// Integrates measured `points` seen from the sensor at `origin`.
    ///
    /// `weight` maps the signed distance of each sample to its weight.
    fn integrate<W>(&mut self, points: &[Point3<f64>], origin: &Point3<f64>, weight: W)
    where
        W: Fn(f32) -> f32;

    /// Extracts the zero level set of the fused distances.
    fn extract_triangle_mesh(&self, fill_holes: bool, min_weight: f32) -> TriangleMesh;
}

/// A TSDF grid and its weight grid, sharing one transform.
#[derive(Debug, Clone)]
pub struct FusionVolume {
    tsdf: FloatGrid,
    weights: FloatGrid,
    truncation: f32,
    space_carving: bool,
}

impl FusionVolume {
    /// Creates an empty volume with a corner-aligned transform at
    /// `resolution` voxels per meter.
    ///
    /// The TSDF background is `truncation`; the weight background is 0.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Grid`] if `resolution` is not positive.
    pub fn new(resolution: f32, truncation: f32, space_carving: bool) -> ManagerResult<Self> {
        let local = create_local_transform(resolution, false)?;
        Ok(Self {
            tsdf: FloatGrid::with_transform(truncation, local.clone()),
            weights: FloatGrid::with_transform(0.0, local),
            truncation,
            space_carving,
        })
    }

    /// Wraps existing grids.
    #[must_use]
    pub const fn from_grids(
        tsdf: FloatGrid,
        weights: FloatGrid,
        truncation: f32,
        space_carving: bool,
    ) -> Self {
        Self {
            tsdf,
            weights,
            truncation,
            space_carving,
        }
    }

    /// The fused distances.
    #[must_use]
    pub const fn tsdf(&self) -> &FloatGrid {
        &self.tsdf
    }

    /// The accumulated weights.
    #[must_use]
    pub const fn weights(&self) -> &FloatGrid {
        &self.weights
    }

    /// Applies `pose` to both grids.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Grid`] for an invalid resolution or a
    /// singular pose.
    pub fn apply_pose(
        &mut self,
        resolution: f32,
        pose: &Pose,
        voxel_centered: bool,
    ) -> ManagerResult<()> {
        apply_pose_to_grid(&mut self.tsdf, resolution, pose, voxel_centered)?;
        apply_pose_to_grid(&mut self.weights, resolution, pose, voxel_centered)
    }

    /// Splits the volume into its TSDF and weight grids.
    #[must_use]
    pub fn into_grids(self) -> (FloatGrid, FloatGrid) {
        (self.tsdf, self.weights)
    }
}

impl VolumeFusion for FusionVolume {
    /// Voxel `(i, j, k)` is the cell `[i, i+1)` of the current index space,
    /// so the grids must carry a corner-aligned transform while integrating.
    #[allow(clippy::cast_possible_truncation)]
    fn integrate<W>(&mut self, points: &[Point3<f64>], origin: &Point3<f64>, weight: W)
    where
        W: Fn(f32) -> f32,
    {
        let truncation = f64::from(self.truncation);
        let transform = self.tsdf.transform().clone();
        let half = Vector3::repeat(0.5);
        let mut skipped = 0usize;
        let mut updates = 0usize;

        for point in points {
            let offset = point - origin;
            let depth = offset.norm();
            if !depth.is_finite() || depth <= f64::EPSILON {
                skipped += 1;
                continue;
            }
            let direction = offset / depth;
            let t_start = if self.space_carving {
                0.0
            } else {
                (depth - truncation).max(0.0)
            };
            let t_end = depth + truncation;

            let ray = Ray::new(*origin, direction).to_index_space(&transform);
            for (coord, _) in VoxelTraversal::new(&ray, t_start, t_end) {
                let center = transform.index_to_world(&(coord.to_point() + half));
                let sdf = projective_sdf(origin, point, &center);
                if sdf <= -truncation {
                    continue;
                }
                let sample_weight = f64::from(weight(sdf as f32));
                let last_weight = f64::from(self.weights.value(coord));
                let fused_weight = last_weight + sample_weight;
                if fused_weight <= 0.0 {
                    continue;
                }
                let last_tsdf = f64::from(self.tsdf.value(coord));
                let tsdf = sdf.min(truncation);
                let fused = (last_tsdf * last_weight + tsdf * sample_weight) / fused_weight;
                self.tsdf.set_value(coord, fused as f32);
                self.weights.set_value(coord, fused_weight as f32);
                updates += 1;
            }
        }

        debug!(points = points.len(), skipped, updates, "integrated point cloud");
    }

    fn extract_triangle_mesh(&self, fill_holes: bool, min_weight: f32) -> TriangleMesh {
        extract_surface(&self.tsdf, &self.weights, fill_holes, min_weight)
    }
}

/// Distance from `voxel` to the measured `point`, positive when the voxel
/// lies between the sensor and the point.
fn projective_sdf(origin: &Point3<f64>, point: &Point3<f64>, voxel: &Point3<f64>) -> f64 {
    let to_voxel = voxel - origin;
    let to_point = point - voxel;
    let distance = to_point.norm();
    if to_voxel.dot(&to_point) < 0.0 {
        -distance
    } else {
        distance
    }
}

const CORNERS: [[i32; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

const EDGES: [(usize, usize); 12] = [
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Unit step along `axis`, scaled by `d`.
const fn step(c: VoxelCoord, axis: usize, d: i32) -> VoxelCoord {
    match axis {
        0 => c.offset(d, 0, 0),
        1 => c.offset(0, d, 0),
        _ => c.offset(0, 0, d),
    }
}

fn corner_offset(corner: usize) -> Vector3<f64> {
    let [x, y, z] = CORNERS[corner];
    Vector3::new(f64::from(x), f64::from(y), f64::from(z))
}

struct SurfaceSampler<'a> {
    tsdf: &'a FloatGrid,
    weights: &'a FloatGrid,
    fill_holes: bool,
    min_weight: f32,
}

impl SurfaceSampler<'_> {
    fn corner(&self, c: VoxelCoord) -> Option<f64> {
        if !self.tsdf.is_active(c) {
            return None;
        }
        let weight = self.weights.value(c);
        if weight < self.min_weight || (weight <= 0.0 && !self.fill_holes) {
            return None;
        }
        Some(f64::from(self.tsdf.value(c)))
    }

    /// Surface-nets vertex of the cell whose lowest corner is `cell`, in
    /// index space.
    fn cell_vertex(&self, cell: VoxelCoord) -> Option<Point3<f64>> {
        let mut values = [0.0; 8];
        for (value, offset) in values.iter_mut().zip(CORNERS) {
            *value = self.corner(cell.offset(offset[0], offset[1], offset[2]))?;
        }

        let mut sum = Vector3::zeros();
        let mut crossings = 0u32;
        for (a, b) in EDGES {
            let (va, vb) = (values[a], values[b]);
            if (va < 0.0) == (vb < 0.0) {
                continue;
            }
            let t = va / (va - vb);
            let (pa, pb) = (corner_offset(a), corner_offset(b));
            sum += pa + (pb - pa) * t;
            crossings += 1;
        }
        (crossings > 0).then(|| cell.to_point() + sum / f64::from(crossings))
    }
}

/// Extracts the zero level set of `tsdf` with surface nets.
///
/// One vertex is placed in every cell of eight voxels whose corners change
/// sign, and one quad joins the four cells around every sign-changing edge.
/// A cell is skipped when any corner is inactive in `tsdf` or weighs less
/// than `min_weight`. Corners with zero weight are also skipped unless
/// `fill_holes` is set, in which case their stored TSDF value is used.
#[must_use]
pub fn extract_surface(
    tsdf: &FloatGrid,
    weights: &FloatGrid,
    fill_holes: bool,
    min_weight: f32,
) -> TriangleMesh {
    let sampler = SurfaceSampler {
        tsdf,
        weights,
        fill_holes,
        min_weight,
    };

    let mut candidates = BTreeSet::new();
    for (c, _) in tsdf.iter_active() {
        for offset in CORNERS {
            candidates.insert(c.offset(-offset[0], -offset[1], -offset[2]));
        }
    }
    let cells: Vec<VoxelCoord> = candidates.into_iter().collect();

    let placed: Vec<Option<Point3<f64>>> =
        cells.par_iter().map(|&cell| sampler.cell_vertex(cell)).collect();

    let transform = tsdf.transform();
    let mut mesh = TriangleMesh::default();
    let mut index: HashMap<VoxelCoord, usize> = HashMap::new();
    for (&cell, vertex) in cells.iter().zip(&placed) {
        if let Some(p) = vertex {
            index.insert(cell, mesh.vertices.len());
            mesh.vertices.push(transform.index_to_world(p));
        }
    }

    for &c in &cells {
        let Some(v0) = sampler.corner(c) else {
            continue;
        };
        for axis in 0..3 {
            let Some(v1) = sampler.corner(step(c, axis, 1)) else {
                continue;
            };
            if (v0 < 0.0) == (v1 < 0.0) {
                continue;
            }
            // (axis, u, w) is a right-handed cyclic frame.
            let (u, w) = ((axis + 1) % 3, (axis + 2) % 3);
            let quad = [
                step(c, w, -1),
                c,
                step(c, u, -1),
                step(step(c, u, -1), w, -1),
            ];
            let mut ids = [0usize; 4];
            let mut complete = true;
            for (id, cell) in ids.iter_mut().zip(quad) {
                match index.get(&cell) {
                    Some(&i) => *id = i,
                    None => {
                        complete = false;
                        break;
                    }
                }
            }
            if !complete {
                continue;
            }
            if v0 < 0.0 {
                mesh.triangles.push([ids[0], ids[1], ids[2]]);
                mesh.triangles.push([ids[0], ids[2], ids[3]]);
            } else {
                mesh.triangles.push([ids[0], ids[2], ids[1]]);
                mesh.triangles.push([ids[0], ids[3], ids[2]]);
            }
        }
    }

    debug!(
        cells = cells.len(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "extracted surface"
    );
    mesh
}

/// Wraps the grids stored under `id`, or fresh grids if there are none.
fn layer(
    distances: &VdbManager,
    weights: &VdbManager,
    id: u64,
    space_carving: bool,
) -> ManagerResult<FusionVolume> {
    let truncation = distances.truncation_distance();
    match distances.grid(id) {
        Some(tsdf) => {
            let weight_grid = weights
                .grid(id)
                .cloned()
                .unwrap_or_else(|| FloatGrid::with_transform(0.0, tsdf.transform().clone()));
            Ok(FusionVolume::from_grids(tsdf.clone(), weight_grid, truncation, space_carving))
        }
        None => FusionVolume::new(distances.resolution(), truncation, space_carving),
    }
}

/// Fuses a point cloud into layer `id` of a distance and weight manager pair.
///
/// The layer is re-posed to a corner-aligned frame for integration and back
/// to the cell-centered frame afterwards. Both managers then store the
/// updated grids, and the distance manager refreshes its limits and count.
///
/// # Errors
///
/// Returns [`ManagerError::Grid`] if either manager's resolution cannot
/// build a transform.
pub fn insert_point_cloud(
    distances: &mut VdbManager,
    weights: &mut VdbManager,
    id: u64,
    origin: &Point3<f64>,
    points: &[Point3<f64>],
    params: &FusionParams,
) -> ManagerResult<()> {
    let resolution = distances.resolution();
    let zero = Pose::identity();
    let mut volume = layer(distances, weights, id, params.space_carving)?;

    volume.apply_pose(resolution, &zero, false)?;
    volume.integrate(points, origin, mean_weight);
    volume.apply_pose(resolution, &zero, true)?;

    let (tsdf, weight_grid) = volume.into_grids();
    distances.add_elem(id, tsdf);
    weights.add_elem(id, weight_grid);
    distances.recompute_limits();
    distances.tally_active_voxel();

    info!(
        id,
        points = points.len(),
        active_voxels = distances.active_voxel_count_of(id),
        "fused point cloud"
    );
    Ok(())
}

/// Extracts the surface of layer `id`; an unknown ID gives an empty mesh.
///
/// # Errors
///
/// Returns [`ManagerError::InvalidConfig`] if the parameters are invalid.
pub fn create_mesh(
    distances: &VdbManager,
    weights: &VdbManager,
    id: u64,
    params: &FusionParams,
) -> ManagerResult<TriangleMesh> {
    params.validate()?;
    let Some(tsdf) = distances.grid(id) else {
        return Ok(TriangleMesh::default());
    };
    let mesh = match weights.grid(id) {
        Some(weight_grid) => extract_surface(tsdf, weight_grid, params.fill_holes, params.min_weight),
        None => {
            let empty = FloatGrid::with_transform(0.0, tsdf.transform().clone());
            extract_surface(tsdf, &empty, params.fill_holes, params.min_weight)
        }
    };
    info!(
        id,
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "created mesh"
    );
    Ok(mesh)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::config::ManagerConfig;
    use crate::query::InterpMethod;
    use approx::assert_relative_eq;
    use vdb_grid::GridBounds;

    fn managers() -> (VdbManager, VdbManager) {
        let config = ManagerConfig::new(10.0, 0.3, false, true);
        (VdbManager::new(config).unwrap(), VdbManager::new(config).unwrap())
    }

    /// Plane `x = 0.52` sampled on a cell-centered box of voxels.
    fn plane_volume() -> (FloatGrid, FloatGrid) {
        let local = create_local_transform(10.0, true).unwrap();
        let mut tsdf = FloatGrid::with_transform(0.3, local.clone());
        let mut weights = FloatGrid::with_transform(0.0, local);
        let bounds = GridBounds::new(VoxelCoord::new(0, 0, 0), VoxelCoord::new(9, 3, 3));
        for c in &bounds {
            #[allow(clippy::cast_possible_truncation)]
            let value = (tsdf.voxel_center(c).x - 0.52) as f32;
            tsdf.set_value(c, value);
            weights.set_value(c, 1.0);
        }
        (tsdf, weights)
    }

    // ==================== Params Tests ====================

    #[test]
    fn test_params_validation() {
        assert!(FusionParams::default().validate().is_ok());
        assert!(FusionParams::default().with_min_weight(-1.0).validate().is_err());
        assert!(FusionParams::default().with_min_weight(f32::NAN).validate().is_err());
        let params = FusionParams::default().with_space_carving(true).with_fill_holes(false);
        assert!(params.space_carving);
        assert!(!params.fill_holes);
    }

    // ==================== Integration Tests ====================

    #[test]
    fn test_projective_sdf_sign() {
        let origin = Point3::origin();
        let point = Point3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(projective_sdf(&origin, &point, &Point3::new(0.8, 0.0, 0.0)), 0.2);
        assert_relative_eq!(projective_sdf(&origin, &point, &Point3::new(1.1, 0.0, 0.0)), -0.1);
    }

    #[test]
    fn test_single_ray_band() {
        let mut volume = FusionVolume::new(10.0, 0.3, false).unwrap();
        let origin = Point3::new(0.0, 0.05, 0.05);
        volume.integrate(&[Point3::new(1.0, 0.05, 0.05)], &origin, mean_weight);

        let tsdf = volume.tsdf();
        assert_relative_eq!(tsdf.value(VoxelCoord::new(9, 0, 0)), 0.05, epsilon = 1e-5);
        assert_relative_eq!(tsdf.value(VoxelCoord::new(12, 0, 0)), -0.25, epsilon = 1e-5);
        assert_eq!(volume.weights().value(VoxelCoord::new(9, 0, 0)), 1.0);
        // Outside the band on either side.
        assert!(!tsdf.is_active(VoxelCoord::new(5, 0, 0)));
        assert!(!tsdf.is_active(VoxelCoord::new(14, 0, 0)));
    }

    #[test]
    fn test_space_carving_clears_free_space() {
        let mut volume = FusionVolume::new(10.0, 0.3, true).unwrap();
        let origin = Point3::new(0.0, 0.05, 0.05);
        volume.integrate(&[Point3::new(1.0, 0.05, 0.05)], &origin, mean_weight);
        // Far in front of the point the value saturates at the truncation.
        assert_relative_eq!(volume.tsdf().value(VoxelCoord::new(2, 0, 0)), 0.3, epsilon = 1e-6);
        assert!(volume.tsdf().is_active(VoxelCoord::new(0, 0, 0)));
    }

    #[test]
    fn test_repeated_measurements_average() {
        let mut volume = FusionVolume::new(10.0, 0.3, false).unwrap();
        let origin = Point3::new(0.0, 0.05, 0.05);
        volume.integrate(&[Point3::new(1.0, 0.05, 0.05)], &origin, mean_weight);
        volume.integrate(&[Point3::new(1.1, 0.05, 0.05)], &origin, mean_weight);
        let c = VoxelCoord::new(9, 0, 0);
        assert_relative_eq!(volume.tsdf().value(c), 0.1, epsilon = 1e-5);
        assert_eq!(volume.weights().value(c), 2.0);
    }

    #[test]
    fn test_degenerate_points_are_skipped() {
        let mut volume = FusionVolume::new(10.0, 0.3, false).unwrap();
        let origin = Point3::origin();
        volume.integrate(&[origin, Point3::new(f64::NAN, 0.0, 0.0)], &origin, mean_weight);
        assert_eq!(volume.tsdf().active_voxel_count(), 0);
    }

    // ==================== Extraction Tests ====================

    #[test]
    fn test_plane_extraction() {
        let (tsdf, weights) = plane_volume();
        let mesh = extract_surface(&tsdf, &weights, false, 0.5);
        assert_eq!(mesh.vertex_count(), 9);
        assert_eq!(mesh.triangle_count(), 8);
        for v in &mesh.vertices {
            assert_relative_eq!(v.x, 0.52, epsilon = 1e-5);
        }
        for t in &mesh.triangles {
            let [a, b, c] = t.map(|i| mesh.vertices[i]);
            let normal = (b - a).cross(&(c - a));
            assert!(normal.x > 0.0, "triangle faces the negative side");
        }
    }

    #[test]
    fn test_min_weight_filters_cells() {
        let (tsdf, weights) = plane_volume();
        assert!(extract_surface(&tsdf, &weights, false, 2.0).is_empty());
        assert!(extract_surface(&tsdf, &weights, true, 2.0).is_empty());
        // Filling holes never closes the volume boundary with extra faces.
        assert_eq!(extract_surface(&tsdf, &weights, true, 0.5).triangle_count(), 8);
    }

    #[test]
    fn test_fill_holes_admits_zero_weight_corners() {
        let (tsdf, mut weights) = plane_volume();
        weights.set_value(VoxelCoord::new(5, 1, 1), 0.0);

        let holed = extract_surface(&tsdf, &weights, false, 0.0);
        assert!(holed.triangle_count() < 8);

        let filled = extract_surface(&tsdf, &weights, true, 0.0);
        assert_eq!(filled.triangle_count(), 8);
        for v in &filled.vertices {
            assert_relative_eq!(v.x, 0.52, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_volume_trait_extraction() {
        let (tsdf, weights) = plane_volume();
        let volume = FusionVolume::from_grids(tsdf, weights, 0.3, false);
        assert_eq!(volume.extract_triangle_mesh(false, 0.5).triangle_count(), 8);
    }

    // ==================== Manager Layer Tests ====================

    fn wall() -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for j in -10..=10 {
            for k in -10..=10 {
                points.push(Point3::new(1.0, f64::from(j) * 0.05, f64::from(k) * 0.05));
            }
        }
        points
    }

    #[test]
    fn test_insert_point_cloud_updates_both_managers() {
        let (mut distances, mut weights) = managers();
        let params = FusionParams::default();
        insert_point_cloud(&mut distances, &mut weights, 4, &Point3::origin(), &wall(), &params)
            .unwrap();

        assert_eq!(distances.ids(), vec![4]);
        assert_eq!(weights.ids(), vec![4]);
        let count = distances.active_voxel_count();
        assert!(count > 0);
        assert_eq!(count, weights.active_voxel_count_of(4));
        assert!(distances.world_limits().contains(&Point3::new(1.0, 0.0, 0.0)));

        // Cell-centered again: the voxel just in front of the wall reads positive.
        let d = distances.distance(&[Point3::new(0.95, 0.05, 0.05)], InterpMethod::Nearest);
        assert!(d[0] > 0.0 && d[0] < 0.1);
    }

    #[test]
    fn test_second_cloud_accumulates() {
        let (mut distances, mut weights) = managers();
        let params = FusionParams::default();
        let origin = Point3::origin();
        insert_point_cloud(&mut distances, &mut weights, 1, &origin, &wall(), &params).unwrap();
        insert_point_cloud(&mut distances, &mut weights, 1, &origin, &wall(), &params).unwrap();
        let max_weight = weights
            .grid(1)
            .unwrap()
            .iter_active()
            .map(|(_, w)| w)
            .fold(0.0f32, f32::max);
        assert!(max_weight >= 2.0);
        let cached = distances.active_voxel_count();
        distances.tally_active_voxel();
        assert_eq!(distances.active_voxel_count(), cached);
    }

    #[test]
    fn test_create_mesh_from_fused_wall() {
        let (mut distances, mut weights) = managers();
        let params = FusionParams::default().with_fill_holes(false);
        insert_point_cloud(&mut distances, &mut weights, 2, &Point3::origin(), &wall(), &params)
            .unwrap();

        let mesh = create_mesh(&distances, &weights, 2, &params).unwrap();
        assert!(!mesh.is_empty());
        for v in &mesh.vertices {
            assert!((v.x - 1.0).abs() < 0.15, "vertex {v} is off the wall");
        }
        assert!(create_mesh(&distances, &weights, 3, &params).unwrap().is_empty());
    }

    #[test]
    fn test_default_params_mesh_stays_on_observed_surface() {
        let (mut distances, mut weights) = managers();
        let params = FusionParams::default();
        assert!(params.fill_holes);
        let points: Vec<_> = wall().iter().map(|p| Point3::new(p.y, p.z, p.x)).collect();
        insert_point_cloud(&mut distances, &mut weights, 5, &Point3::origin(), &points, &params)
            .unwrap();

        let mesh = create_mesh(&distances, &weights, 5, &params).unwrap();
        assert!(!mesh.is_empty());
        for v in &mesh.vertices {
            assert!((v.z - 1.0).abs() < 0.15, "vertex {v} is off the observed plane");
        }
    }
}
