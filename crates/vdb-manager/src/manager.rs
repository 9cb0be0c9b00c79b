//! The multi-grid distance field manager.

use std::collections::BTreeMap;

use nalgebra::Point3;
use tracing::{debug, warn};
use vdb_grid::{Aabb, FloatGrid, GridBounds, Transform};

use crate::config::ManagerConfig;
use crate::discretize::discretize_mesh;
use crate::error::ManagerResult;
use crate::mesh_adapter::MeshAdapter;
use crate::pose::{Pose, apply_pose_to_grid, create_local_transform, strip_local};

/// World limits reported while the manager holds no grids.
pub const DEFAULT_WORLD_LIMITS: Aabb = Aabb {
    min: Point3::new(0.0, 0.0, 0.0),
    max: Point3::new(0.0, 0.0, 0.0),
};

/// Active voxels of one grid, in coordinate order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveVoxels {
    /// World-space voxel centers.
    pub centers: Vec<Point3<f64>>,
    /// Stored distances.
    pub values: Vec<f64>,
    /// Voxel edge lengths in meters.
    pub sizes: Vec<f64>,
}

impl ActiveVoxels {
    /// Number of voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when there are no voxels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A set of posed truncated signed distance grids keyed by integer ID.
///
/// The manager caches the total active voxel count and the world box around
/// every grid's active voxels. Both caches are refreshed by the mutating
/// operations, except [`transform_grid`](Self::transform_grid), after which
/// the caller decides when to call [`recompute_limits`](Self::recompute_limits).
///
/// Grids are visited in ascending ID order by every query.
///
/// # Example
///
/// ```
/// use vdb_manager::{ManagerConfig, Pose, VdbManager};
///
/// let mut manager = VdbManager::new(ManagerConfig::new(10.0, 0.3, false, true)).unwrap();
/// // A single triangle: vertices are [x..., y..., z...], faces one-based.
/// let vertices = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
/// let faces = [1.0, 2.0, 3.0];
/// assert!(manager.add_mesh(4, &Pose::identity(), &vertices, &faces).unwrap());
/// assert_eq!(manager.ids(), vec![4]);
/// assert!(manager.active_voxel_count() > 0);
/// ```
#[derive(Debug, Clone)]
pub struct VdbManager {
    config: ManagerConfig,
    local: Transform,
    grids: BTreeMap<u64, FloatGrid>,
    active_voxel_count: usize,
    world_limits: Option<Aabb>,
}

impl VdbManager {
    /// Creates an empty manager.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::InvalidConfig`](crate::ManagerError::InvalidConfig)
    /// if the resolution or truncation distance is not positive and finite.
    pub fn new(config: ManagerConfig) -> ManagerResult<Self> {
        config.validate()?;
        let local = create_local_transform(config.resolution, true)?;
        debug!(?config, "created manager");
        Ok(Self {
            config,
            local,
            grids: BTreeMap::new(),
            active_voxel_count: 0,
            world_limits: None,
        })
    }

    /// The construction parameters.
    #[must_use]
    pub const fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Voxels per meter.
    #[must_use]
    pub const fn resolution(&self) -> f32 {
        self.config.resolution
    }

    /// Truncation half-width in meters.
    #[must_use]
    pub const fn truncation_distance(&self) -> f32 {
        self.config.truncation_distance
    }

    /// Whether mesh interiors are filled.
    #[must_use]
    pub const fn fill_interior(&self) -> bool {
        self.config.fill_interior
    }

    /// Whether discretization skips the polygon correction.
    #[must_use]
    pub const fn fast_sweep(&self) -> bool {
        self.config.fast_sweep
    }

    /// Number of grids.
    #[must_use]
    pub fn grid_count(&self) -> usize {
        self.grids.len()
    }

    /// Cached total of active voxels across all grids.
    #[must_use]
    pub const fn active_voxel_count(&self) -> usize {
        self.active_voxel_count
    }

    /// Active voxels in grid `id`, or 0 if there is no such grid.
    #[must_use]
    pub fn active_voxel_count_of(&self, id: u64) -> usize {
        self.grids.get(&id).map_or(0, FloatGrid::active_voxel_count)
    }

    /// Cached world box around all active voxels, or [`DEFAULT_WORLD_LIMITS`]
    /// when no grid has any.
    #[must_use]
    pub fn world_limits(&self) -> Aabb {
        self.world_limits.unwrap_or(DEFAULT_WORLD_LIMITS)
    }

    /// Grid IDs in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<u64> {
        self.grids.keys().copied().collect()
    }

    /// Whether a grid is stored under `id`.
    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.grids.contains_key(&id)
    }

    /// The grid stored under `id`.
    #[must_use]
    pub fn grid(&self, id: u64) -> Option<&FloatGrid> {
        self.grids.get(&id)
    }

    /// Every grid in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &FloatGrid)> + '_ {
        self.grids.iter().map(|(id, grid)| (*id, grid))
    }

    /// Converts a mesh into a distance grid using this manager's settings.
    ///
    /// # Errors
    ///
    /// Propagates discretization failures.
    pub fn discretize_mesh(&self, mesh: &MeshAdapter<'_>) -> ManagerResult<FloatGrid> {
        discretize_mesh(mesh, &self.config)
    }

    /// Stores `grid` under `id`, replacing any previous grid.
    ///
    /// Returns `true` if `id` was not in use. On replacement the previous
    /// grid's voxels are subtracted from the cached total before the new
    /// grid's are added, so the cache stays exact. The world limits only
    /// grow; call [`recompute_limits`](Self::recompute_limits) to shrink
    /// them after a replacement.
    pub fn add_elem(&mut self, id: u64, grid: FloatGrid) -> bool {
        let added = grid.active_voxel_count();
        let bounds = grid.world_active_bounds();

        let previous = self.grids.insert(id, grid);
        let is_new = previous.is_none();
        if let Some(old) = previous {
            warn!(id, "replacing existing grid");
            self.active_voxel_count = self.active_voxel_count.saturating_sub(old.active_voxel_count());
        }
        self.active_voxel_count += added;

        if let Some(b) = bounds {
            match self.world_limits.as_mut() {
                Some(limits) => limits.expand_to_include_box(&b),
                None => self.world_limits = Some(b),
            }
        }

        debug!(id, is_new, active_voxels = added, "added grid");
        is_new
    }

    /// Stores `grid` without touching the caches.
    pub(crate) fn insert_grid(&mut self, id: u64, grid: FloatGrid) {
        if self.grids.insert(id, grid).is_some() {
            warn!(id, "duplicate grid ID in stream; keeping the last");
        }
    }

    /// Discretizes a mesh, poses it and stores it under `id`.
    ///
    /// An ID already in use is left untouched and `Ok(false)` is returned
    /// without reading the buffers. See [`MeshAdapter::new`] for the layout
    /// of `vertices` and `faces`.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::InvalidBuffer`](crate::ManagerError::InvalidBuffer)
    /// or [`ManagerError::FaceIndexOutOfRange`](crate::ManagerError::FaceIndexOutOfRange)
    /// for malformed buffers and [`ManagerError::Grid`](crate::ManagerError::Grid)
    /// for a singular pose.
    pub fn add_mesh(
        &mut self,
        id: u64,
        pose: &Pose,
        vertices: &[f64],
        faces: &[f64],
    ) -> ManagerResult<bool> {
        if self.contains(id) {
            debug!(id, "mesh ID already present; skipping");
            return Ok(false);
        }
        let mesh = MeshAdapter::new(self.local.clone(), vertices, faces)?;
        let mut grid = self.discretize_mesh(&mesh)?;
        apply_pose_to_grid(&mut grid, self.config.resolution, pose, true)?;
        Ok(self.add_elem(id, grid))
    }

    /// Removes every listed grid that exists.
    ///
    /// The world limits are rebuilt when anything was removed.
    pub fn remove_ids<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = u64>,
    {
        let before = self.grids.len();
        for id in ids {
            if let Some(grid) = self.grids.remove(&id) {
                self.active_voxel_count =
                    self.active_voxel_count.saturating_sub(grid.active_voxel_count());
            }
        }
        let removed = before - self.grids.len();
        if removed > 0 {
            self.recompute_limits();
        }
        debug!(removed, remaining = self.grids.len(), "removed grids");
    }

    /// Re-poses grid `id` with a cell-centered local transform.
    ///
    /// Returns `Ok(false)` if there is no such grid. The world limits are not
    /// refreshed; see [`update_pose`](Self::update_pose).
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Grid`](crate::ManagerError::Grid) if the pose is singular.
    pub fn transform_grid(&mut self, id: u64, pose: &Pose) -> ManagerResult<bool> {
        let resolution = self.config.resolution;
        let Some(grid) = self.grids.get_mut(&id) else {
            return Ok(false);
        };
        apply_pose_to_grid(grid, resolution, pose, true)?;
        debug!(id, "transformed grid");
        Ok(true)
    }

    /// [`transform_grid`](Self::transform_grid) followed by
    /// [`recompute_limits`](Self::recompute_limits) when the grid exists.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Grid`](crate::ManagerError::Grid) if the pose is singular.
    pub fn update_pose(&mut self, id: u64, pose: &Pose) -> ManagerResult<bool> {
        let found = self.transform_grid(id, pose)?;
        if found {
            self.recompute_limits();
        }
        Ok(found)
    }

    /// Rebuilds the world limits from every grid's active voxels.
    pub fn recompute_limits(&mut self) {
        self.world_limits = self
            .grids
            .values()
            .filter_map(FloatGrid::world_active_bounds)
            .reduce(|mut acc, b| {
                acc.expand_to_include_box(&b);
                acc
            });
    }

    /// Rebuilds the cached active voxel total.
    pub fn tally_active_voxel(&mut self) {
        self.active_voxel_count = self.grids.values().map(FloatGrid::active_voxel_count).sum();
    }

    /// Active voxel centers, values and edge lengths of grid `id`.
    #[must_use]
    pub fn active_voxels_from(&self, id: u64) -> Option<ActiveVoxels> {
        let grid = self.grids.get(&id)?;
        let resolution = f64::from(self.config.resolution);
        let entries = grid.sorted_active();
        let mut out = ActiveVoxels {
            centers: Vec::with_capacity(entries.len()),
            values: Vec::with_capacity(entries.len()),
            sizes: Vec::with_capacity(entries.len()),
        };
        for (coord, value) in entries {
            out.centers.push(grid.voxel_center(coord));
            out.values.push(f64::from(value));
            let extent = GridBounds::from_point(coord).max_extent();
            out.sizes.push(f64::from(extent) / resolution);
        }
        Some(out)
    }

    /// The pose of grid `id`.
    #[must_use]
    pub fn pose_from(&self, id: u64) -> Option<Pose> {
        self.grids.get(&id).map(|grid| strip_local(grid, &self.local))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_meshes::cube;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix4, Vector3};
    use vdb_grid::VoxelCoord;

    fn manager() -> VdbManager {
        VdbManager::new(ManagerConfig::new(10.0, 0.3, false, true)).unwrap()
    }

    fn translation(x: f64, y: f64, z: f64) -> Pose {
        Pose(Matrix4::new_translation(&Vector3::new(x, y, z)))
    }

    fn small_grid(manager: &VdbManager, voxels: &[(i32, i32, i32)]) -> FloatGrid {
        let mut grid = FloatGrid::with_transform(0.3, manager.local.clone());
        for &(x, y, z) in voxels {
            grid.set_value(VoxelCoord::new(x, y, z), 0.1);
        }
        grid
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_new_manager_is_empty() {
        let m = manager();
        assert_eq!(m.grid_count(), 0);
        assert_eq!(m.active_voxel_count(), 0);
        assert_eq!(m.world_limits(), DEFAULT_WORLD_LIMITS);
        assert!(m.ids().is_empty());
        assert_eq!(m.resolution(), 10.0);
        assert!(m.fast_sweep());
        assert!(!m.fill_interior());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let bad = ManagerConfig::default().with_resolution(-1.0);
        assert!(VdbManager::new(bad).is_err());
    }

    // ==================== Add / Remove Tests ====================

    #[test]
    fn test_add_elem_reports_new_ids() {
        let mut m = manager();
        let g = small_grid(&m, &[(0, 0, 0), (1, 0, 0)]);
        assert!(m.add_elem(3, g.clone()));
        assert!(!m.add_elem(3, g));
        assert_eq!(m.grid_count(), 1);
    }

    #[test]
    fn test_add_elem_overwrite_keeps_count_exact() {
        let mut m = manager();
        m.add_elem(1, small_grid(&m, &[(0, 0, 0), (1, 0, 0), (2, 0, 0)]));
        m.add_elem(1, small_grid(&m, &[(0, 0, 0)]));
        assert_eq!(m.active_voxel_count(), 1);
        let cached = m.active_voxel_count();
        m.tally_active_voxel();
        assert_eq!(m.active_voxel_count(), cached);
    }

    #[test]
    fn test_limits_grow_with_each_grid() {
        let mut m = manager();
        m.add_elem(1, small_grid(&m, &[(0, 0, 0)]));
        // A single voxel gives a degenerate box at its center.
        assert_relative_eq!(m.world_limits().min, Point3::new(0.05, 0.05, 0.05));
        m.add_elem(2, small_grid(&m, &[(9, 4, -3)]));
        let limits = m.world_limits().as_limits();
        assert_relative_eq!(limits[0], 0.05, epsilon = 1e-12);
        assert_relative_eq!(limits[1], 0.95, epsilon = 1e-12);
        assert_relative_eq!(limits[4], -0.25, epsilon = 1e-12);
        assert_relative_eq!(limits[5], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_remove_restores_default_limits() {
        let mut m = manager();
        m.add_elem(1, small_grid(&m, &[(0, 0, 0), (5, 5, 5)]));
        m.add_elem(2, small_grid(&m, &[(-5, 0, 0)]));
        m.remove_ids([1, 99]);
        assert_eq!(m.ids(), vec![2]);
        assert_eq!(m.active_voxel_count(), 1);
        assert_relative_eq!(m.world_limits().max.x, -0.45, epsilon = 1e-12);
        m.remove_ids(vec![2]);
        assert_eq!(m.grid_count(), 0);
        assert_eq!(m.active_voxel_count(), 0);
        assert_eq!(m.world_limits(), DEFAULT_WORLD_LIMITS);
    }

    #[test]
    fn test_add_mesh_skips_existing_id() {
        let mut m = manager();
        let (vertices, faces) = cube(1.0);
        assert!(m.add_mesh(1, &Pose::identity(), &vertices, &faces).unwrap());
        let count = m.active_voxel_count();
        // Bad buffers are not even inspected for an existing ID.
        assert!(!m.add_mesh(1, &Pose::identity(), &vertices[..5], &faces).unwrap());
        assert_eq!(m.active_voxel_count(), count);
        assert_eq!(m.active_voxel_count_of(1), count);
        assert_eq!(m.active_voxel_count_of(2), 0);
    }

    #[test]
    fn test_add_mesh_rejects_bad_faces() {
        let mut m = manager();
        let (vertices, _) = cube(1.0);
        assert!(m.add_mesh(1, &Pose::identity(), &vertices, &[1.0, 2.0, 42.0]).is_err());
        assert_eq!(m.grid_count(), 0);
    }

    #[test]
    fn test_add_mesh_applies_pose() {
        let mut m = manager();
        let (vertices, faces) = cube(1.0);
        m.add_mesh(1, &translation(5.0, 0.0, 0.0), &vertices, &faces).unwrap();
        let center = m.world_limits().center();
        assert_relative_eq!(center, Point3::new(5.0, 0.0, 0.0), epsilon = 0.06);
    }

    // ==================== Pose Tests ====================

    #[test]
    fn test_transform_grid_and_pose_from() {
        let mut m = manager();
        m.add_elem(7, small_grid(&m, &[(0, 0, 0)]));
        let pose = translation(1.0, 2.0, 3.0);
        assert!(m.transform_grid(7, &pose).unwrap());
        assert!(!m.transform_grid(8, &pose).unwrap());
        assert_relative_eq!(m.pose_from(7).unwrap().0, pose.0, epsilon = 1e-12);
        assert!(m.pose_from(8).is_none());
        // Limits are stale until recomputed.
        assert_relative_eq!(m.world_limits().min.x, 0.05, epsilon = 1e-12);
        m.recompute_limits();
        assert_relative_eq!(m.world_limits().min.x, 1.05, epsilon = 1e-12);
    }

    #[test]
    fn test_update_pose_refreshes_limits() {
        let mut m = manager();
        m.add_elem(7, small_grid(&m, &[(0, 0, 0)]));
        assert!(m.update_pose(7, &translation(0.0, -1.0, 0.0)).unwrap());
        assert_relative_eq!(m.world_limits().min.y, -0.95, epsilon = 1e-12);
    }

    #[test]
    fn test_pose_of_added_grid_is_identity() {
        let mut m = manager();
        m.add_elem(1, small_grid(&m, &[(0, 0, 0)]));
        assert_relative_eq!(m.pose_from(1).unwrap().0, Matrix4::identity(), epsilon = 1e-12);
    }

    // ==================== Active Voxel Tests ====================

    #[test]
    fn test_active_voxels_from() {
        let mut m = manager();
        m.add_elem(1, small_grid(&m, &[(1, 0, 0), (0, 0, 0)]));
        let voxels = m.active_voxels_from(1).unwrap();
        assert_eq!(voxels.len(), 2);
        assert_relative_eq!(voxels.centers[0], Point3::new(0.05, 0.05, 0.05), epsilon = 1e-12);
        assert_relative_eq!(voxels.centers[1], Point3::new(0.15, 0.05, 0.05), epsilon = 1e-12);
        assert_relative_eq!(voxels.values[0], 0.1, epsilon = 1e-6);
        assert_relative_eq!(voxels.sizes[1], 0.1, epsilon = 1e-6);
        assert!(m.active_voxels_from(2).is_none());
    }
}
