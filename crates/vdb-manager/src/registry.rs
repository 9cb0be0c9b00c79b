//! Opaque handles to managers and a flat, buffer-oriented API over them.
//!
//! Every call takes and returns plain numbers and column-blocked `f64`
//! buffers (see [`layout`](crate::layout)), so a foreign-language binding
//! can forward its arguments unchanged. Unknown grid IDs yield sentinels
//! (0, `false` or an empty buffer); unknown handles are errors.

use hashbrown::HashMap;
use tracing::debug;

use crate::config::ManagerConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::fusion::{FusionParams, create_mesh, insert_point_cloud};
use crate::layout::{
    id_from_f64, point_from_slice, points_from_columns, points_to_columns, to_f64,
    triangles_to_columns, vectors_to_columns,
};
use crate::manager::VdbManager;
use crate::pose::Pose;
use crate::query::InterpMethod;

/// Opaque identifier of a manager held by a [`ManagerRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ManagerHandle(u64);

impl ManagerHandle {
    /// Creates a handle from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ManagerHandle {
    fn from(raw: u64) -> Self {
        Self::new(raw)
    }
}

impl From<ManagerHandle> for u64 {
    fn from(handle: ManagerHandle) -> Self {
        handle.0
    }
}

/// Active voxels of one grid as column-blocked buffers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatVoxels {
    /// `3K` world-space centers.
    pub centers: Vec<f64>,
    /// `K` stored distances.
    pub values: Vec<f64>,
    /// `K` edge lengths.
    pub sizes: Vec<f64>,
}

/// A surface mesh as column-blocked buffers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatMesh {
    /// `3N` vertex coordinates.
    pub vertices: Vec<f64>,
    /// `3M` one-based vertex indices.
    pub faces: Vec<f64>,
}

/// Owns managers and hands out opaque handles to them.
///
/// # Example
///
/// ```
/// use vdb_manager::ManagerRegistry;
///
/// let mut registry = ManagerRegistry::new();
/// let handle = registry.initialize(10.0, 0.3, false, true).unwrap();
/// assert_eq!(registry.get_num_vdb(handle).unwrap(), 0.0);
/// assert!(registry.cleanup(handle));
/// assert!(registry.get_num_vdb(handle).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ManagerRegistry {
    managers: HashMap<ManagerHandle, VdbManager>,
    next_id: u64,
}

impl Default for ManagerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            managers: HashMap::new(),
            next_id: 1,
        }
    }

    /// Number of live managers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.managers.len()
    }

    /// True when no manager is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    /// Registers `manager` and returns its handle.
    pub fn insert(&mut self, manager: VdbManager) -> ManagerHandle {
        let handle = ManagerHandle::new(self.next_id);
        self.next_id += 1;
        self.managers.insert(handle, manager);
        debug!(handle = handle.as_u64(), "registered manager");
        handle
    }

    /// The manager behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle.
    pub fn get(&self, handle: ManagerHandle) -> RegistryResult<&VdbManager> {
        self.managers
            .get(&handle)
            .ok_or(RegistryError::UnknownHandle(handle.as_u64()))
    }

    /// Mutable access to the manager behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle.
    pub fn get_mut(&mut self, handle: ManagerHandle) -> RegistryResult<&mut VdbManager> {
        self.managers
            .get_mut(&handle)
            .ok_or(RegistryError::UnknownHandle(handle.as_u64()))
    }

    // ---- lifecycle ----

    /// Creates a manager.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Manager`] for an invalid configuration.
    pub fn initialize(
        &mut self,
        resolution: f64,
        truncation_distance: f64,
        fill_interior: bool,
        fast_sweep: bool,
    ) -> RegistryResult<ManagerHandle> {
        let config = ManagerConfig::new(resolution, truncation_distance, fill_interior, fast_sweep);
        Ok(self.insert(VdbManager::new(config)?))
    }

    /// Drops a manager. Returns whether the handle was live.
    pub fn cleanup(&mut self, handle: ManagerHandle) -> bool {
        let removed = self.managers.remove(&handle).is_some();
        debug!(handle = handle.as_u64(), removed, "released manager");
        removed
    }

    // ---- scalar properties ----

    /// Number of grids.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle.
    pub fn get_num_vdb(&self, handle: ManagerHandle) -> RegistryResult<f64> {
        Ok(to_f64(self.get(handle)?.grid_count()))
    }

    /// Truncation distance.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle.
    pub fn get_trunc_dist(&self, handle: ManagerHandle) -> RegistryResult<f64> {
        Ok(f64::from(self.get(handle)?.truncation_distance()))
    }

    /// Resolution in voxels per meter.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle.
    pub fn get_resolution(&self, handle: ManagerHandle) -> RegistryResult<f64> {
        Ok(f64::from(self.get(handle)?.resolution()))
    }

    /// Interior fill flag as 0 or 1.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle.
    pub fn get_fill_interior(&self, handle: ManagerHandle) -> RegistryResult<f64> {
        Ok(f64::from(u8::from(self.get(handle)?.fill_interior())))
    }

    /// Fast-sweep flag as 0 or 1.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle.
    pub fn get_signed_distance_mode(&self, handle: ManagerHandle) -> RegistryResult<f64> {
        Ok(f64::from(u8::from(self.get(handle)?.fast_sweep())))
    }

    /// World limits as `[xmin, xmax, ymin, ymax, zmin, zmax]`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle.
    pub fn get_active_bounding_box(&self, handle: ManagerHandle) -> RegistryResult<[f64; 6]> {
        Ok(self.get(handle)?.world_limits().as_limits())
    }

    /// Grid IDs in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle.
    #[allow(clippy::cast_precision_loss)]
    pub fn get_id(&self, handle: ManagerHandle) -> RegistryResult<Vec<f64>> {
        Ok(self.get(handle)?.ids().into_iter().map(|id| id as f64).collect())
    }

    /// Cached active voxel total.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle.
    pub fn get_num_active_voxel(&self, handle: ManagerHandle) -> RegistryResult<f64> {
        Ok(to_f64(self.get(handle)?.active_voxel_count()))
    }

    /// Active voxels in one grid; 0 for an unknown ID.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle.
    pub fn get_num_active_voxel_in_vdb(&self, handle: ManagerHandle, id: f64) -> RegistryResult<f64> {
        Ok(to_f64(self.get(handle)?.active_voxel_count_of(id_from_f64(id))))
    }

    // ---- mutation ----

    /// Discretizes and adds a mesh. Returns `false` if the ID was in use.
    ///
    /// `pose` holds 16 column-major values; `vertices` and `faces` are
    /// column-blocked with one-based faces.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle and
    /// [`RegistryError::Manager`] for malformed buffers.
    pub fn add_mesh(
        &mut self,
        handle: ManagerHandle,
        id: f64,
        pose: &[f64],
        vertices: &[f64],
        faces: &[f64],
    ) -> RegistryResult<bool> {
        let pose = Pose::from_column_major(pose)?;
        Ok(self.get_mut(handle)?.add_mesh(id_from_f64(id), &pose, vertices, faces)?)
    }

    /// Re-poses a grid and refreshes the limits. Returns `false` for an
    /// unknown ID.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle and
    /// [`RegistryError::Manager`] for a malformed or singular pose.
    pub fn update_pose(&mut self, handle: ManagerHandle, id: f64, pose: &[f64]) -> RegistryResult<bool> {
        let pose = Pose::from_column_major(pose)?;
        Ok(self.get_mut(handle)?.update_pose(id_from_f64(id), &pose)?)
    }

    /// Removes every listed grid that exists.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle.
    pub fn remove_ids(&mut self, handle: ManagerHandle, ids: &[f64]) -> RegistryResult<()> {
        self.get_mut(handle)?
            .remove_ids(ids.iter().copied().map(id_from_f64));
        Ok(())
    }

    // ---- grid contents ----

    /// Active voxels of one grid; empty buffers for an unknown ID.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle.
    pub fn get_active_voxel_from(&self, handle: ManagerHandle, id: f64) -> RegistryResult<FlatVoxels> {
        let voxels = self
            .get(handle)?
            .active_voxels_from(id_from_f64(id))
            .unwrap_or_default();
        Ok(FlatVoxels {
            centers: points_to_columns(&voxels.centers),
            values: voxels.values,
            sizes: voxels.sizes,
        })
    }

    /// The 16 column-major pose values of one grid; empty for an unknown ID.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle.
    pub fn get_pose_from(&self, handle: ManagerHandle, id: f64) -> RegistryResult<Vec<f64>> {
        Ok(self
            .get(handle)?
            .pose_from(id_from_f64(id))
            .map(|pose| pose.to_column_major().to_vec())
            .unwrap_or_default())
    }

    // ---- queries ----

    /// Minimum distance at each column-blocked point.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle and
    /// [`RegistryError::Manager`] for a ragged buffer or a bad selector.
    pub fn distance(&self, handle: ManagerHandle, points: &[f64], interp: f64) -> RegistryResult<Vec<f64>> {
        let manager = self.get(handle)?;
        let method = InterpMethod::try_from(interp)?;
        let points = points_from_columns(points)?;
        Ok(manager.distance(&points, method))
    }

    /// Column-blocked gradient at each column-blocked point.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle and
    /// [`RegistryError::Manager`] for a ragged buffer or a bad selector.
    pub fn gradient(&self, handle: ManagerHandle, points: &[f64], interp: f64) -> RegistryResult<Vec<f64>> {
        let manager = self.get(handle)?;
        let method = InterpMethod::try_from(interp)?;
        let points = points_from_columns(points)?;
        Ok(vectors_to_columns(&manager.gradient(&points, method)))
    }

    // ---- persistence ----

    /// Length of the serialized manager.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle and
    /// [`RegistryError::Manager`] if encoding fails.
    pub fn get_serialize_size(&self, handle: ManagerHandle) -> RegistryResult<f64> {
        Ok(to_f64(self.get(handle)?.serialize_size()?))
    }

    /// Serializes a manager.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle and
    /// [`RegistryError::Manager`] if encoding fails.
    pub fn serialize(&self, handle: ManagerHandle) -> RegistryResult<Vec<u8>> {
        Ok(self.get(handle)?.serialize()?)
    }

    /// Registers a manager rebuilt from `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Manager`] if the blob cannot be decoded.
    pub fn deserialize(&mut self, bytes: &[u8]) -> RegistryResult<ManagerHandle> {
        let manager = VdbManager::deserialize(bytes)?;
        Ok(self.insert(manager))
    }

    // ---- fusion ----

    /// Fuses a column-blocked cloud into layer `id` of a distance and
    /// weight manager pair.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle,
    /// [`RegistryError::SharedHandle`] if both handles are the same and
    /// [`RegistryError::Manager`] for malformed buffers.
    pub fn insert_point_cloud(
        &mut self,
        distances: ManagerHandle,
        weights: ManagerHandle,
        id: f64,
        space_carving: bool,
        origin: &[f64],
        points: &[f64],
    ) -> RegistryResult<()> {
        if distances == weights {
            return Err(RegistryError::SharedHandle(distances.as_u64()));
        }
        self.get(weights)?;
        let origin = point_from_slice(origin)?;
        let points = points_from_columns(points)?;
        let params = FusionParams::default().with_space_carving(space_carving);

        // The weight manager is taken out so both can be borrowed mutably.
        let mut weight = self
            .managers
            .remove(&weights)
            .ok_or(RegistryError::UnknownHandle(weights.as_u64()))?;
        let result = match self.managers.get_mut(&distances) {
            Some(dist) => insert_point_cloud(dist, &mut weight, id_from_f64(id), &origin, &points, &params)
                .map_err(RegistryError::from),
            None => Err(RegistryError::UnknownHandle(distances.as_u64())),
        };
        self.managers.insert(weights, weight);
        result
    }

    /// Extracts the surface of layer `id`; empty buffers for an unknown ID.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unknown handle and
    /// [`RegistryError::Manager`] for an invalid `min_weight`.
    pub fn create_mesh(
        &self,
        distances: ManagerHandle,
        weights: ManagerHandle,
        id: f64,
        fill_holes: bool,
        min_weight: f32,
    ) -> RegistryResult<FlatMesh> {
        let params = FusionParams::default()
            .with_fill_holes(fill_holes)
            .with_min_weight(min_weight);
        let mesh = create_mesh(self.get(distances)?, self.get(weights)?, id_from_f64(id), &params)?;
        Ok(FlatMesh {
            vertices: points_to_columns(&mesh.vertices),
            faces: triangles_to_columns(&mesh.triangles),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::manager::DEFAULT_WORLD_LIMITS;
    use crate::test_meshes::cube;

    const IDENTITY: [f64; 16] = [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ];

    fn registry_with_cube() -> (ManagerRegistry, ManagerHandle) {
        let mut registry = ManagerRegistry::new();
        let handle = registry.initialize(10.0, 0.3, false, true).unwrap();
        let (vertices, faces) = cube(1.0);
        assert!(registry.add_mesh(handle, 1.0, &IDENTITY, &vertices, &faces).unwrap());
        (registry, handle)
    }

    // ==================== Handle Tests ====================

    #[test]
    fn test_handles_are_unique() {
        let mut registry = ManagerRegistry::default();
        let a = registry.initialize(10.0, 0.3, false, false).unwrap();
        let b = registry.initialize(5.0, 0.2, true, true).unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert!(registry.cleanup(a));
        assert!(!registry.cleanup(a));
        let c = registry.initialize(10.0, 0.3, false, false).unwrap();
        assert_ne!(a, c);
        assert_eq!(u64::from(ManagerHandle::from(9)), 9);
    }

    #[test]
    fn test_unknown_handle_is_an_error() {
        let registry = ManagerRegistry::new();
        let err = registry.get_num_vdb(ManagerHandle::new(42)).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownHandle(42)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut registry = ManagerRegistry::new();
        assert!(registry.initialize(0.0, 0.3, false, false).is_err());
        assert!(registry.is_empty());
    }

    // ==================== Property Tests ====================

    #[test]
    fn test_scalar_properties() {
        let mut registry = ManagerRegistry::new();
        let h = registry.initialize(20.0, 0.25, true, false).unwrap();
        assert_eq!(registry.get_resolution(h).unwrap(), 20.0);
        assert_eq!(registry.get_trunc_dist(h).unwrap(), 0.25);
        assert_eq!(registry.get_fill_interior(h).unwrap(), 1.0);
        assert_eq!(registry.get_signed_distance_mode(h).unwrap(), 0.0);
        assert_eq!(
            registry.get_active_bounding_box(h).unwrap(),
            DEFAULT_WORLD_LIMITS.as_limits()
        );
    }

    #[test]
    fn test_mesh_lifecycle() {
        let (mut registry, h) = registry_with_cube();
        assert_eq!(registry.get_num_vdb(h).unwrap(), 1.0);
        assert_eq!(registry.get_id(h).unwrap(), vec![1.0]);
        let total = registry.get_num_active_voxel(h).unwrap();
        assert!(total > 0.0);
        assert_eq!(registry.get_num_active_voxel_in_vdb(h, 1.0).unwrap(), total);
        assert_eq!(registry.get_num_active_voxel_in_vdb(h, 2.0).unwrap(), 0.0);

        let limits = registry.get_active_bounding_box(h).unwrap();
        assert!(limits[0] < -0.5 && limits[1] > 0.5);

        registry.remove_ids(h, &[1.0, 5.0]).unwrap();
        assert_eq!(registry.get_num_vdb(h).unwrap(), 0.0);
        assert_eq!(
            registry.get_active_bounding_box(h).unwrap(),
            DEFAULT_WORLD_LIMITS.as_limits()
        );
    }

    #[test]
    fn test_pose_round_trip_and_sentinels() {
        let (mut registry, h) = registry_with_cube();
        let mut pose = IDENTITY;
        pose[12] = 2.0;
        assert!(registry.update_pose(h, 1.0, &pose).unwrap());
        assert!(!registry.update_pose(h, 3.0, &pose).unwrap());
        let back = registry.get_pose_from(h, 1.0).unwrap();
        for (a, b) in back.iter().zip(pose) {
            assert!((a - b).abs() < 1e-9);
        }
        assert!(registry.get_pose_from(h, 3.0).unwrap().is_empty());
        assert!(registry.update_pose(h, 1.0, &pose[..4]).is_err());

        let limits = registry.get_active_bounding_box(h).unwrap();
        assert!(limits[0] > 1.0);
    }

    #[test]
    fn test_active_voxel_buffers() {
        let (registry, h) = registry_with_cube();
        let voxels = registry.get_active_voxel_from(h, 1.0).unwrap();
        let k = voxels.values.len();
        assert!(k > 0);
        assert_eq!(voxels.centers.len(), 3 * k);
        assert_eq!(voxels.sizes.len(), k);
        let empty = registry.get_active_voxel_from(h, 9.0).unwrap();
        assert_eq!(empty, FlatVoxels::default());
    }

    // ==================== Query Tests ====================

    #[test]
    fn test_distance_and_gradient_buffers() {
        let (registry, h) = registry_with_cube();
        // Two points: (0.55, 0, 0) and (-0.55, 0, 0).
        let points = [0.55, -0.55, 0.0, 0.0, 0.0, 0.0];
        let d = registry.distance(h, &points, 1.0).unwrap();
        assert_eq!(d.len(), 2);
        assert!(d.iter().all(|v| (v - 0.05).abs() < 0.02));

        let g = registry.gradient(h, &points, 2.0).unwrap();
        assert_eq!(g.len(), 6);
        assert!(g[0] > 0.5 && g[1] < -0.5);

        assert!(registry.distance(h, &points, 5.0).is_err());
        assert!(registry.distance(h, &points[..5], 0.0).is_err());
    }

    // ==================== Persistence Tests ====================

    #[test]
    fn test_serialize_to_new_handle() {
        let (mut registry, h) = registry_with_cube();
        let bytes = registry.serialize(h).unwrap();
        assert_eq!(registry.get_serialize_size(h).unwrap(), to_f64(bytes.len()));
        let copy = registry.deserialize(&bytes).unwrap();
        assert_ne!(copy, h);
        assert_eq!(registry.get_id(copy).unwrap(), vec![1.0]);
        assert_eq!(
            registry.get_num_active_voxel(copy).unwrap(),
            registry.get_num_active_voxel(h).unwrap()
        );
    }

    // ==================== Fusion Tests ====================

    #[test]
    fn test_point_cloud_round_trip() {
        let mut registry = ManagerRegistry::new();
        let dist = registry.initialize(10.0, 0.3, false, false).unwrap();
        let weight = registry.initialize(10.0, 0.3, false, false).unwrap();

        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for j in -8..=8 {
            for k in -8..=8 {
                xs.push(f64::from(j) * 0.05);
                ys.push(f64::from(k) * 0.05);
            }
        }
        let n = xs.len();
        let mut cloud = xs;
        cloud.extend(ys);
        cloud.extend(std::iter::repeat_n(1.0, n));

        registry
            .insert_point_cloud(dist, weight, 3.0, false, &[0.0, 0.0, 0.0], &cloud)
            .unwrap();
        assert_eq!(registry.get_id(dist).unwrap(), vec![3.0]);
        assert_eq!(registry.get_id(weight).unwrap(), vec![3.0]);

        let mesh = registry.create_mesh(dist, weight, 3.0, false, 0.5).unwrap();
        assert!(!mesh.faces.is_empty());
        assert_eq!(mesh.faces.len() % 3, 0);
        let vertex_count = mesh.vertices.len() / 3;
        assert!(mesh.faces.iter().all(|&f| f >= 1.0 && f <= to_f64(vertex_count)));

        let err = registry
            .insert_point_cloud(dist, dist, 3.0, false, &[0.0, 0.0, 0.0], &cloud)
            .unwrap_err();
        assert!(matches!(err, RegistryError::SharedHandle(_)));
        assert!(registry.create_mesh(dist, weight, 8.0, false, 0.5).unwrap().faces.is_empty());
    }
}
