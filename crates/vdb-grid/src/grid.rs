//! Sparse voxel grid with a background value and an affine transform.

use std::fmt::Debug;

use hashbrown::HashMap;
use nalgebra::Point3;

use crate::bounds::{Aabb, GridBounds};
use crate::metadata::{MetaMap, MetaValue};
use crate::transform::Transform;
use crate::voxel::VoxelCoord;

/// Scalar types that can be stored in a [`SparseGrid`] and written to a stream.
pub trait GridValue: Copy + PartialEq + Debug + Send + Sync + 'static {
    /// Registered type name used by the stream codec.
    const TYPE_NAME: &'static str;

    /// Widens the value for interpolation arithmetic.
    fn to_f64(self) -> f64;

    /// Little-endian encoding.
    fn to_le_bytes(self) -> [u8; 4];

    /// Little-endian decoding.
    fn from_le_bytes(bytes: [u8; 4]) -> Self;
}

impl GridValue for f32 {
    const TYPE_NAME: &'static str = "float";

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn to_le_bytes(self) -> [u8; 4] {
        Self::to_le_bytes(self)
    }

    fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self::from_le_bytes(bytes)
    }
}

impl GridValue for i32 {
    const TYPE_NAME: &'static str = "int32";

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn to_le_bytes(self) -> [u8; 4] {
        Self::to_le_bytes(self)
    }

    fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self::from_le_bytes(bytes)
    }
}

/// A sparse 3D grid.
///
/// Each coordinate resolves to a value in this order:
/// 1. an active voxel, if one is stored;
/// 2. an inactive voxel value, if one differs from the background;
/// 3. the value of the inactive tile covering the coordinate;
/// 4. the background value.
///
/// Only active voxels count toward [`active_voxel_count`](Self::active_voxel_count)
/// and bounding boxes. Inactive values let a level set report "inside" far
/// from its surface without storing every interior voxel.
///
/// # Example
///
/// ```
/// use vdb_grid::{FloatGrid, VoxelCoord};
///
/// let mut grid = FloatGrid::new(3.0);
/// grid.set_value(VoxelCoord::new(1, 2, 3), -0.5);
/// grid.set_tile(VoxelCoord::new(16, 0, 0), -3.0);
///
/// assert_eq!(grid.value(VoxelCoord::new(1, 2, 3)), -0.5);
/// assert_eq!(grid.value(VoxelCoord::new(20, 5, 5)), -3.0);
/// assert_eq!(grid.value(VoxelCoord::new(100, 0, 0)), 3.0);
/// assert_eq!(grid.active_voxel_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SparseGrid<T> {
    name: String,
    background: T,
    transform: Transform,
    active: HashMap<VoxelCoord, T>,
    inactive: HashMap<VoxelCoord, T>,
    tiles: HashMap<VoxelCoord, T>,
    metadata: MetaMap,
}

/// Grid of single precision distances.
pub type FloatGrid = SparseGrid<f32>;

/// Grid of 32-bit integers, used for polygon indices.
pub type Int32Grid = SparseGrid<i32>;

impl<T: GridValue> SparseGrid<T> {
    /// Creates an empty grid with an identity transform.
    #[must_use]
    pub fn new(background: T) -> Self {
        Self::with_transform(background, Transform::identity())
    }

    /// Creates an empty grid with the given transform.
    #[must_use]
    pub fn with_transform(background: T, transform: Transform) -> Self {
        Self {
            name: String::new(),
            background,
            transform,
            active: HashMap::new(),
            inactive: HashMap::new(),
            tiles: HashMap::new(),
            metadata: MetaMap::new(),
        }
    }

    /// Grid name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the grid name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Value reported for coordinates with nothing stored.
    #[must_use]
    pub const fn background(&self) -> T {
        self.background
    }

    /// The index-to-world transform.
    #[must_use]
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Replaces the transform; voxel contents are left untouched.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Resolves the value at `coord`.
    #[must_use]
    pub fn value(&self, coord: VoxelCoord) -> T {
        if let Some(v) = self.active.get(&coord) {
            return *v;
        }
        if let Some(v) = self.inactive.get(&coord) {
            return *v;
        }
        self.tiles
            .get(&coord.tile_origin())
            .copied()
            .unwrap_or(self.background)
    }

    /// Value of an active voxel, if `coord` is active.
    #[must_use]
    pub fn active_value(&self, coord: VoxelCoord) -> Option<T> {
        self.active.get(&coord).copied()
    }

    /// Whether `coord` holds an active voxel.
    #[must_use]
    pub fn is_active(&self, coord: VoxelCoord) -> bool {
        self.active.contains_key(&coord)
    }

    /// Stores an active value.
    pub fn set_value(&mut self, coord: VoxelCoord, value: T) {
        self.inactive.remove(&coord);
        self.active.insert(coord, value);
    }

    /// Stores an inactive value; a value equal to the background clears the entry.
    pub fn set_inactive_value(&mut self, coord: VoxelCoord, value: T) {
        self.active.remove(&coord);
        if value == self.background {
            self.inactive.remove(&coord);
        } else {
            self.inactive.insert(coord, value);
        }
    }

    /// Fills the tile containing `coord` with an inactive value.
    pub fn set_tile(&mut self, coord: VoxelCoord, value: T) {
        let origin = coord.tile_origin();
        if value == self.background {
            self.tiles.remove(&origin);
        } else {
            self.tiles.insert(origin, value);
        }
    }

    /// Number of active voxels.
    #[must_use]
    pub fn active_voxel_count(&self) -> usize {
        self.active.len()
    }

    /// Iterates active voxels in unspecified order.
    pub fn iter_active(&self) -> impl Iterator<Item = (VoxelCoord, T)> + '_ {
        self.active.iter().map(|(c, v)| (*c, *v))
    }

    /// Mutable access to every active value.
    pub fn active_values_mut(&mut self) -> impl Iterator<Item = (VoxelCoord, &mut T)> + '_ {
        self.active.iter_mut().map(|(c, v)| (*c, v))
    }

    /// Active voxels sorted by coordinate.
    #[must_use]
    pub fn sorted_active(&self) -> Vec<(VoxelCoord, T)> {
        sorted_entries(&self.active)
    }

    /// Stored inactive voxel values sorted by coordinate.
    #[must_use]
    pub fn sorted_inactive(&self) -> Vec<(VoxelCoord, T)> {
        sorted_entries(&self.inactive)
    }

    /// Inactive tiles sorted by origin.
    #[must_use]
    pub fn sorted_tiles(&self) -> Vec<(VoxelCoord, T)> {
        sorted_entries(&self.tiles)
    }

    /// Index-space bounds of the active voxels, or `None` when there are none.
    #[must_use]
    pub fn active_bounds(&self) -> Option<GridBounds> {
        let mut coords = self.active.keys();
        let mut bounds = GridBounds::from_point(*coords.next()?);
        for c in coords {
            bounds.expand_to_include(*c);
        }
        Some(bounds)
    }

    /// World-space box around the active voxel centers.
    #[must_use]
    pub fn world_active_bounds(&self) -> Option<Aabb> {
        self.active_bounds()
            .map(|b| self.transform.index_bounds_to_world(&b))
    }

    /// World-space position of a voxel center.
    #[must_use]
    pub fn voxel_center(&self, coord: VoxelCoord) -> Point3<f64> {
        self.transform.coord_to_world(coord)
    }

    /// All metadata.
    #[must_use]
    pub const fn metadata(&self) -> &MetaMap {
        &self.metadata
    }

    /// Looks up one metadata entry.
    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&MetaValue> {
        self.metadata.get(key)
    }

    /// Inserts or replaces a metadata entry.
    pub fn insert_meta(&mut self, key: impl Into<String>, value: MetaValue) {
        self.metadata.insert(key.into(), value);
    }
}

fn sorted_entries<T: Copy>(map: &HashMap<VoxelCoord, T>) -> Vec<(VoxelCoord, T)> {
    let mut entries: Vec<_> = map.iter().map(|(c, v)| (*c, *v)).collect();
    entries.sort_unstable_by_key(|(c, _)| *c);
    entries
}
