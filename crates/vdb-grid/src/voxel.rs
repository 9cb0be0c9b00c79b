//! Integer voxel coordinates in index space.

use std::ops::{Add, Sub};

use nalgebra::{Point3, Vector3};

/// Edge length of an inactive tile, in voxels.
///
/// Tiles are aligned to multiples of this value on every axis.
pub const TILE_DIM: i32 = 8;

/// A discrete 3D coordinate in index space.
///
/// Ordering is lexicographic on `(x, y, z)`, which is the order used when a
/// grid's voxels are written to a stream.
///
/// # Example
///
/// ```
/// use vdb_grid::VoxelCoord;
///
/// let coord = VoxelCoord::new(1, -2, 3);
/// assert_eq!(coord.as_array(), [1, -2, 3]);
/// assert!(VoxelCoord::new(0, 9, 9) < VoxelCoord::new(1, 0, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoxelCoord {
    /// X index.
    pub x: i32,
    /// Y index.
    pub y: i32,
    /// Z index.
    pub z: i32,
}

// Index-space positions outside the i32 range saturate; grids that large are not addressable.
#[allow(clippy::cast_possible_truncation)]
fn saturating_index(value: f64) -> i32 {
    value as i32
}

impl VoxelCoord {
    /// Creates a new voxel coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The coordinate `(0, 0, 0)`.
    #[must_use]
    pub const fn origin() -> Self {
        Self::new(0, 0, 0)
    }

    /// Returns the coordinate as an array.
    #[must_use]
    pub const fn as_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// Returns the component along `axis` (0 = x, 1 = y, anything else = z).
    #[must_use]
    pub const fn axis(self, axis: usize) -> i32 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Converts to a floating-point index-space point.
    #[must_use]
    pub fn to_point(self) -> Point3<f64> {
        Point3::new(f64::from(self.x), f64::from(self.y), f64::from(self.z))
    }

    /// Converts to a floating-point vector.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(f64::from(self.x), f64::from(self.y), f64::from(self.z))
    }

    /// Returns the voxel containing a continuous index-space position.
    ///
    /// # Example
    ///
    /// ```
    /// use vdb_grid::VoxelCoord;
    /// use nalgebra::Point3;
    ///
    /// let c = VoxelCoord::floor(&Point3::new(1.7, -0.2, 3.0));
    /// assert_eq!(c, VoxelCoord::new(1, -1, 3));
    /// ```
    #[must_use]
    pub fn floor(p: &Point3<f64>) -> Self {
        Self::new(
            saturating_index(p.x.floor()),
            saturating_index(p.y.floor()),
            saturating_index(p.z.floor()),
        )
    }

    /// Returns the voxel whose integer coordinate is nearest to `p`.
    ///
    /// Halfway cases round toward positive infinity.
    ///
    /// # Example
    ///
    /// ```
    /// use vdb_grid::VoxelCoord;
    /// use nalgebra::Point3;
    ///
    /// let c = VoxelCoord::round(&Point3::new(1.5, -0.5, 2.49));
    /// assert_eq!(c, VoxelCoord::new(2, 0, 2));
    /// ```
    #[must_use]
    pub fn round(p: &Point3<f64>) -> Self {
        Self::new(
            saturating_index((p.x + 0.5).floor()),
            saturating_index((p.y + 0.5).floor()),
            saturating_index((p.z + 0.5).floor()),
        )
    }

    /// Returns this coordinate shifted by the given deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.z.saturating_add(dz),
        )
    }

    /// Returns the 6 face-adjacent neighbors.
    #[must_use]
    pub const fn face_neighbors(self) -> [Self; 6] {
        [
            self.offset(-1, 0, 0),
            self.offset(1, 0, 0),
            self.offset(0, -1, 0),
            self.offset(0, 1, 0),
            self.offset(0, 0, -1),
            self.offset(0, 0, 1),
        ]
    }

    /// Returns the origin of the tile containing this voxel.
    ///
    /// # Example
    ///
    /// ```
    /// use vdb_grid::VoxelCoord;
    ///
    /// assert_eq!(VoxelCoord::new(9, -1, 7).tile_origin(), VoxelCoord::new(8, -8, 0));
    /// ```
    #[must_use]
    pub const fn tile_origin(self) -> Self {
        Self::new(
            self.x.div_euclid(TILE_DIM) * TILE_DIM,
            self.y.div_euclid(TILE_DIM) * TILE_DIM,
            self.z.div_euclid(TILE_DIM) * TILE_DIM,
        )
    }
}

impl From<[i32; 3]> for VoxelCoord {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<VoxelCoord> for [i32; 3] {
    fn from(coord: VoxelCoord) -> Self {
        coord.as_array()
    }
}

impl Add for VoxelCoord {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.offset(other.x, other.y, other.z)
    }
}

impl Sub for VoxelCoord {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(
            self.x.saturating_sub(other.x),
            self.y.saturating_sub(other.y),
            self.z.saturating_sub(other.z),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_negative() {
        let c = VoxelCoord::floor(&Point3::new(-0.001, -1.0, -1.999));
        assert_eq!(c, VoxelCoord::new(-1, -1, -2));
    }

    #[test]
    fn test_round_matches_nearest_center() {
        assert_eq!(
            VoxelCoord::round(&Point3::new(0.49, 0.51, -0.51)),
            VoxelCoord::new(0, 1, -1)
        );
    }

    #[test]
    fn test_face_neighbors_are_unit_steps() {
        let c = VoxelCoord::new(3, 4, 5);
        for n in c.face_neighbors() {
            let d = n - c;
            assert_eq!(d.x.abs() + d.y.abs() + d.z.abs(), 1);
        }
    }

    #[test]
    fn test_tile_origin_alignment() {
        assert_eq!(VoxelCoord::new(0, 7, 8).tile_origin(), VoxelCoord::new(0, 0, 8));
        assert_eq!(
            VoxelCoord::new(-8, -9, -1).tile_origin(),
            VoxelCoord::new(-8, -16, -8)
        );
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut coords = vec![
            VoxelCoord::new(1, 0, 0),
            VoxelCoord::new(0, 1, 0),
            VoxelCoord::new(0, 0, 1),
        ];
        coords.sort();
        assert_eq!(coords[0], VoxelCoord::new(0, 0, 1));
        assert_eq!(coords[2], VoxelCoord::new(1, 0, 0));
    }

    #[test]
    fn test_axis_and_conversions() {
        let c = VoxelCoord::from([4, 5, 6]);
        assert_eq!(c.axis(0), 4);
        assert_eq!(c.axis(1), 5);
        assert_eq!(c.axis(2), 6);
        assert_eq!(<[i32; 3]>::from(c), [4, 5, 6]);
        assert_eq!(c.to_point(), Point3::new(4.0, 5.0, 6.0));
        assert_eq!(c.to_vector().x, 4.0);
    }
}
