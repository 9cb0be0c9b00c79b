//! Affine index-to-world transforms.
//!
//! Matrices use the column-vector convention: a world point is
//! `M * [i, j, k, 1]^T`. The inverse is cached at construction, so every
//! transform held by a grid is known to be invertible.

use nalgebra::{Matrix3, Matrix4, Point3, RowVector4, Vector3};

use crate::bounds::{Aabb, GridBounds};
use crate::error::{GridError, GridResult};
use crate::voxel::VoxelCoord;

const AFFINE_TOLERANCE: f64 = 1e-12;

/// An invertible affine map between index space and world space.
///
/// # Example
///
/// ```
/// use vdb_grid::Transform;
/// use nalgebra::Point3;
///
/// let xform = Transform::linear(0.1).unwrap();
/// let world = xform.index_to_world(&Point3::new(10.0, 0.0, -5.0));
/// assert!((world.x - 1.0).abs() < 1e-12);
/// assert!((world.z + 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    index_to_world: Matrix4<f64>,
    world_to_index: Matrix4<f64>,
}

impl Transform {
    /// Wraps an index-to-world matrix.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NotAffine`] if the bottom row is not `[0, 0, 0, 1]`,
    /// or [`GridError::SingularTransform`] if the matrix cannot be inverted.
    pub fn from_matrix(index_to_world: Matrix4<f64>) -> GridResult<Self> {
        if !index_to_world.iter().all(|v| v.is_finite()) {
            return Err(GridError::SingularTransform);
        }
        let bottom = index_to_world.row(3) - RowVector4::new(0.0, 0.0, 0.0, 1.0);
        if bottom.amax() > AFFINE_TOLERANCE {
            return Err(GridError::NotAffine);
        }
        let world_to_index = index_to_world
            .try_inverse()
            .ok_or(GridError::SingularTransform)?;
        Ok(Self {
            index_to_world,
            world_to_index,
        })
    }

    /// A uniform scaling transform with the given voxel edge length.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidVoxelSize`] unless `voxel_size` is positive and finite.
    pub fn linear(voxel_size: f64) -> GridResult<Self> {
        if !(voxel_size.is_finite() && voxel_size > 0.0) {
            return Err(GridError::InvalidVoxelSize(voxel_size));
        }
        let scale = Vector3::repeat(voxel_size);
        let inv = Vector3::repeat(voxel_size.recip());
        Ok(Self {
            index_to_world: Matrix4::new_nonuniform_scaling(&scale),
            world_to_index: Matrix4::new_nonuniform_scaling(&inv),
        })
    }

    /// The identity transform (unit voxels, origin at index zero).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            index_to_world: Matrix4::identity(),
            world_to_index: Matrix4::identity(),
        }
    }

    /// Appends a world-space translation after the current map.
    pub fn post_translate(&mut self, offset: &Vector3<f64>) {
        self.index_to_world = Matrix4::new_translation(offset) * self.index_to_world;
        let inverse = -*offset;
        self.world_to_index *= Matrix4::new_translation(&inverse);
    }

    /// The index-to-world matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Matrix4<f64> {
        &self.index_to_world
    }

    /// The world-to-index matrix.
    #[must_use]
    pub const fn inverse_matrix(&self) -> &Matrix4<f64> {
        &self.world_to_index
    }

    /// The linear part of the index-to-world map.
    #[must_use]
    pub fn jacobian(&self) -> Matrix3<f64> {
        self.index_to_world.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Maps a continuous index-space position to world space.
    #[must_use]
    pub fn index_to_world(&self, p: &Point3<f64>) -> Point3<f64> {
        self.index_to_world.transform_point(p)
    }

    /// Maps a voxel's integer coordinate to world space.
    #[must_use]
    pub fn coord_to_world(&self, coord: VoxelCoord) -> Point3<f64> {
        self.index_to_world(&coord.to_point())
    }

    /// Maps a world-space position to continuous index space.
    #[must_use]
    pub fn world_to_index(&self, p: &Point3<f64>) -> Point3<f64> {
        self.world_to_index.transform_point(p)
    }

    /// Maps a world-space position to the nearest integer voxel coordinate.
    #[must_use]
    pub fn world_to_index_cell_centered(&self, p: &Point3<f64>) -> VoxelCoord {
        VoxelCoord::round(&self.world_to_index(p))
    }

    /// World-space length of one index step along each axis.
    #[must_use]
    pub fn voxel_size(&self) -> Vector3<f64> {
        let j = self.jacobian();
        Vector3::new(j.column(0).norm(), j.column(1).norm(), j.column(2).norm())
    }

    /// World-space box enclosing the eight transformed corners of `bounds`.
    #[must_use]
    pub fn index_bounds_to_world(&self, bounds: &GridBounds) -> Aabb {
        let mut corners = bounds.corners().into_iter().map(|c| self.coord_to_world(c));
        let first = corners.next().unwrap_or_else(Point3::origin);
        let mut aabb = Aabb::from_point(first);
        for p in corners {
            aabb.expand_to_include(&p);
        }
        aabb
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
