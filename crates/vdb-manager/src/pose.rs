//! Local voxel transforms and rigid poses of grids.
//!
//! A grid's index-to-world matrix is always `pose * local`, where `local`
//! scales index coordinates to meters (and optionally shifts by half a
//! voxel so integer coordinates land on voxel centers). Callers only ever
//! see the pose; the local part is rebuilt from the manager resolution.

use nalgebra::{Matrix4, Vector3};
use vdb_grid::{FloatGrid, Transform};

use crate::error::{ManagerError, ManagerResult};

/// Builds the index-to-local transform for a resolution in voxels per meter.
///
/// With `cell_centered`, index `(0, 0, 0)` maps to the center of the voxel
/// spanning `[0, 1/resolution]` on each axis instead of its corner.
///
/// # Errors
///
/// Returns [`ManagerError::Grid`] if `resolution` is not positive and finite.
///
/// # Example
///
/// ```
/// use vdb_manager::create_local_transform;
/// use nalgebra::Point3;
///
/// let local = create_local_transform(10.0, true).unwrap();
/// let p = local.index_to_world(&Point3::new(0.0, 1.0, 2.0));
/// assert!((p - Point3::new(0.05, 0.15, 0.25)).norm() < 1e-9);
/// ```
pub fn create_local_transform(resolution: f32, cell_centered: bool) -> ManagerResult<Transform> {
    let voxel_size = 1.0 / f64::from(resolution);
    let mut transform = Transform::linear(voxel_size)?;
    if cell_centered {
        transform.post_translate(&Vector3::repeat(0.5 * voxel_size));
    }
    Ok(transform)
}

/// A 4x4 affine map from a grid's local frame to the world frame.
///
/// Exchanged with callers as 16 column-major doubles.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose(pub Matrix4<f64>);

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// The identity pose.
    #[must_use]
    pub fn identity() -> Self {
        Self(Matrix4::identity())
    }

    /// Reads a pose from 16 column-major values.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::InvalidBuffer`] unless exactly 16 values are given.
    pub fn from_column_major(values: &[f64]) -> ManagerResult<Self> {
        if values.len() != 16 {
            return Err(ManagerError::invalid_buffer(format!(
                "pose needs 16 values, got {}",
                values.len()
            )));
        }
        Ok(Self(Matrix4::from_column_slice(values)))
    }

    /// The pose as 16 column-major values.
    #[must_use]
    pub fn to_column_major(&self) -> [f64; 16] {
        let mut out = [0.0; 16];
        out.copy_from_slice(self.0.as_slice());
        out
    }

    /// The underlying matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Matrix4<f64> {
        &self.0
    }
}

impl From<Matrix4<f64>> for Pose {
    fn from(m: Matrix4<f64>) -> Self {
        Self(m)
    }
}

/// Replaces the transform of `grid` with `pose * local`.
///
/// Voxel contents are untouched; only where they sit in the world changes.
///
/// # Errors
///
/// Returns [`ManagerError::Grid`] if the resolution is invalid or the
/// composed matrix is not an invertible affine map.
pub fn apply_pose_to_grid(
    grid: &mut FloatGrid,
    resolution: f32,
    pose: &Pose,
    voxel_centered: bool,
) -> ManagerResult<()> {
    let local = create_local_transform(resolution, voxel_centered)?;
    let transform = Transform::from_matrix(pose.0 * local.matrix())?;
    grid.set_transform(transform);
    Ok(())
}

/// Recovers the pose last applied to `grid` with a cell-centered local transform.
///
/// # Errors
///
/// Returns [`ManagerError::Grid`] if the resolution is invalid.
pub fn pose_from_grid(grid: &FloatGrid, resolution: f32) -> ManagerResult<Pose> {
    let local = create_local_transform(resolution, true)?;
    Ok(strip_local(grid, &local))
}

/// The pose of `grid` once the given local transform is divided out.
#[must_use]
pub fn strip_local(grid: &FloatGrid, local: &Transform) -> Pose {
    Pose(grid.transform().matrix() * local.inverse_matrix())
}
