//! Ray traversal through index space.

use nalgebra::{Point3, Vector3};

use crate::transform::Transform;
use crate::voxel::VoxelCoord;

/// A ray with parametric position `origin + t * direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin.
    pub origin: Point3<f64>,
    /// Ray direction; not required to be unit length.
    pub direction: Vector3<f64>,
}

impl Ray {
    /// Creates a ray.
    #[must_use]
    pub const fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t`.
    #[must_use]
    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// Re-expresses a world-space ray in the index space of `transform`.
    ///
    /// The parameter is preserved: `at(t)` of the result is the index-space
    /// image of `at(t)` of the original.
    #[must_use]
    pub fn to_index_space(&self, transform: &Transform) -> Self {
        let linear = transform.inverse_matrix().fixed_view::<3, 3>(0, 0).into_owned();
        Self {
            origin: transform.world_to_index(&self.origin),
            direction: linear * self.direction,
        }
    }
}

/// Iterates the voxels an index-space ray passes through on `[t_start, t_end]`.
///
/// Uses the Amanatides-Woo 3D DDA on unit voxels, where voxel `(i, j, k)`
/// covers `[i, i+1) x [j, j+1) x [k, k+1)`. Each item is the voxel and the
/// parameter at which the ray enters it (clamped to `t_start` for the first).
///
/// # Example
///
/// ```
/// use vdb_grid::{Ray, VoxelCoord, VoxelTraversal};
/// use nalgebra::{Point3, Vector3};
///
/// let ray = Ray::new(Point3::new(0.5, 0.5, 0.5), Vector3::x());
/// let voxels: Vec<_> = VoxelTraversal::new(&ray, 0.0, 2.2).map(|(c, _)| c).collect();
/// assert_eq!(
///     voxels,
///     vec![VoxelCoord::new(0, 0, 0), VoxelCoord::new(1, 0, 0), VoxelCoord::new(2, 0, 0)]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct VoxelTraversal {
    current: VoxelCoord,
    step: [i32; 3],
    t_max: [f64; 3],
    t_delta: [f64; 3],
    t_current: f64,
    t_end: f64,
    first: bool,
}

impl VoxelTraversal {
    /// Starts a traversal of `ray` (already in index space).
    #[must_use]
    pub fn new(ray: &Ray, t_start: f64, t_end: f64) -> Self {
        let start = ray.at(t_start);
        let current = VoxelCoord::floor(&start);

        let mut step = [0i32; 3];
        let mut t_max = [f64::INFINITY; 3];
        let mut t_delta = [f64::INFINITY; 3];

        let dir = [ray.direction.x, ray.direction.y, ray.direction.z];
        let pos = [start.x, start.y, start.z];
        let coord = current.as_array();

        for i in 0..3 {
            if dir[i].abs() > f64::EPSILON {
                step[i] = if dir[i] > 0.0 { 1 } else { -1 };
                t_delta[i] = dir[i].recip().abs();
                let boundary = if dir[i] > 0.0 {
                    f64::from(coord[i]) + 1.0
                } else {
                    f64::from(coord[i])
                };
                t_max[i] = t_start + (boundary - pos[i]) / dir[i];
            }
        }

        Self {
            current,
            step,
            t_max,
            t_delta,
            t_current: t_start,
            t_end,
            first: true,
        }
    }
}

impl Iterator for VoxelTraversal {
    type Item = (VoxelCoord, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.first {
            self.first = false;
            return (self.t_current <= self.t_end).then_some((self.current, self.t_current));
        }

        let axis = if self.t_max[0] < self.t_max[1] {
            if self.t_max[0] < self.t_max[2] { 0 } else { 2 }
        } else if self.t_max[1] < self.t_max[2] {
            1
        } else {
            2
        };

        let t_next = self.t_max[axis];
        if !t_next.is_finite() || t_next > self.t_end {
            return None;
        }
        self.t_current = t_next;

        match axis {
            0 => self.current.x = self.current.x.wrapping_add(self.step[0]),
            1 => self.current.y = self.current.y.wrapping_add(self.step[1]),
            _ => self.current.z = self.current.z.wrapping_add(self.step[2]),
        }
        self.t_max[axis] += self.t_delta[axis];

        Some((self.current, self.t_current))
    }
}
