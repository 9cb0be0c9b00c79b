//! Index-space and world-space bounding boxes.

use nalgebra::{Point3, Vector3};

use crate::voxel::VoxelCoord;

/// Axis-aligned bounds in index space.
///
/// Both corners are inclusive, so a single voxel has extents `(1, 1, 1)`.
///
/// # Example
///
/// ```
/// use vdb_grid::{GridBounds, VoxelCoord};
///
/// let bounds = GridBounds::new(VoxelCoord::new(2, 0, 0), VoxelCoord::new(0, 4, 1));
/// assert_eq!(bounds.min, VoxelCoord::new(0, 0, 0));
/// assert_eq!(bounds.extents(), VoxelCoord::new(3, 5, 2));
/// assert_eq!(bounds.max_extent(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridBounds {
    /// Minimum corner (inclusive).
    pub min: VoxelCoord,
    /// Maximum corner (inclusive).
    pub max: VoxelCoord,
}

impl GridBounds {
    /// Creates bounds from two corners, ordering them per axis.
    #[must_use]
    pub fn new(a: VoxelCoord, b: VoxelCoord) -> Self {
        Self {
            min: VoxelCoord::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: VoxelCoord::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Creates bounds containing a single voxel.
    #[must_use]
    pub const fn from_point(coord: VoxelCoord) -> Self {
        Self {
            min: coord,
            max: coord,
        }
    }

    /// Number of voxels spanned along each axis.
    #[must_use]
    pub fn extents(&self) -> VoxelCoord {
        (self.max - self.min).offset(1, 1, 1)
    }

    /// The largest of the three extents.
    #[must_use]
    pub fn max_extent(&self) -> i32 {
        let e = self.extents();
        e.x.max(e.y).max(e.z)
    }

    /// Total number of voxels in the bounds.
    #[must_use]
    pub fn volume(&self) -> u64 {
        let e = self.extents();
        u64::from(e.x.unsigned_abs())
            .saturating_mul(u64::from(e.y.unsigned_abs()))
            .saturating_mul(u64::from(e.z.unsigned_abs()))
    }

    /// Checks whether the bounds contain a coordinate.
    #[must_use]
    pub const fn contains(&self, coord: VoxelCoord) -> bool {
        coord.x >= self.min.x
            && coord.x <= self.max.x
            && coord.y >= self.min.y
            && coord.y <= self.max.y
            && coord.z >= self.min.z
            && coord.z <= self.max.z
    }

    /// Expands the bounds to include a coordinate.
    pub fn expand_to_include(&mut self, coord: VoxelCoord) {
        self.min = VoxelCoord::new(
            self.min.x.min(coord.x),
            self.min.y.min(coord.y),
            self.min.z.min(coord.z),
        );
        self.max = VoxelCoord::new(
            self.max.x.max(coord.x),
            self.max.y.max(coord.y),
            self.max.z.max(coord.z),
        );
    }

    /// Returns a copy grown by `margin` voxels on every side.
    #[must_use]
    pub const fn dilated(&self, margin: i32) -> Self {
        Self {
            min: self.min.offset(-margin, -margin, -margin),
            max: self.max.offset(margin, margin, margin),
        }
    }

    /// Returns the eight corner coordinates.
    #[must_use]
    pub const fn corners(&self) -> [VoxelCoord; 8] {
        let (a, b) = (self.min, self.max);
        [
            VoxelCoord::new(a.x, a.y, a.z),
            VoxelCoord::new(a.x, a.y, b.z),
            VoxelCoord::new(a.x, b.y, a.z),
            VoxelCoord::new(a.x, b.y, b.z),
            VoxelCoord::new(b.x, a.y, a.z),
            VoxelCoord::new(b.x, a.y, b.z),
            VoxelCoord::new(b.x, b.y, a.z),
            VoxelCoord::new(b.x, b.y, b.z),
        ]
    }

    /// Returns an iterator over every coordinate, x fastest.
    #[must_use]
    pub const fn iter(&self) -> GridBoundsIter {
        GridBoundsIter {
            bounds: *self,
            current: Some(self.min),
        }
    }
}

impl IntoIterator for &GridBounds {
    type Item = VoxelCoord;
    type IntoIter = GridBoundsIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over all coordinates in a [`GridBounds`].
#[derive(Debug, Clone)]
pub struct GridBoundsIter {
    bounds: GridBounds,
    current: Option<VoxelCoord>,
}

impl Iterator for GridBoundsIter {
    type Item = VoxelCoord;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;

        let mut next = current;
        if next.x < self.bounds.max.x {
            next.x += 1;
        } else if next.y < self.bounds.max.y {
            next.x = self.bounds.min.x;
            next.y += 1;
        } else if next.z < self.bounds.max.z {
            next.x = self.bounds.min.x;
            next.y = self.bounds.min.y;
            next.z += 1;
        } else {
            self.current = None;
            return Some(current);
        }
        self.current = Some(next);

        Some(current)
    }
}

/// Axis-aligned bounding box in world space.
///
/// A box whose corners coincide on any axis has no volume; the manager uses
/// such a box as its "nothing tracked" sentinel.
///
/// # Example
///
/// ```
/// use vdb_grid::Aabb;
/// use nalgebra::Point3;
///
/// let mut aabb = Aabb::new(Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 1.0));
/// assert!(aabb.has_volume());
/// aabb.expand_to_include(&Point3::new(2.0, -1.0, 0.5));
/// assert_eq!(aabb.as_limits(), [0.0, 2.0, -1.0, 1.0, 0.0, 1.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Creates a box from two corners, ordering them per axis.
    #[must_use]
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Creates a degenerate box around a single point.
    #[must_use]
    pub const fn from_point(p: Point3<f64>) -> Self {
        Self { min: p, max: p }
    }

    /// Returns the smallest box containing all `points`, or `None` if empty.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3<f64>>,
    {
        let mut iter = points.into_iter();
        let mut aabb = Self::from_point(iter.next()?);
        for p in iter {
            aabb.expand_to_include(&p);
        }
        Some(aabb)
    }

    /// True when the box is strictly positive along every axis.
    #[must_use]
    pub fn has_volume(&self) -> bool {
        self.max.x > self.min.x && self.max.y > self.min.y && self.max.z > self.min.z
    }

    /// Returns the box center.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Returns the edge lengths.
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Checks whether the box contains a point (boundary inclusive).
    #[must_use]
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Grows the box to include a point.
    pub fn expand_to_include(&mut self, p: &Point3<f64>) {
        self.min = Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
    }

    /// Grows the box to include another box.
    pub fn expand_to_include_box(&mut self, other: &Self) {
        self.expand_to_include(&other.min);
        self.expand_to_include(&other.max);
    }

    /// Limits as `[xmin, xmax, ymin, ymax, zmin, zmax]`.
    #[must_use]
    pub fn as_limits(&self) -> [f64; 6] {
        [
            self.min.x, self.max.x, self.min.y, self.max.y, self.min.z, self.max.z,
        ]
    }
}
