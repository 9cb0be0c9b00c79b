//! Finite-difference stencils for gradient evaluation.

use nalgebra::{Point3, Vector3};

use crate::grid::{GridValue, SparseGrid};
use crate::voxel::VoxelCoord;

/// The eight voxels of the cell whose minimum corner is the stencil center.
///
/// Values are cached on [`move_to`](Self::move_to), so evaluating several
/// positions inside one cell only reads the grid once.
#[derive(Debug)]
pub struct BoxStencil<'a, T> {
    grid: &'a SparseGrid<T>,
    center: VoxelCoord,
    // Index bits: 4 = +x, 2 = +y, 1 = +z.
    values: [f64; 8],
}

impl<'a, T: GridValue> BoxStencil<'a, T> {
    /// Creates a stencil positioned at the index origin.
    #[must_use]
    pub fn new(grid: &'a SparseGrid<T>) -> Self {
        let mut stencil = Self {
            grid,
            center: VoxelCoord::origin(),
            values: [0.0; 8],
        };
        stencil.load();
        stencil
    }

    /// Moves the stencil to the cell at `ijk`.
    pub fn move_to(&mut self, ijk: VoxelCoord) {
        if ijk != self.center {
            self.center = ijk;
            self.load();
        }
    }

    /// Moves the stencil to the cell containing a continuous index position.
    pub fn move_to_point(&mut self, xyz: &Point3<f64>) {
        self.move_to(VoxelCoord::floor(xyz));
    }

    /// The cell's minimum corner.
    #[must_use]
    pub const fn center(&self) -> VoxelCoord {
        self.center
    }

    fn load(&mut self) {
        for (bits, slot) in self.values.iter_mut().enumerate() {
            let dx = i32::from(bits & 4 != 0);
            let dy = i32::from(bits & 2 != 0);
            let dz = i32::from(bits & 1 != 0);
            *slot = self.grid.value(self.center.offset(dx, dy, dz)).to_f64();
        }
    }

    /// Trilinear interpolation at an index-space position in the current cell.
    #[must_use]
    pub fn interpolation(&self, xyz: &Point3<f64>) -> f64 {
        let (u, v, w) = self.local(xyz);
        let v0 = &self.values;
        let x0 = lerp(lerp(v0[0], v0[1], w), lerp(v0[2], v0[3], w), v);
        let x1 = lerp(lerp(v0[4], v0[5], w), lerp(v0[6], v0[7], w), v);
        lerp(x0, x1, u)
    }

    /// Index-space gradient of the trilinear interpolant at `xyz`.
    ///
    /// Units are value per voxel; the result is not rescaled by voxel size.
    #[must_use]
    pub fn gradient(&self, xyz: &Point3<f64>) -> Vector3<f64> {
        let (u, v, w) = self.local(xyz);
        let s = &self.values;

        let dx = [s[4] - s[0], s[5] - s[1], s[6] - s[2], s[7] - s[3]];
        let gx = lerp(lerp(dx[0], dx[1], w), lerp(dx[2], dx[3], w), v);

        let dy = [s[2] - s[0], s[3] - s[1], s[6] - s[4], s[7] - s[5]];
        let gy = lerp(lerp(dy[0], dy[1], w), lerp(dy[2], dy[3], w), u);

        let dz = [s[1] - s[0], s[3] - s[2], s[5] - s[4], s[7] - s[6]];
        let gz = lerp(lerp(dz[0], dz[1], v), lerp(dz[2], dz[3], v), u);

        Vector3::new(gx, gy, gz)
    }

    fn local(&self, xyz: &Point3<f64>) -> (f64, f64, f64) {
        (
            xyz.x - f64::from(self.center.x),
            xyz.y - f64::from(self.center.y),
            xyz.z - f64::from(self.center.z),
        )
    }
}

/// Seven-point stencil for second-order central differences.
#[derive(Debug)]
pub struct GradStencil<'a, T> {
    grid: &'a SparseGrid<T>,
    center: VoxelCoord,
    // [center, -x, +x, -y, +y, -z, +z]
    values: [f64; 7],
}

impl<'a, T: GridValue> GradStencil<'a, T> {
    /// Creates a stencil positioned at the index origin.
    #[must_use]
    pub fn new(grid: &'a SparseGrid<T>) -> Self {
        let mut stencil = Self {
            grid,
            center: VoxelCoord::origin(),
            values: [0.0; 7],
        };
        stencil.load();
        stencil
    }

    /// Centers the stencil on `ijk`.
    pub fn move_to(&mut self, ijk: VoxelCoord) {
        if ijk != self.center {
            self.center = ijk;
            self.load();
        }
    }

    fn load(&mut self) {
        let c = self.center;
        let coords = [
            c,
            c.offset(-1, 0, 0),
            c.offset(1, 0, 0),
            c.offset(0, -1, 0),
            c.offset(0, 1, 0),
            c.offset(0, 0, -1),
            c.offset(0, 0, 1),
        ];
        for (slot, coord) in self.values.iter_mut().zip(coords) {
            *slot = self.grid.value(coord).to_f64();
        }
    }

    /// Value at the stencil center.
    #[must_use]
    pub const fn center_value(&self) -> f64 {
        self.values[0]
    }

    /// Central difference in index units.
    #[must_use]
    pub fn gradient_index(&self) -> Vector3<f64> {
        let v = &self.values;
        Vector3::new(v[2] - v[1], v[4] - v[3], v[6] - v[5]) * 0.5
    }

    /// Central difference mapped into world axes and world units.
    ///
    /// The index-space gradient is pulled back through the inverse transpose
    /// of the grid transform's linear part, so rotated grids report world-frame
    /// directions.
    #[must_use]
    pub fn gradient_world(&self) -> Vector3<f64> {
        let inverse_jacobian = self
            .grid
            .transform()
            .inverse_matrix()
            .fixed_view::<3, 3>(0, 0)
            .into_owned();
        inverse_jacobian.transpose() * self.gradient_index()
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
