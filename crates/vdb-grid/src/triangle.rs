//! Triangle queries used by mesh-to-volume conversion.

use nalgebra::Point3;

/// A triangle given by three points in a common space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First corner.
    pub a: Point3<f64>,
    /// Second corner.
    pub b: Point3<f64>,
    /// Third corner.
    pub c: Point3<f64>,
}

impl Triangle {
    /// Creates a triangle from its corners.
    #[must_use]
    pub const fn new(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Self {
        Self { a, b, c }
    }

    /// Closest point on the triangle to `p`.
    ///
    /// Follows the Voronoi-region walk from Ericson, "Real-Time Collision
    /// Detection". Degenerate triangles fall back to their first corner.
    ///
    /// # Example
    ///
    /// ```
    /// use vdb_grid::Triangle;
    /// use nalgebra::Point3;
    ///
    /// let tri = Triangle::new(
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    /// );
    /// let q = tri.closest_point(&Point3::new(0.25, 0.25, 2.0));
    /// assert!((q - Point3::new(0.25, 0.25, 0.0)).norm() < 1e-12);
    /// ```
    #[must_use]
    pub fn closest_point(&self, p: &Point3<f64>) -> Point3<f64> {
        let (a, b, c) = (self.a, self.b, self.c);
        let ab = b - a;
        let ac = c - a;
        let ap = p - a;

        let d1 = ab.dot(&ap);
        let d2 = ac.dot(&ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return a;
        }

        let bp = p - b;
        let d3 = ab.dot(&bp);
        let d4 = ac.dot(&bp);
        if d3 >= 0.0 && d4 <= d3 {
            return b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            return a + ab * (d1 / (d1 - d3));
        }

        let cp = p - c;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= 0.0 && d5 <= d6 {
            return c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            return a + ac * (d2 / (d2 - d6));
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return b + (c - b) * w;
        }

        let denom = va + vb + vc;
        if denom.abs() <= f64::MIN_POSITIVE {
            return a;
        }
        a + ab * (vb / denom) + ac * (vc / denom)
    }

    /// Euclidean distance from `p` to the triangle.
    #[must_use]
    pub fn distance(&self, p: &Point3<f64>) -> f64 {
        (self.closest_point(p) - p).norm()
    }

    /// X coordinate where the line `{(t, y, z)}` pierces the triangle.
    ///
    /// Returns `None` when the line misses or the triangle is parallel to X.
    #[must_use]
    pub fn x_crossing(&self, y: f64, z: f64) -> Option<f64> {
        let (a, b, c) = (self.a, self.b, self.c);
        let det = (b.y - a.y) * (c.z - a.z) - (c.y - a.y) * (b.z - a.z);
        if det.abs() < 1e-14 {
            return None;
        }
        let wb = ((y - a.y) * (c.z - a.z) - (c.y - a.y) * (z - a.z)) / det;
        let wc = ((b.y - a.y) * (z - a.z) - (y - a.y) * (b.z - a.z)) / det;
        let wa = 1.0 - wb - wc;
        if wa < 0.0 || wb < 0.0 || wc < 0.0 {
            return None;
        }
        Some(wa * a.x + wb * b.x + wc * c.x)
    }

    /// Per-axis minimum corner.
    #[must_use]
    pub fn min(&self) -> Point3<f64> {
        self.a.inf(&self.b).inf(&self.c)
    }

    /// Per-axis maximum corner.
    #[must_use]
    pub fn max(&self) -> Point3<f64> {
        self.a.sup(&self.b).sup(&self.c)
    }
}
