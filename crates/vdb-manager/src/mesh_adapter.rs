//! Borrowed view of column-blocked mesh buffers.

// Face indices arrive as doubles and are validated to be small positive integers.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use nalgebra::Point3;
use vdb_grid::{PolygonSource, Transform};

use crate::error::{ManagerError, ManagerResult};

/// A triangle mesh over caller-owned buffers, seen through a grid transform.
///
/// Vertices are `[x0..xN-1, y0..yN-1, z0..zN-1]` and faces are one-based
/// vertex indices in the same column-blocked layout. Nothing is copied;
/// [`index_space_point`](PolygonSource::index_space_point) converts a corner
/// on demand.
///
/// # Example
///
/// ```
/// use vdb_manager::{create_local_transform, MeshAdapter};
/// use vdb_grid::PolygonSource;
///
/// let vertices = [0.0, 1.0, 0.0, /* y */ 0.0, 0.0, 1.0, /* z */ 0.0, 0.0, 0.0];
/// let faces = [1.0, 2.0, 3.0];
/// let mesh = MeshAdapter::new(create_local_transform(10.0, false).unwrap(), &vertices, &faces).unwrap();
/// assert_eq!(mesh.polygon_count(), 1);
/// assert!((mesh.index_space_point(0, 1).x - 10.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct MeshAdapter<'a> {
    transform: Transform,
    vertices: &'a [f64],
    faces: &'a [f64],
    vertex_count: usize,
    face_count: usize,
}

impl<'a> MeshAdapter<'a> {
    /// Wraps the buffers after checking their shape and every face index.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::InvalidBuffer`] if either buffer length is not
    /// a multiple of three or an index is not a whole number, and
    /// [`ManagerError::FaceIndexOutOfRange`] for indices outside `1..=N`.
    pub fn new(transform: Transform, vertices: &'a [f64], faces: &'a [f64]) -> ManagerResult<Self> {
        if vertices.len() % 3 != 0 {
            return Err(ManagerError::invalid_buffer(format!(
                "vertex buffer length {} is not a multiple of 3",
                vertices.len()
            )));
        }
        if faces.len() % 3 != 0 {
            return Err(ManagerError::invalid_buffer(format!(
                "face buffer length {} is not a multiple of 3",
                faces.len()
            )));
        }
        let vertex_count = vertices.len() / 3;
        let face_count = faces.len() / 3;

        for (slot, &index) in faces.iter().enumerate() {
            if !index.is_finite() || index.fract() != 0.0 {
                return Err(ManagerError::invalid_buffer(format!(
                    "face index {index} is not a whole number"
                )));
            }
            if index < 1.0 || index > vertex_count as f64 {
                return Err(ManagerError::FaceIndexOutOfRange {
                    face: slot % face_count,
                    index,
                    vertex_count,
                });
            }
        }

        Ok(Self {
            transform,
            vertices,
            faces,
            vertex_count,
            face_count,
        })
    }

    /// The transform used for index-space conversion.
    #[must_use]
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Vertex `v` in the mesh's own frame.
    #[must_use]
    pub fn vertex(&self, v: usize) -> Point3<f64> {
        let n = self.vertex_count;
        Point3::new(self.vertices[v], self.vertices[v + n], self.vertices[v + 2 * n])
    }

    /// Zero-based vertex index of `corner` of face `face`.
    #[must_use]
    pub fn face_vertex(&self, face: usize, corner: usize) -> usize {
        self.faces[face + corner * self.face_count] as usize - 1
    }
}

impl PolygonSource for MeshAdapter<'_> {
    fn polygon_count(&self) -> usize {
        self.face_count
    }

    fn point_count(&self) -> usize {
        self.vertex_count
    }

    fn index_space_point(&self, polygon: usize, corner: usize) -> Point3<f64> {
        let local = self.vertex(self.face_vertex(polygon, corner));
        self.transform.world_to_index(&local)
    }
}
