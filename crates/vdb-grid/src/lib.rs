//! Sparse voxel grids and signed distance volumes.
//!
//! This crate provides the grid layer underneath `vdb-manager`:
//!
//! - [`SparseGrid`] - Hash-backed voxel grid with background, inactive values and tiles
//! - [`Transform`] - Affine index-to-world mapping
//! - [`mesh_to_volume`] - Narrow band signed distance from a triangle mesh
//! - [`sample_nearest`], [`sample_box`], [`sample_quadratic`] - Point samplers
//! - [`BoxStencil`] and [`GradStencil`] - Gradient stencils
//! - [`VoxelTraversal`] - DDA ray walk through index space
//! - [`write_stream`] and [`read_stream`] - Binary grid streams with metadata
//!
//! # Coordinate Systems
//!
//! Index space is the integer lattice of voxel coordinates ([`VoxelCoord`]),
//! extended to continuous `f64` positions for sampling. World space is reached
//! through a grid's [`Transform`]. Voxel `(i, j, k)` is the world image of the
//! index point `(i, j, k)`; cell-centered layouts are expressed by a half-voxel
//! translation in the transform rather than in the coordinates.
//!
//! # Example
//!
//! ```
//! use vdb_grid::{mesh_to_volume, MeshToVolumeParams, PolygonSource, Transform};
//! use nalgebra::Point3;
//!
//! /// A single tetrahedron.
//! struct Tet;
//!
//! impl PolygonSource for Tet {
//!     fn polygon_count(&self) -> usize { 4 }
//!     fn point_count(&self) -> usize { 4 }
//!     fn index_space_point(&self, polygon: usize, corner: usize) -> Point3<f64> {
//!         const P: [[f64; 3]; 4] = [[0.0, 0.0, 0.0], [8.0, 0.0, 0.0], [0.0, 8.0, 0.0], [0.0, 0.0, 8.0]];
//!         const F: [[usize; 3]; 4] = [[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
//!         let p = P[F[polygon][corner]];
//!         Point3::new(p[0], p[1], p[2])
//!     }
//! }
//!
//! let volume = mesh_to_volume(&Tet, &Transform::identity(), &MeshToVolumeParams::default()).unwrap();
//! assert!(volume.distance.active_voxel_count() > 0);
//! assert!(volume.distance.value(vdb_grid::VoxelCoord::new(1, 1, 1)) < 0.0);
//! ```
//!
//! # Streams
//!
//! ```
//! use vdb_grid::{read_stream, write_stream, FloatGrid, MetaMap, VoxelCoord};
//!
//! let mut grid = FloatGrid::new(1.0);
//! grid.set_value(VoxelCoord::new(0, 0, 0), 0.0);
//!
//! let mut bytes = Vec::new();
//! write_stream(&mut bytes, &MetaMap::new(), &[(&grid).into()]).unwrap();
//! let stream = read_stream(bytes.as_slice()).unwrap();
//! assert_eq!(stream.grids.len(), 1);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod bounds;
mod error;
mod grid;
mod io;
mod mesh_to_volume;
mod metadata;
mod registry;
mod sampler;
mod stencil;
mod transform;
mod traversal;
mod triangle;
mod voxel;

pub use bounds::{Aabb, GridBounds, GridBoundsIter};
pub use error::{GridError, GridResult, StreamError, StreamResult};
pub use grid::{FloatGrid, GridValue, Int32Grid, SparseGrid};
pub use io::{AnyGrid, FORMAT_VERSION, GridRef, GridStream, MAGIC, read_stream, write_stream};
pub use mesh_to_volume::{
    INVALID_POLYGON, MIN_HALF_WIDTH, MeshToVolumeParams, MeshVolume, PolygonSource, SEED_RADIUS,
    mesh_to_volume,
};
pub use metadata::{MetaMap, MetaValue};
pub use registry::{GridTypeRegistry, initialize, is_initialized};
pub use sampler::{
    sample_box, sample_box_index, sample_nearest, sample_quadratic, sample_quadratic_index,
};
pub use stencil::{BoxStencil, GradStencil};
pub use transform::Transform;
pub use traversal::{Ray, VoxelTraversal};
pub use triangle::Triangle;
pub use voxel::{TILE_DIM, VoxelCoord};

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point3, Vector3};
