//! A manager of posed, sparse truncated signed distance grids.
//!
//! Triangle meshes are discretized into narrow-band distance grids, each
//! stored under an integer ID with its own rigid pose. Distance and gradient
//! queries run against the union of all grids:
//!
//! - [`VdbManager`] - Grid map with cached voxel count and world limits
//! - [`VdbManager::distance`] and [`VdbManager::gradient`] - Multi-grid queries
//! - [`VdbManager::serialize`] and [`VdbManager::deserialize`] - Binary blobs
//! - [`insert_point_cloud`] and [`create_mesh`] - Depth fusion and surface extraction
//! - [`ManagerRegistry`] - Opaque handles and a flat column-blocked API
//!
//! # Frames
//!
//! Each grid's index-to-world matrix is `pose * local`, where `local` maps
//! voxel `(i, j, k)` to the center of the cell `[i, i+1) / resolution`.
//! Poses cross the API as 16 column-major doubles.
//!
//! # Example
//!
//! ```
//! use vdb_manager::{InterpMethod, ManagerConfig, Pose, VdbManager};
//! use nalgebra::Point3;
//!
//! // Unit cube, vertices as [x.., y.., z..] and one-based faces as [a.., b.., c..].
//! let x = [-0.5, 0.5, 0.5, -0.5, -0.5, 0.5, 0.5, -0.5];
//! let y = [-0.5, -0.5, 0.5, 0.5, -0.5, -0.5, 0.5, 0.5];
//! let z = [-0.5, -0.5, -0.5, -0.5, 0.5, 0.5, 0.5, 0.5];
//! let tris: [[f64; 3]; 12] = [
//!     [1., 3., 2.], [1., 4., 3.], [5., 6., 7.], [5., 7., 8.],
//!     [1., 2., 6.], [1., 6., 5.], [3., 4., 8.], [3., 8., 7.],
//!     [1., 5., 8.], [1., 8., 4.], [2., 3., 7.], [2., 7., 6.],
//! ];
//! let vertices: Vec<f64> = x.iter().chain(&y).chain(&z).copied().collect();
//! let faces: Vec<f64> = (0..3).flat_map(|c| tris.iter().map(move |t| t[c])).collect();
//!
//! let mut manager = VdbManager::new(ManagerConfig::new(10.0, 0.3, false, true)).unwrap();
//! manager.add_mesh(1, &Pose::identity(), &vertices, &faces).unwrap();
//!
//! let d = manager.distance(&[Point3::new(0.55, 0.0, 0.0)], InterpMethod::Linear);
//! assert!((d[0] - 0.05).abs() < 0.02);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod discretize;
mod error;
mod fusion;
pub mod layout;
mod manager;
mod mesh_adapter;
mod pose;
mod query;
mod registry;
mod serialize;

#[cfg(test)]
mod test_meshes;

pub use config::ManagerConfig;
pub use discretize::discretize_mesh;
pub use error::{ManagerError, ManagerResult, RegistryError, RegistryResult};
pub use fusion::{
    FusionParams, FusionVolume, TriangleMesh, VolumeFusion, create_mesh, extract_surface,
    insert_point_cloud, mean_weight,
};
pub use manager::{ActiveVoxels, DEFAULT_WORLD_LIMITS, VdbManager};
pub use mesh_adapter::MeshAdapter;
pub use pose::{Pose, apply_pose_to_grid, create_local_transform, pose_from_grid, strip_local};
pub use query::{GradientQuery, InterpMethod};
pub use registry::{FlatMesh, FlatVoxels, ManagerHandle, ManagerRegistry};
pub use serialize::{META_FAST_SWEEP, META_FILL_INTERIOR, META_ID, META_RESOLUTION, META_TRUNC_DIST};

// Grid types that appear in this crate's public signatures.
pub use vdb_grid::{Aabb, FloatGrid, Transform};
