//! Mesh discretization into truncated signed distance grids.

use tracing::{debug, info};
use vdb_grid::{
    FloatGrid, INVALID_POLYGON, Int32Grid, MIN_HALF_WIDTH, MeshToVolumeParams, PolygonSource,
    mesh_to_volume,
};

use crate::config::ManagerConfig;
use crate::error::ManagerResult;
use crate::mesh_adapter::MeshAdapter;

/// Converts `mesh` into a distance grid in the mesh adapter's index space.
///
/// The band is `truncation_distance * resolution` voxels on the outside and
/// the same on the inside unless `fill_interior` is set. Outside fast-sweep
/// mode every active voxel is re-measured against the polygon recorded for
/// it during conversion, keeping the original sign.
///
/// Bands thinner than [`MIN_HALF_WIDTH`] voxels still activate a closed shell
/// around the surface; its values are capped at the truncation distance.
///
/// The returned grid carries the adapter's transform; apply a pose afterwards.
///
/// # Errors
///
/// Returns [`ManagerError::Grid`](crate::ManagerError::Grid) if the band
/// widths derived from `config` are not positive.
pub fn discretize_mesh(mesh: &MeshAdapter<'_>, config: &ManagerConfig) -> ManagerResult<FloatGrid> {
    let band = config.band_voxels();
    let mut params = MeshToVolumeParams::new(band);
    if config.fill_interior {
        params = params.fill_interior();
    }
    params = params.with_polygon_index(!config.fast_sweep);

    let volume = mesh_to_volume(mesh, mesh.transform(), &params)?;
    let mut grid = volume.distance;

    if let Some(index_grid) = volume.polygon_index {
        let exterior_cap = grid.background();
        let interior_cap = if config.fill_interior { f32::MAX } else { exterior_cap };
        let caps = (exterior_cap, interior_cap);
        let corrected = correct_with_polygon_index(&mut grid, &index_grid, mesh, caps);
        debug!(corrected, "re-measured voxels against nearest polygon");
    }

    info!(
        polygons = mesh.polygon_count(),
        band_voxels = band,
        fill_interior = config.fill_interior,
        fast_sweep = config.fast_sweep,
        active_voxels = grid.active_voxel_count(),
        "discretized mesh"
    );
    Ok(grid)
}

/// Replaces each active value with the exact distance to its recorded polygon,
/// capped at `(exterior, interior)` magnitudes.
///
/// Only the single recorded polygon is consulted, so a voxel near an edge or
/// vertex shared by several polygons can keep a slightly larger distance than
/// the true minimum.
// TODO: also test the polygons recorded in face-adjacent voxels and keep the minimum.
fn correct_with_polygon_index(
    grid: &mut FloatGrid,
    index_grid: &Int32Grid,
    mesh: &MeshAdapter<'_>,
    (exterior_cap, interior_cap): (f32, f32),
) -> usize {
    let voxel_size = grid.transform().voxel_size().x;
    let mut corrected = 0;
    for (coord, value) in grid.active_values_mut() {
        let polygon = index_grid.value(coord);
        if polygon == INVALID_POLYGON {
            continue;
        }
        let Ok(polygon) = usize::try_from(polygon) else {
            continue;
        };
        let exact = mesh.triangle(polygon).distance(&coord.to_point()) * voxel_size;
        #[allow(clippy::cast_possible_truncation)]
        let magnitude = exact as f32;
        *value = if value.is_sign_negative() {
            -magnitude.min(interior_cap)
        } else {
            magnitude.min(exterior_cap)
        };
        corrected += 1;
    }
    corrected
}
