//! Binary (de)serialization of a manager.
//!
//! A blob is a single grid stream. Its metadata carries the four manager
//! settings; each grid carries its manager ID as an `"ID"` float. Cached
//! totals and limits are never stored and are rebuilt on load.

use tracing::info;
use vdb_grid::{AnyGrid, GridRef, MetaMap, MetaValue, read_stream, write_stream};

use crate::config::ManagerConfig;
use crate::error::{ManagerError, ManagerResult};
use crate::manager::VdbManager;

/// Metadata key for the resolution.
pub const META_RESOLUTION: &str = "m_resolution";
/// Metadata key for the truncation distance.
pub const META_TRUNC_DIST: &str = "m_truncDist";
/// Metadata key for the interior fill flag.
pub const META_FILL_INTERIOR: &str = "m_fillInterior";
/// Metadata key for the fast-sweep flag.
pub const META_FAST_SWEEP: &str = "m_fastSweep";
/// Per-grid metadata key for the manager ID.
pub const META_ID: &str = "ID";

impl VdbManager {
    /// Encodes the settings and every grid.
    ///
    /// IDs are stored as single precision floats, so IDs above 2^24 do not
    /// survive a round trip exactly.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Stream`] if encoding fails.
    pub fn serialize(&self) -> ManagerResult<Vec<u8>> {
        let config = self.config();
        let mut metadata = MetaMap::new();
        metadata.insert(META_RESOLUTION.into(), MetaValue::Float(config.resolution));
        metadata.insert(META_TRUNC_DIST.into(), MetaValue::Float(config.truncation_distance));
        metadata.insert(META_FILL_INTERIOR.into(), MetaValue::Bool(config.fill_interior));
        metadata.insert(META_FAST_SWEEP.into(), MetaValue::Bool(config.fast_sweep));

        let tagged: Vec<_> = self
            .iter()
            .map(|(id, grid)| {
                let mut grid = grid.clone();
                #[allow(clippy::cast_precision_loss)]
                grid.insert_meta(META_ID, MetaValue::Float(id as f32));
                grid
            })
            .collect();
        let refs: Vec<GridRef<'_>> = tagged.iter().map(GridRef::from).collect();

        let mut bytes = Vec::new();
        write_stream(&mut bytes, &metadata, &refs)?;
        info!(grids = refs.len(), bytes = bytes.len(), "serialized manager");
        Ok(bytes)
    }

    /// Number of bytes [`serialize`](Self::serialize) produces.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Stream`] if encoding fails.
    pub fn serialize_size(&self) -> ManagerResult<usize> {
        self.serialize().map(|bytes| bytes.len())
    }

    /// Rebuilds a manager from [`serialize`](Self::serialize) output.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Stream`] for undecodable input,
    /// [`ManagerError::MissingMetadata`] when a setting or a grid ID is absent
    /// and [`ManagerError::UnexpectedGridType`] for non-float grids.
    pub fn deserialize(bytes: &[u8]) -> ManagerResult<Self> {
        let stream = read_stream(bytes)?;

        let config = ManagerConfig {
            resolution: float_meta(&stream.metadata, META_RESOLUTION)?,
            truncation_distance: float_meta(&stream.metadata, META_TRUNC_DIST)?,
            fill_interior: bool_meta(&stream.metadata, META_FILL_INTERIOR)?,
            fast_sweep: bool_meta(&stream.metadata, META_FAST_SWEEP)?,
        };
        let mut manager = Self::new(config)?;

        for any in stream.grids {
            let grid = match any {
                AnyGrid::Float(grid) => grid,
                other => {
                    return Err(ManagerError::UnexpectedGridType {
                        name: other.name().to_owned(),
                        type_name: other.type_name().to_owned(),
                    });
                }
            };
            let id = float_meta(grid.metadata(), META_ID)?;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let id = id as u64;
            manager.insert_grid(id, grid);
        }

        manager.tally_active_voxel();
        manager.recompute_limits();
        info!(
            grids = manager.grid_count(),
            active_voxels = manager.active_voxel_count(),
            "deserialized manager"
        );
        Ok(manager)
    }
}

fn float_meta(metadata: &MetaMap, key: &str) -> ManagerResult<f32> {
    metadata
        .get(key)
        .and_then(MetaValue::as_f32)
        .ok_or_else(|| ManagerError::MissingMetadata(key.to_owned()))
}

fn bool_meta(metadata: &MetaMap, key: &str) -> ManagerResult<bool> {
    metadata
        .get(key)
        .and_then(MetaValue::as_bool)
        .ok_or_else(|| ManagerError::MissingMetadata(key.to_owned()))
}
