//! Construction parameters for a [`VdbManager`](crate::VdbManager).

use crate::error::{ManagerError, ManagerResult};

/// Immutable settings of a manager.
///
/// Numeric values are kept in single precision, the width at which they
/// are persisted.
///
/// # Example
///
/// ```
/// use vdb_manager::ManagerConfig;
///
/// let config = ManagerConfig::default().with_resolution(20.0).with_fill_interior(true);
/// assert!(config.validate().is_ok());
/// assert!((config.voxel_size() - 0.05).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ManagerConfig {
    /// Voxels per meter.
    pub resolution: f32,

    /// Half-width of the truncation band, in meters.
    pub truncation_distance: f32,

    /// Whether closed meshes are filled with untruncated interior distances.
    pub fill_interior: bool,

    /// Skips the nearest-polygon correction after discretization.
    pub fast_sweep: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            resolution: 10.0,
            truncation_distance: 0.3,
            fill_interior: false,
            fast_sweep: false,
        }
    }
}

impl ManagerConfig {
    /// Creates a config from double precision inputs.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // stored at persisted width
    pub const fn new(
        resolution: f64,
        truncation_distance: f64,
        fill_interior: bool,
        fast_sweep: bool,
    ) -> Self {
        Self {
            resolution: resolution as f32,
            truncation_distance: truncation_distance as f32,
            fill_interior,
            fast_sweep,
        }
    }

    /// Set the resolution in voxels per meter.
    #[must_use]
    pub const fn with_resolution(mut self, resolution: f32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the truncation distance in meters.
    #[must_use]
    pub const fn with_truncation_distance(mut self, distance: f32) -> Self {
        self.truncation_distance = distance;
        self
    }

    /// Set whether mesh interiors are filled.
    #[must_use]
    pub const fn with_fill_interior(mut self, fill: bool) -> Self {
        self.fill_interior = fill;
        self
    }

    /// Set whether discretization skips the polygon correction.
    #[must_use]
    pub const fn with_fast_sweep(mut self, fast: bool) -> Self {
        self.fast_sweep = fast;
        self
    }

    /// Edge length of one voxel in meters.
    #[must_use]
    pub fn voxel_size(&self) -> f64 {
        1.0 / f64::from(self.resolution)
    }

    /// Truncation half-width in voxels.
    #[must_use]
    pub fn band_voxels(&self) -> f32 {
        self.truncation_distance * self.resolution
    }

    /// Checks that both numeric settings are positive and finite.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> ManagerResult<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(ManagerError::invalid_config(format!(
                "resolution must be positive and finite, got {}",
                self.resolution
            )));
        }
        if !(self.truncation_distance.is_finite() && self.truncation_distance > 0.0) {
            return Err(ManagerError::invalid_config(format!(
                "truncation distance must be positive and finite, got {}",
                self.truncation_distance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ManagerConfig::default();
        assert_eq!(config.resolution, 10.0);
        assert!((config.truncation_distance - 0.3).abs() < f32::EPSILON);
        assert!(!config.fill_interior);
        assert!(!config.fast_sweep);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_band_in_voxels() {
        let config = ManagerConfig::new(10.0, 0.3, false, true);
        assert!((config.band_voxels() - 3.0).abs() < 1e-5);
        assert!(config.fast_sweep);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ManagerConfig::default().with_resolution(0.0).validate().is_err());
        assert!(ManagerConfig::default().with_resolution(f32::NAN).validate().is_err());
        assert!(
            ManagerConfig::default()
                .with_truncation_distance(-0.1)
                .validate()
                .is_err()
        );
        assert!(
            ManagerConfig::default()
                .with_truncation_distance(f32::INFINITY)
                .validate()
                .is_err()
        );
    }
}
