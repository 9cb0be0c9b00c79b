//! Column-blocked buffers used by the flat API.
//!
//! `K` items of `D` components travel as one slice of `K * D` values laid out
//! as `D` contiguous blocks of `K`: all x, then all y, then all z.

use nalgebra::{Point3, Vector3};

use crate::error::{ManagerError, ManagerResult};

/// Reads points from an `[x.., y.., z..]` buffer.
///
/// # Errors
///
/// Returns [`ManagerError::InvalidBuffer`] if the length is not a multiple of 3.
///
/// # Example
///
/// ```
/// use vdb_manager::layout::points_from_columns;
/// use nalgebra::Point3;
///
/// let points = points_from_columns(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(points, vec![Point3::new(1.0, 3.0, 5.0), Point3::new(2.0, 4.0, 6.0)]);
/// ```
pub fn points_from_columns(data: &[f64]) -> ManagerResult<Vec<Point3<f64>>> {
    if data.len() % 3 != 0 {
        return Err(ManagerError::invalid_buffer(format!(
            "point buffer length {} is not a multiple of 3",
            data.len()
        )));
    }
    let n = data.len() / 3;
    Ok((0..n)
        .map(|i| Point3::new(data[i], data[i + n], data[i + 2 * n]))
        .collect())
}

/// Reads a single point from exactly three values.
///
/// # Errors
///
/// Returns [`ManagerError::InvalidBuffer`] unless `data` has length 3.
pub fn point_from_slice(data: &[f64]) -> ManagerResult<Point3<f64>> {
    match *data {
        [x, y, z] => Ok(Point3::new(x, y, z)),
        _ => Err(ManagerError::invalid_buffer(format!(
            "expected 3 coordinates, got {}",
            data.len()
        ))),
    }
}

/// Writes points as `[x.., y.., z..]`.
#[must_use]
pub fn points_to_columns(points: &[Point3<f64>]) -> Vec<f64> {
    let mut out = Vec::with_capacity(points.len() * 3);
    for axis in 0..3 {
        out.extend(points.iter().map(|p| p[axis]));
    }
    out
}

/// Writes vectors as `[x.., y.., z..]`.
#[must_use]
pub fn vectors_to_columns(vectors: &[Vector3<f64>]) -> Vec<f64> {
    let mut out = Vec::with_capacity(vectors.len() * 3);
    for axis in 0..3 {
        out.extend(vectors.iter().map(|v| v[axis]));
    }
    out
}

/// Writes zero-based triangles as one-based `[a.., b.., c..]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn triangles_to_columns(triangles: &[[usize; 3]]) -> Vec<f64> {
    let mut out = Vec::with_capacity(triangles.len() * 3);
    for corner in 0..3 {
        out.extend(triangles.iter().map(|t| (t[corner] + 1) as f64));
    }
    out
}

/// Converts an ID carried as a double by truncation.
///
/// Negative and NaN values map to 0, matching a saturating cast.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub const fn id_from_f64(value: f64) -> u64 {
    value as u64
}

/// Converts a count or ID to the double used by the flat API.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub const fn to_f64(value: usize) -> f64 {
    value as f64
}
