//! Error types for the manager and its handle registry.

use thiserror::Error;
use vdb_grid::{GridError, StreamError};

/// Result type alias for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors that can occur while building, querying or (de)serializing a manager.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ManagerError {
    /// Invalid construction parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A flat buffer has the wrong length or contents.
    #[error("invalid buffer: {0}")]
    InvalidBuffer(String),

    /// A face refers to a vertex that does not exist.
    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    FaceIndexOutOfRange {
        /// Zero-based face number.
        face: usize,
        /// The offending one-based index as supplied.
        index: f64,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// Interpolation selector outside `{0, 1, 2}`.
    #[error("unknown interpolation method {0}")]
    InvalidInterpolation(f64),

    /// A serialized manager lacks one of its scalar entries.
    #[error("serialized manager is missing metadata '{0}'")]
    MissingMetadata(String),

    /// A serialized grid is not a float grid.
    #[error("serialized grid '{name}' has type '{type_name}', expected a float grid")]
    UnexpectedGridType {
        /// Grid name.
        name: String,
        /// Stored type name.
        type_name: String,
    },

    /// Grid construction failed.
    #[error("grid error: {0}")]
    Grid(#[from] GridError),

    /// Stream encoding or decoding failed.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),
}

impl ManagerError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates an invalid buffer error.
    #[must_use]
    pub fn invalid_buffer(reason: impl Into<String>) -> Self {
        Self::InvalidBuffer(reason.into())
    }
}

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised by the handle registry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// No manager is registered under this handle.
    #[error("unknown manager handle {0}")]
    UnknownHandle(u64),

    /// One handle was given for both the distance and the weight manager.
    #[error("distance and weight managers must be distinct, both are handle {0}")]
    SharedHandle(u64),

    /// The wrapped manager operation failed.
    #[error(transparent)]
    Manager(#[from] ManagerError),
}
