//! Error types for grid construction and stream I/O.

/// Errors raised while building or transforming grids.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GridError {
    /// The voxel size must be positive and finite.
    #[error("voxel size must be positive and finite, got {0}")]
    InvalidVoxelSize(f64),

    /// The index-to-world matrix has a non-affine bottom row.
    #[error("transform matrix is not affine")]
    NotAffine,

    /// The index-to-world matrix cannot be inverted.
    #[error("transform matrix is singular or non-finite")]
    SingularTransform,

    /// Narrow band half-widths must be positive.
    #[error("invalid band widths: exterior {exterior}, interior {interior}")]
    InvalidBandWidth {
        /// Exterior half-width in voxels.
        exterior: f32,
        /// Interior half-width in voxels.
        interior: f32,
    },
}

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised while reading or writing a grid stream.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StreamError {
    /// Underlying I/O failure, including truncated input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream does not start with the expected magic bytes.
    #[error("not a grid stream (magic {0:02x?})")]
    BadMagic([u8; 4]),

    /// The stream was written by an unknown format version.
    #[error("unsupported stream version {0}")]
    UnsupportedVersion(u32),

    /// A grid's value type is not registered.
    #[error("unknown grid type '{0}'")]
    UnknownGridType(String),

    /// A metadata entry has an unknown type name.
    #[error("unknown metadata type '{0}'")]
    UnknownMetadataType(String),

    /// A string field is not valid UTF-8.
    #[error("invalid UTF-8 in stream")]
    InvalidUtf8,

    /// A stored transform is unusable.
    #[error("invalid grid transform: {0}")]
    Transform(#[from] GridError),

    /// A count or length does not fit the on-disk representation.
    #[error("length {0} exceeds stream limits")]
    LengthOverflow(usize),
}

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;
