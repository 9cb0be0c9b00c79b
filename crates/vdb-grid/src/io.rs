//! Binary stream format for grids and their metadata.
//!
//! # Layout
//!
//! All integers and floats are little-endian.
//!
//! ```text
//! UINT8[4]    : Magic "VDBS"
//! UINT32      : Format version
//! METAMAP     : Stream metadata
//! UINT32      : Number of grids
//! foreach grid
//!     STRING     : Grid type name (must be registered)
//!     STRING     : Grid name
//!     METAMAP    : Grid metadata
//!     REAL64[16] : Index-to-world matrix, column-major
//!     VALUE      : Background
//!     UINT64     : Active voxel count, then (INT32[3], VALUE) per voxel
//!     UINT64     : Inactive voxel count, then (INT32[3], VALUE) per voxel
//!     UINT64     : Tile count, then (INT32[3], VALUE) per tile origin
//! end
//!
//! STRING      : UINT32 byte length + UTF-8 bytes
//! METAMAP     : UINT32 entry count, then (STRING key, STRING type, payload)
//! VALUE       : 4 bytes of the grid's value type
//! ```
//!
//! Voxels are written in coordinate order, so equal grids always encode
//! to identical bytes.

use std::io::{Read, Write};

use nalgebra::Matrix4;

use crate::error::{StreamError, StreamResult};
use crate::grid::{FloatGrid, GridValue, Int32Grid, SparseGrid};
use crate::metadata::{MetaMap, MetaValue};
use crate::registry::initialize;
use crate::transform::Transform;
use crate::voxel::VoxelCoord;

/// Stream magic bytes.
pub const MAGIC: [u8; 4] = *b"VDBS";

/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

// Upper bound on speculative allocation from untrusted counts.
const MAX_PREALLOC: usize = 1 << 16;

/// A borrowed grid of any registered value type.
#[derive(Debug, Clone, Copy)]
pub enum GridRef<'a> {
    /// A float grid.
    Float(&'a FloatGrid),
    /// An int32 grid.
    Int32(&'a Int32Grid),
}

impl<'a> From<&'a FloatGrid> for GridRef<'a> {
    fn from(grid: &'a FloatGrid) -> Self {
        Self::Float(grid)
    }
}

impl<'a> From<&'a Int32Grid> for GridRef<'a> {
    fn from(grid: &'a Int32Grid) -> Self {
        Self::Int32(grid)
    }
}

/// An owned grid of any registered value type.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyGrid {
    /// A float grid.
    Float(FloatGrid),
    /// An int32 grid.
    Int32(Int32Grid),
}

impl AnyGrid {
    /// Registered type name of the grid's values.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Float(_) => <f32 as GridValue>::TYPE_NAME,
            Self::Int32(_) => <i32 as GridValue>::TYPE_NAME,
        }
    }

    /// Grid name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Float(g) => g.name(),
            Self::Int32(g) => g.name(),
        }
    }

    /// Grid metadata.
    #[must_use]
    pub const fn metadata(&self) -> &MetaMap {
        match self {
            Self::Float(g) => g.metadata(),
            Self::Int32(g) => g.metadata(),
        }
    }

    /// Returns the float grid, or `None` for other types.
    #[must_use]
    pub fn into_float(self) -> Option<FloatGrid> {
        match self {
            Self::Float(g) => Some(g),
            Self::Int32(_) => None,
        }
    }
}

/// Decoded contents of a stream.
#[derive(Debug, Clone, Default)]
pub struct GridStream {
    /// Stream-level metadata.
    pub metadata: MetaMap,
    /// Grids in stream order.
    pub grids: Vec<AnyGrid>,
}

/// Writes metadata and grids to `writer`.
///
/// # Errors
///
/// Returns [`StreamError::Io`] on write failure or
/// [`StreamError::LengthOverflow`] if a count exceeds the format's limits.
///
/// # Example
///
/// ```
/// use vdb_grid::{read_stream, write_stream, FloatGrid, GridRef, MetaMap, MetaValue, VoxelCoord};
///
/// let mut grid = FloatGrid::new(0.5);
/// grid.set_value(VoxelCoord::new(1, 2, 3), -0.25);
/// let mut meta = MetaMap::new();
/// meta.insert("scale".into(), MetaValue::Float(2.0));
///
/// let mut bytes = Vec::new();
/// write_stream(&mut bytes, &meta, &[GridRef::from(&grid)]).unwrap();
/// let stream = read_stream(bytes.as_slice()).unwrap();
/// assert_eq!(stream.metadata, meta);
/// assert_eq!(stream.grids[0].clone().into_float().unwrap(), grid);
/// ```
pub fn write_stream<W: Write>(
    mut writer: W,
    metadata: &MetaMap,
    grids: &[GridRef<'_>],
) -> StreamResult<()> {
    initialize();
    writer.write_all(&MAGIC)?;
    writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
    write_metadata(&mut writer, metadata)?;
    write_len32(&mut writer, grids.len())?;
    for grid in grids {
        match grid {
            GridRef::Float(g) => write_grid(&mut writer, g)?,
            GridRef::Int32(g) => write_grid(&mut writer, g)?,
        }
    }
    writer.flush()?;
    Ok(())
}

/// Reads a stream written by [`write_stream`].
///
/// # Errors
///
/// Returns [`StreamError::BadMagic`] or [`StreamError::UnsupportedVersion`]
/// for foreign input, [`StreamError::UnknownGridType`] for unregistered grid
/// types, and [`StreamError::Io`] when the input ends early.
pub fn read_stream<R: Read>(mut reader: R) -> StreamResult<GridStream> {
    let registry = initialize();

    let magic: [u8; 4] = read_array(&mut reader)?;
    if magic != MAGIC {
        return Err(StreamError::BadMagic(magic));
    }
    let version = u32::from_le_bytes(read_array(&mut reader)?);
    if version != FORMAT_VERSION {
        return Err(StreamError::UnsupportedVersion(version));
    }

    let metadata = read_metadata(&mut reader)?;
    let count = read_u32_len(&mut reader)?;
    let mut grids = Vec::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        let type_name = read_string(&mut reader)?;
        if !registry.is_registered(&type_name) {
            return Err(StreamError::UnknownGridType(type_name));
        }
        let grid = if type_name == <f32 as GridValue>::TYPE_NAME {
            AnyGrid::Float(read_grid(&mut reader)?)
        } else if type_name == <i32 as GridValue>::TYPE_NAME {
            AnyGrid::Int32(read_grid(&mut reader)?)
        } else {
            return Err(StreamError::UnknownGridType(type_name));
        };
        grids.push(grid);
    }

    Ok(GridStream { metadata, grids })
}

fn write_grid<W: Write, T: GridValue>(writer: &mut W, grid: &SparseGrid<T>) -> StreamResult<()> {
    write_string(writer, T::TYPE_NAME)?;
    write_string(writer, grid.name())?;
    write_metadata(writer, grid.metadata())?;
    for v in grid.transform().matrix().iter() {
        writer.write_all(&v.to_le_bytes())?;
    }
    writer.write_all(&grid.background().to_le_bytes())?;
    for entries in [grid.sorted_active(), grid.sorted_inactive(), grid.sorted_tiles()] {
        write_len64(writer, entries.len())?;
        for (coord, value) in entries {
            for c in coord.as_array() {
                writer.write_all(&c.to_le_bytes())?;
            }
            writer.write_all(&value.to_le_bytes())?;
        }
    }
    Ok(())
}

fn read_grid<R: Read, T: GridValue>(reader: &mut R) -> StreamResult<SparseGrid<T>> {
    let name = read_string(reader)?;
    let metadata = read_metadata(reader)?;
    let mut matrix = [0.0f64; 16];
    for slot in &mut matrix {
        *slot = f64::from_le_bytes(read_array(reader)?);
    }
    let transform = Transform::from_matrix(Matrix4::from_column_slice(&matrix))?;
    let background = T::from_le_bytes(read_array(reader)?);

    let mut grid = SparseGrid::with_transform(background, transform);
    grid.set_name(name);
    for (key, value) in metadata {
        grid.insert_meta(key, value);
    }

    for _ in 0..read_u64_len(reader)? {
        let (c, v) = read_entry(reader)?;
        grid.set_value(c, v);
    }
    for _ in 0..read_u64_len(reader)? {
        let (c, v) = read_entry(reader)?;
        grid.set_inactive_value(c, v);
    }
    for _ in 0..read_u64_len(reader)? {
        let (c, v) = read_entry(reader)?;
        grid.set_tile(c, v);
    }
    Ok(grid)
}

fn read_entry<R: Read, T: GridValue>(reader: &mut R) -> StreamResult<(VoxelCoord, T)> {
    let x = i32::from_le_bytes(read_array(reader)?);
    let y = i32::from_le_bytes(read_array(reader)?);
    let z = i32::from_le_bytes(read_array(reader)?);
    Ok((VoxelCoord::new(x, y, z), T::from_le_bytes(read_array(reader)?)))
}

fn write_metadata<W: Write>(writer: &mut W, metadata: &MetaMap) -> StreamResult<()> {
    write_len32(writer, metadata.len())?;
    for (key, value) in metadata {
        write_string(writer, key)?;
        write_string(writer, value.type_name())?;
        match value {
            MetaValue::Bool(v) => writer.write_all(&[u8::from(*v)])?,
            MetaValue::Int32(v) => writer.write_all(&v.to_le_bytes())?,
            MetaValue::Int64(v) => writer.write_all(&v.to_le_bytes())?,
            MetaValue::Float(v) => writer.write_all(&v.to_le_bytes())?,
            MetaValue::Double(v) => writer.write_all(&v.to_le_bytes())?,
            MetaValue::String(v) => write_string(writer, v)?,
        }
    }
    Ok(())
}

fn read_metadata<R: Read>(reader: &mut R) -> StreamResult<MetaMap> {
    let count = read_u32_len(reader)?;
    let mut metadata = MetaMap::new();
    for _ in 0..count {
        let key = read_string(reader)?;
        let type_name = read_string(reader)?;
        let value = match type_name.as_str() {
            "bool" => MetaValue::Bool(read_array::<_, 1>(reader)?[0] != 0),
            "int32" => MetaValue::Int32(i32::from_le_bytes(read_array(reader)?)),
            "int64" => MetaValue::Int64(i64::from_le_bytes(read_array(reader)?)),
            "float" => MetaValue::Float(f32::from_le_bytes(read_array(reader)?)),
            "double" => MetaValue::Double(f64::from_le_bytes(read_array(reader)?)),
            "string" => MetaValue::String(read_string(reader)?),
            _ => return Err(StreamError::UnknownMetadataType(type_name)),
        };
        metadata.insert(key, value);
    }
    Ok(metadata)
}

fn write_string<W: Write>(writer: &mut W, s: &str) -> StreamResult<()> {
    write_len32(writer, s.len())?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

fn read_string<R: Read>(reader: &mut R) -> StreamResult<String> {
    let len = u32::from_le_bytes(read_array(reader)?);
    let mut bytes = Vec::new();
    reader.take(u64::from(len)).read_to_end(&mut bytes)?;
    if bytes.len() != len as usize {
        return Err(StreamError::Io(std::io::ErrorKind::UnexpectedEof.into()));
    }
    String::from_utf8(bytes).map_err(|_| StreamError::InvalidUtf8)
}

fn write_len32<W: Write>(writer: &mut W, len: usize) -> StreamResult<()> {
    let len32 = u32::try_from(len).map_err(|_| StreamError::LengthOverflow(len))?;
    writer.write_all(&len32.to_le_bytes())?;
    Ok(())
}

fn write_len64<W: Write>(writer: &mut W, len: usize) -> StreamResult<()> {
    let len64 = u64::try_from(len).map_err(|_| StreamError::LengthOverflow(len))?;
    writer.write_all(&len64.to_le_bytes())?;
    Ok(())
}

fn read_u32_len<R: Read>(reader: &mut R) -> StreamResult<usize> {
    let len = u32::from_le_bytes(read_array(reader)?);
    usize::try_from(len).map_err(|_| StreamError::LengthOverflow(usize::MAX))
}

fn read_u64_len<R: Read>(reader: &mut R) -> StreamResult<u64> {
    Ok(u64::from_le_bytes(read_array(reader)?))
}

fn read_array<R: Read, const N: usize>(reader: &mut R) -> StreamResult<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
