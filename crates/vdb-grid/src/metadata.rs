//! Typed key/value metadata attached to grids and streams.

use std::collections::BTreeMap;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetaValue {
    /// Boolean flag.
    Bool(bool),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// Single precision float.
    Float(f32),
    /// Double precision float.
    Double(f64),
    /// UTF-8 string.
    String(String),
}

impl MetaValue {
    /// Name used for this value type in a grid stream.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "string",
        }
    }

    /// Returns the value as `f32` if it is numeric.
    ///
    /// # Example
    ///
    /// ```
    /// use vdb_grid::MetaValue;
    ///
    /// assert_eq!(MetaValue::Float(2.5).as_f32(), Some(2.5));
    /// assert_eq!(MetaValue::Int32(7).as_f32(), Some(7.0));
    /// assert_eq!(MetaValue::Bool(true).as_f32(), None);
    /// ```
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Self::Float(v) => Some(v),
            Self::Double(v) => Some(v as f32),
            Self::Int32(v) => Some(v as f32),
            Self::Int64(v) => Some(v as f32),
            Self::Bool(_) | Self::String(_) => None,
        }
    }

    /// Returns the value if it is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }
}

/// Ordered metadata map; keys are written in sorted order.
pub type MetaMap = BTreeMap<String, MetaValue>;
