//! Scalar type model shared by the column schema, the TLV codec, and
//! predicate matching.
//!
//! A table's columns are typed with a closed, non-extensible set of
//! scalars. [`Value`] is the tagged union that a decoded column slot (or a
//! predicate literal) takes at runtime; [`ColumnType`] is the declared,
//! schema-level tag. The two stay in lock-step: `value.column_type()`
//! always matches the column a value was decoded for.

use std::fmt;

/// Fixed width, in bytes, of a serialized column name (zero-padded).
pub const COLUMN_NAME_LEN: usize = 64;

/// Payload capacity of a single page, in bytes.
pub const PAGE_CAPACITY: usize = 128;

/// The five scalar column types the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int64,
    Int32,
    Byte,
    Bool,
    String,
}

impl ColumnType {
    /// Maps a column type to its on-the-wire TLV tag byte.
    pub fn tag(self) -> u8 {
        match self {
            ColumnType::Int64 => crate::tag::INT64,
            ColumnType::Int32 => crate::tag::INT32,
            ColumnType::Byte => crate::tag::BYTE,
            ColumnType::Bool => crate::tag::BOOL,
            ColumnType::String => crate::tag::STRING,
        }
    }

    /// Recovers a column type from its TLV tag byte, if it is one of the
    /// five scalar tags.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            crate::tag::INT64 => Some(ColumnType::Int64),
            crate::tag::INT32 => Some(ColumnType::Int32),
            crate::tag::BYTE => Some(ColumnType::Byte),
            crate::tag::BOOL => Some(ColumnType::Bool),
            crate::tag::STRING => Some(ColumnType::String),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnType::Int64 => "int64",
            ColumnType::Int32 => "int32",
            ColumnType::Byte => "byte",
            ColumnType::Bool => "bool",
            ColumnType::String => "string",
        };
        f.write_str(s)
    }
}

/// A decoded scalar value: either a column's content or a predicate
/// literal. `Null` only ever appears for nullable columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int64(i64),
    Int32(i32),
    Byte(u8),
    Bool(bool),
    String(String),
    Null,
}

impl Value {
    /// The declared column type this value would serialize under, or
    /// `None` for `Null` (a null carries no type tag of its own; its
    /// column's declared type decides how absence is recorded).
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Int64(_) => Some(ColumnType::Int64),
            Value::Int32(_) => Some(ColumnType::Int32),
            Value::Byte(_) => Some(ColumnType::Byte),
            Value::Bool(_) => Some(ColumnType::Bool),
            Value::String(_) => Some(ColumnType::String),
            Value::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extracts the `id` column's value as an `i64`, or `None` if this
    /// value isn't an `Int64` (including `Null`). Every record carries a
    /// non-nullable `id` column, so callers on that path never actually
    /// see `None` in practice, but this is a plain, non-panicking
    /// extraction rather than an assertion.
    pub fn as_id(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int64(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Null => write!(f, "null"),
        }
    }
}
