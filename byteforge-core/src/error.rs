//! Error types shared by every layer of the storage engine.
//!
//! The engine never panics on malformed input or a missing file; every
//! fallible path returns an [`Error`] that the caller can match on. Errors
//! are not retried internally — see the crash-recovery design in
//! `byteforge-storage::wal` for the one place the engine re-drives an
//! operation on its own.

use std::path::PathBuf;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// The closed set of ways an engine operation can fail.
///
/// Each variant corresponds to one of the error kinds called out by the
/// engine design: `NotFound`, `AlreadyExists`, `Validation`, `Format`,
/// `Io`, and `Corruption`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("database not found: {0}")]
    DatabaseNotFound(PathBuf),

    #[error("database already exists: {0}")]
    DatabaseAlreadyExists(PathBuf),

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("no record with id {0}")]
    IdNotFound(i64),

    #[error("cache entry not found")]
    CacheMiss,

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("column {0} is not nullable but no value was given")]
    NullViolation(String),

    #[error("record has {actual} columns, schema declares {expected}")]
    ColumnCountMismatch { expected: usize, actual: usize },

    #[error("column name {0:?} is longer than {max} bytes", max = crate::types::COLUMN_NAME_LEN)]
    ColumnNameTooLong(String),

    #[error("malformed predicate: {0}")]
    MalformedPredicate(String),

    #[error("unsupported type tag: {0}")]
    UnsupportedTag(u8),

    #[error("truncated TLV value: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("unexpected tag {found} at {context}")]
    UnexpectedTag { found: u8, context: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("page corruption: {0}")]
    PageCorruption(String),

    #[error("record corruption: {0}")]
    RecordCorruption(String),

    #[error("WAL corruption: {0}")]
    WalCorruption(String),
}
