//! Shared vocabulary for the ByteForge storage engine: the error type every
//! layer returns, the TLV tag assignment every layer agrees on, and the
//! scalar value model every layer moves records around in.
//!
//! This crate is intentionally thin. It has no notion of files, pages, or
//! tables — that is all in `byteforge-storage`. Keeping the vocabulary
//! separate lets both the storage crate and (eventually) a client crate
//! depend on a stable, dependency-light core.

pub mod error;
pub mod tag;
pub mod types;

pub use error::{Error, Result};
pub use types::{ColumnType, Value, COLUMN_NAME_LEN, PAGE_CAPACITY};
