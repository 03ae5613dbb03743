//! Single-table storage engine.
//!
//! Layers, leaves first: [`tlv`] (the wire format), [`column`] (schema
//! header), [`index`] (primary-key index), [`page`] (slotted data file),
//! [`record`] (schema-aware encode/decode and the streaming parser),
//! [`cache`] (the LRU page cache), [`wal`] (crash recovery), and
//! [`predicate`] (the query surface). [`table`] binds all of these
//! behind insert / select / update / delete; [`database`] opens and
//! creates tables inside a directory.

pub mod cache;
pub mod column;
pub mod database;
pub mod fsperm;
pub mod index;
pub mod inverted;
pub mod page;
pub mod predicate;
pub mod record;
pub mod table;
pub mod tlv;
pub mod wal;

pub use byteforge_core::{Error, Result};
pub use column::Column;
pub use database::Database;
pub use predicate::Predicate;
pub use record::Record;
pub use table::{SelectResult, Table};
