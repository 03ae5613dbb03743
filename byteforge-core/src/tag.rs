//! The closed set of TLV type tags.
//!
//! Every value the engine ever writes to disk — scalar or structural —
//! opens with one of these bytes. The assignment below is arbitrary (the
//! design only requires internal consistency) but, once chosen, must
//! never change: it is baked into every file this engine has ever
//! written.

/// Signed 64-bit integer, little-endian, always 8 payload bytes.
pub const INT64: u8 = 1;
/// UTF-8 string, payload length equals the byte count.
pub const STRING: u8 = 2;
/// Single unsigned byte.
pub const BYTE: u8 = 3;
/// Boolean, one payload byte (`0` or `1`).
pub const BOOL: u8 = 4;
/// Signed 32-bit integer, little-endian, always 4 payload bytes.
pub const INT32: u8 = 5;

/// A write-ahead log entry.
pub const WAL_ENTRY: u8 = 20;
/// The last-commit pointer.
pub const WAL_LAST_COMMIT: u8 = 21;

/// A column definition record.
pub const COLUMN_DEFINITION: u8 = 99;
/// A live record.
pub const RECORD: u8 = 100;
/// A tombstoned record (bitwise identical length to the record it replaced).
pub const DELETED_RECORD: u8 = 101;

/// An ordered container of item TLVs.
pub const LIST: u8 = 230;
/// A string-keyed map of TLVs.
pub const MAP: u8 = 220;
/// A map entry's key TLV (always the string variant).
pub const MAP_KEY: u8 = 221;
/// A map entry's value TLV.
pub const MAP_VALUE: u8 = 222;

/// The persisted primary-key index.
pub const INDEX: u8 = 240;
/// One `(id, page-offset)` entry inside a persisted index.
pub const INDEX_ITEM: u8 = 241;

/// A page header tag, opening a fixed-capacity region of the data file.
pub const PAGE: u8 = 255;
