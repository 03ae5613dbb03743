//! Slotted pages: fixed-capacity regions of the data file that hold
//! records packed back-to-back with no per-page slot directory.

mod data_file;

pub use data_file::PagedDataFile;

use byteforge_core::tag;

/// Bytes in a page header: one tag byte, one 4-byte little-endian length.
pub const PAGE_HEADER_LEN: u64 = 5;

/// Encodes a page header with the given `used` byte count. The header's
/// "length" field doubles as the page's used-bytes accounting rather than
/// a literal TLV payload length — the bytes that follow are independent
/// record/tombstone TLVs, not a single nested value.
pub fn encode_page_header(used: u32) -> [u8; 5] {
    let mut header = [0u8; 5];
    header[0] = tag::PAGE;
    header[1..5].copy_from_slice(&used.to_le_bytes());
    header
}
