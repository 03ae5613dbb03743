//! A stateful cursor that decodes one record at a time from the data
//! file, skipping page headers and tombstones transparently.

use super::{decode_record, Record};
use byteforge_core::{tag, Error, Result};
use crate::column::Column;
use crate::tlv;
use std::io::{Read, Seek, SeekFrom};

/// One decoded record plus the position information needed to tombstone
/// or re-locate it later.
#[derive(Debug, Clone)]
pub struct ParsedRecord {
    /// File offset of the record's leading tag byte.
    pub offset: u64,
    /// Length of the record's payload (excluding the 5-byte header).
    pub payload_len: u32,
    /// `5 + payload_len`: the full on-disk size of this record.
    pub full_size: u64,
    /// Offset of the page header this record lives inside.
    pub page_offset: u64,
    pub record: Record,
}

impl ParsedRecord {
    pub fn id(&self) -> Result<i64> {
        self.record.id()
    }
}

/// Iterates records from the current position of a readable, seekable
/// data-file handle. Not thread-safe: at most one cursor may advance a
/// given handle at a time.
pub struct RecordParser<'a, R> {
    reader: &'a mut R,
    columns: &'a [Column],
    current_page_offset: u64,
}

impl<'a, R: Read + Seek> RecordParser<'a, R> {
    pub fn new(reader: &'a mut R, columns: &'a [Column]) -> Self {
        RecordParser {
            reader,
            columns,
            current_page_offset: 0,
        }
    }

    /// Decodes the next live record, transparently skipping page headers
    /// and tombstoned records. Returns `Ok(None)` at a clean end of
    /// stream (EOF exactly at a tag boundary); any other form of
    /// truncation surfaces as an error.
    pub fn parse(&mut self) -> Result<Option<ParsedRecord>> {
        loop {
            let offset = self.reader.stream_position()?;
            let header = tlv::read_tlv_header(self.reader);
            let (found_tag, len) = match header {
                Ok(h) => h,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            match found_tag {
                tag::PAGE => {
                    // Page header carries no payload of its own beyond the
                    // `used` length field already consumed; records start
                    // immediately after it.
                    self.current_page_offset = offset;
                    continue;
                }
                tag::DELETED_RECORD => {
                    self.reader.seek(SeekFrom::Current(i64::from(len)))?;
                    continue;
                }
                tag::RECORD => {
                    let payload = tlv::read_payload(self.reader, len)?;
                    let record = decode_record(self.columns, &payload)?;
                    return Ok(Some(ParsedRecord {
                        offset,
                        payload_len: len,
                        full_size: 5 + u64::from(len),
                        page_offset: self.current_page_offset,
                        record,
                    }));
                }
                other => {
                    return Err(Error::UnexpectedTag {
                        found: other,
                        context: "record stream",
                    })
                }
            }
        }
    }
}
