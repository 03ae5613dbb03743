//! The paged region of a table's data file: everything after the column
//! schema header.

use super::{encode_page_header, PAGE_HEADER_LEN};
use byteforge_core::{tag, Error, Result, PAGE_CAPACITY};
use crate::tlv;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

/// Owns the data file handle and knows where the paged region begins
/// (right after the column schema header). Implements the page-level
/// operations the table orchestrator composes: first-fit allocation,
/// in-place tombstoning, and explicit empty-page collapse.
pub struct PagedDataFile {
    file: File,
    pages_start: u64,
}

impl PagedDataFile {
    pub fn new(file: File, pages_start: u64) -> Self {
        PagedDataFile { file, pages_start }
    }

    pub fn pages_start(&self) -> u64 {
        self.pages_start
    }

    /// Gives full-scan callers (the record parser, on `select({})`)
    /// direct access to the underlying handle.
    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    fn page_header_at(&mut self, offset: u64) -> Result<(u8, u32)> {
        self.file.seek(SeekFrom::Start(offset))?;
        let (found_tag, used) = tlv::read_tlv_header(&mut self.file)?;
        if found_tag != tag::PAGE {
            return Err(Error::PageCorruption(format!(
                "expected page tag at offset {offset}, found {found_tag}"
            )));
        }
        Ok((found_tag, used))
    }

    /// Scans pages from the first page forward and returns the offset of
    /// the first page with at least `need` bytes of spare capacity. If
    /// none fits, appends a fresh empty page at EOF and returns its
    /// offset. The scan never backtracks past a page that didn't fit.
    pub fn find_or_create_page(&mut self, need: usize) -> Result<u64> {
        let entry_pos = self.file.stream_position()?;
        let result = self.find_or_create_page_inner(need);
        self.file.seek(SeekFrom::Start(entry_pos))?;
        result
    }

    fn find_or_create_page_inner(&mut self, need: usize) -> Result<u64> {
        let end = self.file.seek(SeekFrom::End(0))?;
        let mut offset = self.pages_start;
        while offset < end {
            let (_, used) = self.page_header_at(offset)?;
            if PAGE_CAPACITY - used as usize >= need {
                return Ok(offset);
            }
            offset += PAGE_HEADER_LEN + u64::from(used);
        }
        self.file.seek(SeekFrom::Start(end))?;
        self.file.write_all(&encode_page_header(0))?;
        Ok(end)
    }

    /// Appends `bytes` to the tail of the page at `page_offset` and
    /// updates its `used` field. Callers must already have verified the
    /// page has enough spare capacity (via [`Self::find_or_create_page`]).
    pub fn write_record(&mut self, page_offset: u64, bytes: &[u8]) -> Result<()> {
        let (_, used) = self.page_header_at(page_offset)?;
        let new_used = used as usize + bytes.len();
        if new_used > PAGE_CAPACITY {
            return Err(Error::PageCorruption(format!(
                "write of {} bytes would overflow page capacity ({}/{})",
                bytes.len(),
                new_used,
                PAGE_CAPACITY
            )));
        }
        let tail = page_offset + PAGE_HEADER_LEN + u64::from(used);
        self.file.seek(SeekFrom::Start(tail))?;
        self.file.write_all(bytes)?;

        self.file.seek(SeekFrom::Start(page_offset + 1))?;
        self.file.write_all(&(new_used as u32).to_le_bytes())?;
        self.file.flush()?;
        Ok(())
    }

    /// Overwrites the record at `record_offset` (its leading tag byte,
    /// exactly) with the tombstone tag and zeros its `payload_len`
    /// payload bytes. The page's `used` field is left unchanged — see the
    /// engine's page-length-on-delete policy.
    pub fn tombstone(&mut self, record_offset: u64, payload_len: u32) -> Result<()> {
        self.file.seek(SeekFrom::Start(record_offset))?;
        self.file.write_all(&[tag::DELETED_RECORD])?;
        self.file.seek(SeekFrom::Start(record_offset + PAGE_HEADER_LEN))?;
        let zeros = vec![0u8; payload_len as usize];
        self.file.write_all(&zeros)?;
        self.file.flush()?;
        Ok(())
    }

    /// Splices an empty page out of the file: copies every byte after the
    /// page's header into the page's position and truncates the file by
    /// the header's length. Fails if the page is not actually empty.
    pub fn collapse_empty_page(&mut self, page_offset: u64) -> Result<()> {
        let (_, used) = self.page_header_at(page_offset)?;
        if used != 0 {
            return Err(Error::PageCorruption(format!(
                "collapse requested on non-empty page at {page_offset} ({used} bytes used)"
            )));
        }
        let end = self.file.seek(SeekFrom::End(0))?;
        let mut tail = Vec::with_capacity((end - page_offset - PAGE_HEADER_LEN) as usize);
        self.file.seek(SeekFrom::Start(page_offset + PAGE_HEADER_LEN))?;
        self.file.read_to_end(&mut tail)?;

        self.file.seek(SeekFrom::Start(page_offset))?;
        self.file.write_all(&tail)?;
        self.file.set_len(end - PAGE_HEADER_LEN)?;
        self.file.flush()?;
        Ok(())
    }

    /// Reads a page's full on-disk bytes (header and payload). This is
    /// exactly the shape the page cache stores, so a cached buffer can be
    /// handed straight to a [`crate::record::RecordParser`] over a
    /// `Cursor`.
    pub fn read_page(&mut self, page_offset: u64) -> Result<Vec<u8>> {
        let (_, used) = self.page_header_at(page_offset)?;
        self.file.seek(SeekFrom::Start(page_offset))?;
        let mut buf = vec![0u8; PAGE_HEADER_LEN as usize + used as usize];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn used(&mut self, page_offset: u64) -> Result<u32> {
        Ok(self.page_header_at(page_offset)?.1)
    }

    /// Flushes any OS-buffered writes to disk. Called on table close.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempfile;

    fn new_file() -> PagedDataFile {
        let file = tempfile().unwrap();
        PagedDataFile::new(file, 0)
    }

    #[test]
    fn first_insert_creates_a_page() {
        let mut pf = new_file();
        let offset = pf.find_or_create_page(10).unwrap();
        assert_eq!(offset, 0);
        assert_eq!(pf.used(0).unwrap(), 0);
    }

    #[test]
    fn write_record_updates_used_and_tail() {
        let mut pf = new_file();
        let offset = pf.find_or_create_page(4).unwrap();
        pf.write_record(offset, b"data").unwrap();
        assert_eq!(pf.used(offset).unwrap(), 4);
    }

    #[test]
    fn page_never_exceeds_capacity() {
        let mut pf = new_file();
        let offset = pf.find_or_create_page(PAGE_CAPACITY).unwrap();
        let bytes = vec![1u8; PAGE_CAPACITY + 1];
        assert!(pf.write_record(offset, &bytes).is_err());
    }

    #[test]
    fn full_page_forces_a_new_page() {
        let mut pf = new_file();
        let first = pf.find_or_create_page(PAGE_CAPACITY).unwrap();
        pf.write_record(first, &vec![1u8; PAGE_CAPACITY]).unwrap();
        let second = pf.find_or_create_page(1).unwrap();
        assert_ne!(first, second);
        assert_eq!(second, first + PAGE_HEADER_LEN + PAGE_CAPACITY as u64);
    }

    #[test]
    fn tombstone_preserves_length_and_zeros_payload() {
        let mut pf = new_file();
        let offset = pf.find_or_create_page(4).unwrap();
        pf.write_record(offset, b"data").unwrap();
        let record_offset = offset + PAGE_HEADER_LEN;
        pf.tombstone(record_offset, 4).unwrap();
        assert_eq!(pf.used(offset).unwrap(), 4); // unchanged per the delete policy

        let page = pf.read_page(offset).unwrap();
        assert_eq!(page[5], tag::DELETED_RECORD);
        assert_eq!(&page[6..10], &[0, 0, 0, 0]);
    }

    #[test]
    fn collapse_removes_empty_page() {
        let mut pf = new_file();
        let first = pf.find_or_create_page(PAGE_CAPACITY).unwrap();
        pf.write_record(first, &vec![1u8; PAGE_CAPACITY]).unwrap();
        let second = pf.find_or_create_page(1).unwrap();
        assert!(pf.collapse_empty_page(second).is_ok());
        let end = pf.file.seek(SeekFrom::End(0)).unwrap();
        assert_eq!(end, first + PAGE_HEADER_LEN + PAGE_CAPACITY as u64);
    }

    #[test]
    fn collapse_rejects_non_empty_page() {
        let mut pf = new_file();
        let offset = pf.find_or_create_page(4).unwrap();
        pf.write_record(offset, b"data").unwrap();
        assert!(pf.collapse_empty_page(offset).is_err());
    }
}
