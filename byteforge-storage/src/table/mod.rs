//! The table orchestrator: binds the TLV codec, column schema, paged
//! data file, primary-key index, page cache, and WAL behind
//! `insert` / `select` / `update` / `delete` / `close`.
//!
//! Mutations follow one mandatory order: `WAL.append -> data-file write
//! -> index persist -> cache invalidate -> WAL.commit`. Recovery at open
//! runs `WAL.restorable -> re-apply -> WAL.commit` before the table
//! accepts new operations.

use byteforge_core::{tag, Error, Result};
use crate::cache::{PageCache, PageKey};
use crate::column::{read_schema, write_schema, Column};
use crate::fsperm;
use crate::index::PrimaryIndex;
use crate::page::PagedDataFile;
use crate::predicate::Predicate;
use crate::record::{decode_record, encode_record, validate, ParsedRecord, Record, RecordParser};
use crate::tlv;
use crate::wal::{Wal, OP_INSERT};
use std::collections::BTreeSet;
use std::io::{Cursor, Seek, SeekFrom, Write};
use std::path::Path;

/// Per-table LRU page cache capacity (reference value).
const DEFAULT_CACHE_CAPACITY: usize = 10;

/// The result of a `select`, including the access-path diagnostics the
/// engine design calls out: which path was taken, and (for an
/// id-predicate lookup) whether the page cache served it.
#[derive(Debug)]
pub struct SelectResult {
    pub rows: Vec<Record>,
    pub access_type: &'static str,
    pub extra: Option<&'static str>,
}

struct MatchedRecord {
    offset: u64,
    payload_len: u32,
    page_offset: u64,
    id: i64,
    record: Record,
}

/// One open table: its schema, its three file handles, and its cache.
pub struct Table {
    name: String,
    columns: Vec<Column>,
    data: PagedDataFile,
    index: PrimaryIndex,
    cache: PageCache,
    wal: Wal,
}

impl Table {
    /// Creates a brand-new table: writes the schema header, then opens
    /// empty index and WAL files. Fails with [`Error::TableAlreadyExists`]
    /// if a data file by this name already exists in `dir`.
    pub fn create(dir: &Path, name: &str, columns: Vec<Column>) -> Result<Table> {
        let data_path = data_file_path(dir, name);
        if data_path.exists() {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }
        let mut file = fsperm::create_new(&data_path)?;
        let schema_bytes = write_schema(&columns);
        file.write_all(&schema_bytes)?;
        file.flush()?;
        let pages_start = schema_bytes.len() as u64;

        let index_file = fsperm::create_new(&index_file_path(dir, name))?;
        let index = PrimaryIndex::load(index_file)?;
        let wal = Wal::open(dir, name)?;

        Ok(Table {
            name: name.to_string(),
            columns,
            data: PagedDataFile::new(file, pages_start),
            index,
            cache: PageCache::new(DEFAULT_CACHE_CAPACITY),
            wal,
        })
    }

    /// Opens an existing table: rebuilds the primary index from a full
    /// scan if it came back empty while the data file holds live records
    /// (see the engine's index-recovery design note), then replays any
    /// uncommitted WAL tail on top of that index. The rebuild must run
    /// first — it is gated on the index being empty exactly as `load()`
    /// left it, and replay's own upserts would otherwise mask that.
    pub fn open(dir: &Path, name: &str) -> Result<Table> {
        let data_path = data_file_path(dir, name);
        if !data_path.exists() {
            return Err(Error::TableNotFound(name.to_string()));
        }
        let mut file = fsperm::open_rw(&data_path)?;
        file.seek(SeekFrom::Start(0))?;
        let (columns, _boundary) = read_schema(&mut file)?;
        let pages_start: u64 = columns.iter().map(|c| c.encode().len() as u64).sum();

        let index_file = fsperm::open_rw(&index_file_path(dir, name))?;
        let index = PrimaryIndex::load(index_file)?;
        let wal = Wal::open(dir, name)?;

        let mut table = Table {
            name: name.to_string(),
            columns,
            data: PagedDataFile::new(file, pages_start),
            index,
            cache: PageCache::new(DEFAULT_CACHE_CAPACITY),
            wal,
        };
        // Rebuild from a full scan first, while `self.index.is_empty()`
        // still reflects what `load()` actually found on disk — the crash
        // this guards against (a short/empty index file) always coincides
        // with an uncommitted WAL tail, since index-persist happens before
        // `WAL.commit` in the same insert. Replaying afterwards lets the
        // tail's upserts land on top of the scan-rebuilt index instead of
        // being the only entries the emptiness check ever sees.
        table.rebuild_index_if_needed()?;
        table.replay_wal()?;
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Validates, serializes, WALs (if asked), pages, indexes, and
    /// invalidates the cache for `record`. Returns 1 on success — the
    /// engine never inserts more than one row per call.
    pub fn insert(&mut self, record: &Record, use_wal: bool) -> Result<usize> {
        validate(&self.columns, record, true)?;
        let id = record.id()?;
        let record_tlv = encode_record(&self.columns, record)?;

        let handle = if use_wal {
            Some(self.wal.append(OP_INSERT, &self.name, &record_tlv)?)
        } else {
            None
        };

        self.apply_insert(id, &record_tlv)?;

        if let Some(handle) = handle {
            self.wal.commit(&handle)?;
        }
        Ok(1)
    }

    /// Pages and indexes an already-encoded `record` TLV. Shared by
    /// `insert` and by WAL replay, which has the same bytes on hand and
    /// must not re-append them to the WAL a second time.
    fn apply_insert(&mut self, id: i64, record_tlv: &[u8]) -> Result<u64> {
        let page_offset = self.data.find_or_create_page(record_tlv.len())?;
        self.data.write_record(page_offset, record_tlv)?;
        self.index.add_and_persist(id, page_offset)?;
        self.invalidate_page(page_offset)?;
        Ok(page_offset)
    }

    /// If `predicate` names `id`, looks the id up in the primary index
    /// and consults the page cache (`access_type = "index"`). Otherwise
    /// scans the whole data file (`access_type = "ALL"`), bypassing the
    /// cache entirely so a large scan can't evict a point-lookup's
    /// working set.
    pub fn select(&mut self, predicate: &Predicate) -> Result<SelectResult> {
        if let Some(id) = predicate.id() {
            return self.select_by_id(id, predicate);
        }

        predicate.validate_against(&self.columns)?;
        let mut rows = Vec::new();
        self.data.file_mut().seek(SeekFrom::Start(self.data.pages_start()))?;
        let mut parser = RecordParser::new(self.data.file_mut(), &self.columns);
        while let Some(parsed) = parser.parse()? {
            if predicate.matches(|c| parsed.record.get(c).cloned()) {
                rows.push(parsed.record);
            }
        }
        Ok(SelectResult {
            rows,
            access_type: "ALL",
            extra: None,
        })
    }

    fn select_by_id(&mut self, id: i64, predicate: &Predicate) -> Result<SelectResult> {
        let page_offset = self.index.get(id)?;
        let key = PageKey::new(self.name.clone(), page_offset);

        let (bytes, extra) = match self.cache.get(&key) {
            Some(cached) => (cached.to_vec(), "Using page cache"),
            None => {
                let page_bytes = self.data.read_page(page_offset)?;
                self.cache.put(key, page_bytes.clone());
                (page_bytes, "Not using page cache")
            }
        };

        let mut cursor = Cursor::new(bytes);
        let mut parser = RecordParser::new(&mut cursor, &self.columns);
        let mut rows = Vec::new();
        while let Some(parsed) = parser.parse()? {
            if predicate.matches(|c| parsed.record.get(c).cloned()) {
                rows.push(parsed.record);
                break; // only the first match is returned on this path
            }
        }
        Ok(SelectResult {
            rows,
            access_type: "index",
            extra: Some(extra),
        })
    }

    /// Tombstones every record matching `predicate`, removes their ids
    /// from the primary index, and invalidates every page that was
    /// touched. Returns the number of records deleted.
    pub fn delete(&mut self, predicate: &Predicate) -> Result<usize> {
        predicate.validate_against(&self.columns)?;
        let matches = self.scan_matches(predicate)?;
        self.apply_deletes(&matches)
    }

    /// Delete-then-insert: runs `delete(predicate)` (collecting
    /// pre-images), then re-inserts each pre-image overlaid with `patch`,
    /// without a WAL entry of its own (the delete already logged the
    /// tombstones it performed — see the engine's WAL-coverage design
    /// note on why the synthesized inserts are not separately journaled).
    pub fn update(&mut self, predicate: &Predicate, patch: &Record) -> Result<usize> {
        validate(&self.columns, patch, false)?;
        predicate.validate_against(&self.columns)?;

        let matches = self.scan_matches(predicate)?;
        let count = self.apply_deletes(&matches)?;
        for matched in &matches {
            let patched = matched.record.overlay(patch);
            self.insert(&patched, false)?;
        }
        Ok(count)
    }

    /// Flushes and releases the table's file handles. The WAL is left
    /// however the last `commit` left it; there is nothing further to
    /// reconcile on a clean close.
    pub fn close(mut self) -> Result<()> {
        self.data.sync()?;
        self.index.sync()?;
        Ok(())
    }

    fn scan_matches(&mut self, predicate: &Predicate) -> Result<Vec<MatchedRecord>> {
        self.data.file_mut().seek(SeekFrom::Start(self.data.pages_start()))?;
        let mut parser = RecordParser::new(self.data.file_mut(), &self.columns);
        let mut matches = Vec::new();
        while let Some(parsed) = parser.parse()? {
            if predicate.matches(|c| parsed.record.get(c).cloned()) {
                matches.push(to_matched(parsed)?);
            }
        }
        Ok(matches)
    }

    fn apply_deletes(&mut self, matches: &[MatchedRecord]) -> Result<usize> {
        let mut ids = Vec::with_capacity(matches.len());
        let mut touched_pages = BTreeSet::new();
        for matched in matches {
            self.data.tombstone(matched.offset, matched.payload_len)?;
            ids.push(matched.id);
            touched_pages.insert(matched.page_offset);
        }
        self.index.remove_many_and_persist(&ids)?;
        for page_offset in touched_pages {
            self.invalidate_page(page_offset)?;
        }
        Ok(matches.len())
    }

    fn invalidate_page(&mut self, page_offset: u64) -> Result<()> {
        let key = PageKey::new(self.name.clone(), page_offset);
        match self.cache.remove(&key) {
            Ok(()) | Err(Error::CacheMiss) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Re-applies every WAL entry after the last committed one (the tail
    /// left uncommitted by a crash between the data-file write and the
    /// commit), then commits the tail so future opens see nothing left
    /// to restore.
    fn replay_wal(&mut self) -> Result<()> {
        let Some(restorable) = self.wal.restorable()? else {
            return Ok(());
        };
        log::info!(
            "table {}: replaying {} uncommitted WAL entr{}",
            self.name,
            restorable.records.len(),
            if restorable.records.len() == 1 { "y" } else { "ies" }
        );
        for record_tlv in &restorable.records {
            let (outer, _) = tlv::read_tlv(record_tlv)?;
            if outer.tag != tag::RECORD {
                return Err(Error::WalCorruption(format!(
                    "WAL entry carried tag {} instead of a record payload",
                    outer.tag
                )));
            }
            let record = decode_record(&self.columns, outer.payload)?;
            let id = record.id()?;
            self.apply_insert(id, record_tlv)?;
        }
        self.wal.commit(&restorable.tail)?;
        Ok(())
    }

    /// Rebuilds the primary index from a full data-file scan when
    /// [`PrimaryIndex::load`] came back empty but the data file holds
    /// records — the signature of a crash between the index file's
    /// `truncate` and the completion of its rewrite (see the index's
    /// atomicity note). A genuinely empty table leaves the index empty,
    /// which is correct and is not rewritten.
    fn rebuild_index_if_needed(&mut self) -> Result<()> {
        if !self.index.is_empty() {
            return Ok(());
        }
        let mut entries = std::collections::BTreeMap::new();
        self.data.file_mut().seek(SeekFrom::Start(self.data.pages_start()))?;
        let mut parser = RecordParser::new(self.data.file_mut(), &self.columns);
        while let Some(parsed) = parser.parse()? {
            entries.insert(parsed.id()?, parsed.page_offset);
        }
        if !entries.is_empty() {
            log::warn!(
                "table {}: index was empty but {} live records were found; rebuilding from a full scan",
                self.name,
                entries.len()
            );
            self.index.rebuild_and_persist(entries)?;
        }
        Ok(())
    }
}

fn to_matched(parsed: ParsedRecord) -> Result<MatchedRecord> {
    let id = parsed.id()?;
    Ok(MatchedRecord {
        offset: parsed.offset,
        payload_len: parsed.payload_len,
        page_offset: parsed.page_offset,
        id,
        record: parsed.record,
    })
}

fn data_file_path(dir: &Path, name: &str) -> std::path::PathBuf {
    dir.join(format!("{name}.bin"))
}

fn index_file_path(dir: &Path, name: &str) -> std::path::PathBuf {
    dir.join(format!("{name}_idx.bin"))
}
