//! The primary-key index: an in-memory ordered map from `id` to
//! containing-page offset, rewritten to disk in full on every mutation.

use byteforge_core::{tag, Error, Result};
use crate::tlv;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

/// `id -> page offset`, backed by a `BTreeMap` (Rust's balanced ordered
/// map) and mirrored to `T_idx.bin` in full on every write.
pub struct PrimaryIndex {
    entries: BTreeMap<i64, u64>,
    file: File,
}

impl PrimaryIndex {
    /// Loads the entire index file into memory. An empty file is a valid,
    /// empty index (the common case for a freshly created table) — it is
    /// up to the caller to decide whether an empty result is suspicious
    /// given the state of the data file (see the crash-recovery rebuild
    /// in `table::open`).
    pub fn load(mut file: File) -> Result<Self> {
        let mut bytes = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut bytes)?;

        let mut entries = BTreeMap::new();
        if !bytes.is_empty() {
            let (outer, _) = tlv::read_tlv(&bytes)?;
            if outer.tag != tag::INDEX {
                return Err(Error::UnexpectedTag {
                    found: outer.tag,
                    context: "index file",
                });
            }
            for (item_tag, item_payload) in tlv::decode_list_items(outer.payload)? {
                if item_tag != tag::INDEX_ITEM {
                    return Err(Error::UnexpectedTag {
                        found: item_tag,
                        context: "index item",
                    });
                }
                let (id_tlv, consumed) = tlv::read_tlv(&item_payload)?;
                let id = tlv::decode_int64(id_tlv.tag, id_tlv.payload)?;
                let (offset_tlv, _) = tlv::read_tlv(&item_payload[consumed..])?;
                let offset = tlv::decode_int64(offset_tlv.tag, offset_tlv.payload)?;
                entries.insert(id, offset as u64);
            }
        }
        Ok(PrimaryIndex { entries, file })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, id: i64) -> Result<u64> {
        self.entries.get(&id).copied().ok_or(Error::IdNotFound(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.keys().copied()
    }

    /// Inserts or replaces `id -> page_offset` and rewrites the index
    /// file in full.
    pub fn add_and_persist(&mut self, id: i64, page_offset: u64) -> Result<()> {
        self.entries.insert(id, page_offset);
        self.persist()
    }

    /// Removes every id in `ids` (missing ids are ignored) and rewrites
    /// the index file in full. Used to rebuild from a full scan too.
    pub fn rebuild_and_persist(&mut self, entries: BTreeMap<i64, u64>) -> Result<()> {
        self.entries = entries;
        self.persist()
    }

    pub fn remove_many_and_persist(&mut self, ids: &[i64]) -> Result<()> {
        for id in ids {
            self.entries.remove(id);
        }
        self.persist()
    }

    /// Flushes any OS-buffered writes to disk. Called on table close.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Rewrites the index file: `truncate -> seek(0) -> write`. A crash in
    /// this window leaves the file short or empty; see [`Self::load`].
    fn persist(&mut self) -> Result<()> {
        let mut payload = Vec::new();
        for (id, offset) in &self.entries {
            let mut item_payload = Vec::new();
            item_payload.extend(tlv::encode_int64(*id));
            item_payload.extend(tlv::encode_int64(*offset as i64));
            payload.extend(tlv::encode_tlv(tag::INDEX_ITEM, &item_payload));
        }
        let bytes = tlv::encode_tlv(tag::INDEX, &payload);

        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&bytes)?;
        self.file.flush()?;
        Ok(())
    }
}
