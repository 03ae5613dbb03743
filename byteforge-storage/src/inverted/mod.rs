//! A simple inverted-map secondary index: `term -> [(id, page-offset)]`.
//!
//! This is not part of the table's query path — `Table::select` only
//! ever consults the primary-key index or a full scan, per the engine's
//! documented query surface. This module is a standalone supplemental
//! index a caller can build and maintain alongside a table (e.g. to
//! answer "which ids mention this term" without a full scan), the same
//! way the reference engine's full-text index sits next to its table
//! rather than inside it.

use byteforge_core::{tag, Error, Result};
use crate::tlv;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

/// One posting: the id that matched a term, and the page it lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub id: i64,
    pub page_offset: u64,
}

/// `term -> postings`, mirrored to a single file in full on every
/// mutation, the same `truncate -> seek(0) -> write` discipline the
/// primary index uses.
pub struct InvertedIndex {
    postings: HashMap<String, Vec<Posting>>,
    file: File,
}

impl InvertedIndex {
    /// Loads the entire index file into memory. An empty file is a valid,
    /// empty index.
    pub fn load(mut file: File) -> Result<Self> {
        let mut bytes = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut bytes)?;

        let mut postings = HashMap::new();
        if !bytes.is_empty() {
            let (outer, _) = tlv::read_tlv(&bytes)?;
            if outer.tag != tag::MAP {
                return Err(Error::UnexpectedTag {
                    found: outer.tag,
                    context: "inverted index file",
                });
            }
            for (term, value_tag, value_payload) in tlv::decode_map_entries(outer.payload)? {
                if value_tag != tag::LIST {
                    return Err(Error::UnexpectedTag {
                        found: value_tag,
                        context: "inverted index postings list",
                    });
                }
                let mut entries = Vec::new();
                for (item_tag, item_payload) in tlv::decode_list_items(&value_payload)? {
                    if item_tag != tag::INDEX_ITEM {
                        return Err(Error::UnexpectedTag {
                            found: item_tag,
                            context: "inverted index posting",
                        });
                    }
                    let (id_tlv, consumed) = tlv::read_tlv(&item_payload)?;
                    let id = tlv::decode_int64(id_tlv.tag, id_tlv.payload)?;
                    let (offset_tlv, _) = tlv::read_tlv(&item_payload[consumed..])?;
                    let page_offset = tlv::decode_int64(offset_tlv.tag, offset_tlv.payload)? as u64;
                    entries.push(Posting { id, page_offset });
                }
                postings.insert(term, entries);
            }
        }
        Ok(InvertedIndex { postings, file })
    }

    pub fn get(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Adds a posting under `term` and rewrites the index file in full.
    pub fn add_and_persist(&mut self, term: &str, posting: Posting) -> Result<()> {
        self.postings.entry(term.to_string()).or_default().push(posting);
        self.persist()
    }

    /// Removes every posting with any of `ids` (from every term) and
    /// rewrites the index file in full. Terms left with no postings are
    /// dropped rather than kept empty.
    pub fn remove_many_and_persist(&mut self, ids: &[i64]) -> Result<()> {
        self.postings.retain(|_, entries| {
            entries.retain(|p| !ids.contains(&p.id));
            !entries.is_empty()
        });
        self.persist()
    }

    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        let mut entries: Vec<(String, Vec<u8>)> = Vec::with_capacity(self.postings.len());
        for (term, postings) in &self.postings {
            let items: Vec<Vec<u8>> = postings
                .iter()
                .map(|p| {
                    let mut item_payload = Vec::new();
                    item_payload.extend(tlv::encode_int64(p.id));
                    item_payload.extend(tlv::encode_int64(p.page_offset as i64));
                    tlv::encode_tlv(tag::INDEX_ITEM, &item_payload)
                })
                .collect();
            entries.push((term.clone(), tlv::encode_list(&items)));
        }
        let bytes = tlv::encode_map(&entries);

        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&bytes)?;
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempfile;

    #[test]
    fn empty_index_loads_clean() {
        let index = InvertedIndex::load(tempfile().unwrap()).unwrap();
        assert!(index.get("anything").is_empty());
    }

    #[test]
    fn add_get_and_reload_round_trips() {
        let file = tempfile().unwrap();
        let mut index = InvertedIndex::load(file.try_clone().unwrap()).unwrap();
        index
            .add_and_persist("engineer", Posting { id: 1, page_offset: 0 })
            .unwrap();
        index
            .add_and_persist("engineer", Posting { id: 2, page_offset: 133 })
            .unwrap();
        index
            .add_and_persist("designer", Posting { id: 3, page_offset: 266 })
            .unwrap();

        assert_eq!(index.get("engineer").len(), 2);
        assert_eq!(index.get("designer"), &[Posting { id: 3, page_offset: 266 }]);

        let reloaded = InvertedIndex::load(file).unwrap();
        assert_eq!(reloaded.get("engineer").len(), 2);
        assert_eq!(reloaded.get("missing").len(), 0);
    }

    #[test]
    fn remove_many_drops_postings_and_empty_terms() {
        let file = tempfile().unwrap();
        let mut index = InvertedIndex::load(file).unwrap();
        index
            .add_and_persist("engineer", Posting { id: 1, page_offset: 0 })
            .unwrap();
        index
            .add_and_persist("engineer", Posting { id: 2, page_offset: 10 })
            .unwrap();
        index.remove_many_and_persist(&[1]).unwrap();
        assert_eq!(index.get("engineer"), &[Posting { id: 2, page_offset: 10 }]);

        index.remove_many_and_persist(&[2]).unwrap();
        assert!(index.get("engineer").is_empty());
    }
}
