//! Per-table write-ahead log plus its companion last-commit pointer.
//!
//! Every mutation that wants durability appends an entry here before it
//! touches the data file, then commits that entry once the data-file
//! write has landed. The ordering `append -> data-file write -> commit`
//! is what [`Table`](crate::table::Table) enforces; this module only
//! implements the two file formats and the replay scan.

use byteforge_core::{tag, Error, Result};
use crate::{fsperm, tlv};
use rand::RngCore;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// The only mutation kind the core WAL logs. Updates and deletes reuse
/// the data file's own tombstone-then-insert mechanism and are not
/// separately journaled — see the engine design notes on WAL coverage.
pub const OP_INSERT: &str = "insert";

/// A handle to an appended-but-not-yet-committed entry: enough to commit
/// it later without re-reading the file.
#[derive(Debug, Clone)]
pub struct WalHandle {
    pub id: String,
    pub len: u32,
}

/// Every entry recovered from an uncommitted WAL tail, plus the tail
/// entry's own handle (so the caller can commit it once replay lands).
pub struct Restorable {
    pub tail: WalHandle,
    /// Each element is one entry's raw `record` TLV, in WAL order.
    pub records: Vec<Vec<u8>>,
}

/// Owns a table's `_wal.bin` and `_wal_last_commit.bin` file handles.
pub struct Wal {
    file: File,
    last_commit_file: File,
}

impl Wal {
    /// Opens (creating if absent) the WAL pair for `table` inside `dir`.
    pub fn open(dir: &Path, table: &str) -> Result<Self> {
        let wal_path = dir.join(format!("{table}_wal.bin"));
        let commit_path = dir.join(format!("{table}_wal_last_commit.bin"));
        Ok(Wal {
            file: fsperm::open_rw(&wal_path)?,
            last_commit_file: fsperm::open_rw(&commit_path)?,
        })
    }

    /// Appends a new entry to the tail of the WAL and returns a handle
    /// that [`Self::commit`] later durably points at. Does not commit.
    pub fn append(&mut self, op: &str, table: &str, record_tlv: &[u8]) -> Result<WalHandle> {
        let id = generate_id();
        let entry = encode_entry(&id, op, table, record_tlv);
        self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&entry)?;
        self.file.flush()?;
        Ok(WalHandle {
            id,
            len: entry.len() as u32,
        })
    }

    /// Overwrites the last-commit pointer file with `handle`. This is the
    /// engine's durability point: an entry is committed iff the pointer
    /// names it (or a later entry that supersedes it).
    pub fn commit(&mut self, handle: &WalHandle) -> Result<()> {
        let bytes = encode_last_commit(&handle.id, handle.len);
        self.last_commit_file.set_len(0)?;
        self.last_commit_file.seek(SeekFrom::Start(0))?;
        self.last_commit_file.write_all(&bytes)?;
        self.last_commit_file.flush()?;
        Ok(())
    }

    /// Computes what, if anything, needs replaying at table-open time.
    ///
    /// Returns `Ok(None)` when the last-commit pointer is empty (a fresh
    /// table) or when it already names the WAL's tail entry (nothing was
    /// lost). Otherwise returns every entry strictly after the committed
    /// one, in WAL order, along with the tail entry's handle so the
    /// caller can commit it once the entries have been re-applied.
    pub fn restorable(&mut self) -> Result<Option<Restorable>> {
        let mut pointer_bytes = Vec::new();
        self.last_commit_file.seek(SeekFrom::Start(0))?;
        self.last_commit_file.read_to_end(&mut pointer_bytes)?;
        if pointer_bytes.is_empty() {
            return Ok(None);
        }
        let (committed_id, _committed_len) = decode_last_commit(&pointer_bytes)?;

        let wal_end = self.file.seek(SeekFrom::End(0))?;
        if wal_end == 0 {
            return Ok(None);
        }

        let mut all_bytes = Vec::new();
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_to_end(&mut all_bytes)?;

        let entries = decode_all_entries(&all_bytes)?;
        let tail = entries.last().ok_or_else(|| {
            Error::WalCorruption("WAL file is non-empty but contains no entries".into())
        })?;
        if tail.id == committed_id {
            return Ok(None);
        }

        let commit_pos = entries.iter().position(|e| e.id == committed_id);
        let start = match commit_pos {
            Some(pos) => pos + 1,
            // An empty committed_id (freshly truncated commit file content
            // that decoded but named nothing persisted yet) replays
            // everything; an id that truly isn't present is corruption.
            None if committed_id.is_empty() => 0,
            None => {
                return Err(Error::WalCorruption(format!(
                    "last-commit id {committed_id} not found in WAL"
                )))
            }
        };

        let tail_handle = WalHandle {
            id: tail.id.clone(),
            len: tail.full_size as u32,
        };
        let records = entries[start..].iter().map(|e| e.record_tlv.clone()).collect();
        Ok(Some(Restorable {
            tail: tail_handle,
            records,
        }))
    }
}

fn generate_id() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn encode_entry(id: &str, op: &str, table: &str, record_tlv: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend(tlv::encode_tlv(tag::STRING, id.as_bytes()));
    payload.extend(tlv::encode_tlv(tag::STRING, op.as_bytes()));
    payload.extend(tlv::encode_tlv(tag::STRING, table.as_bytes()));
    payload.extend_from_slice(record_tlv);
    tlv::encode_tlv(tag::WAL_ENTRY, &payload)
}

fn encode_last_commit(id: &str, len: u32) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend(tlv::encode_tlv(tag::STRING, id.as_bytes()));
    payload.extend(tlv::encode_int64(i64::from(len)));
    tlv::encode_tlv(tag::WAL_LAST_COMMIT, &payload)
}

fn decode_last_commit(bytes: &[u8]) -> Result<(String, u32)> {
    let (outer, _) = tlv::read_tlv(bytes)?;
    if outer.tag != tag::WAL_LAST_COMMIT {
        return Err(Error::UnexpectedTag {
            found: outer.tag,
            context: "WAL last-commit pointer",
        });
    }
    let (id_tlv, consumed) = tlv::read_tlv(outer.payload)?;
    let id = decode_string(&id_tlv)?;
    let (len_tlv, _) = tlv::read_tlv(&outer.payload[consumed..])?;
    let len = tlv::decode_int64(len_tlv.tag, len_tlv.payload)?;
    Ok((id, len as u32))
}

/// One fully decoded WAL entry, including its total on-disk size so a
/// caller can locate it from EOF the way the last-commit pointer does.
struct DecodedEntry {
    id: String,
    full_size: u64,
    record_tlv: Vec<u8>,
}

fn decode_all_entries(bytes: &[u8]) -> Result<Vec<DecodedEntry>> {
    let mut entries = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let (outer, consumed) = tlv::read_tlv(&bytes[offset..])?;
        if outer.tag != tag::WAL_ENTRY {
            return Err(Error::UnexpectedTag {
                found: outer.tag,
                context: "WAL entry",
            });
        }
        let (id_tlv, c1) = tlv::read_tlv(outer.payload)?;
        let id = decode_string(&id_tlv)?;
        let (_op_tlv, c2) = tlv::read_tlv(&outer.payload[c1..])?;
        let (_table_tlv, c3) = tlv::read_tlv(&outer.payload[c1 + c2..])?;
        let record_tlv = outer.payload[c1 + c2 + c3..].to_vec();
        entries.push(DecodedEntry {
            id,
            full_size: consumed as u64,
            record_tlv,
        });
        offset += consumed;
    }
    Ok(entries)
}

fn decode_string(t: &tlv::Tlv<'_>) -> Result<String> {
    if t.tag != tag::STRING {
        return Err(Error::UnexpectedTag {
            found: t.tag,
            context: "WAL string field",
        });
    }
    std::str::from_utf8(t.payload)
        .map(str::to_string)
        .map_err(|e| Error::WalCorruption(format!("invalid utf-8 in WAL field: {e}")))
}
