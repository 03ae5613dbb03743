//! Bounded LRU cache of page bytes, keyed by `(table, page offset)`.
//!
//! Only id-predicate reads consult this cache; full scans bypass it
//! entirely (see [`crate::table::Table::select`]) so a large scan never
//! thrashes the working set a point-lookup workload depends on. Every
//! mutation path that touches a page must invalidate it here before
//! reporting success — a stale entry would otherwise silently outlive
//! the on-disk bytes it was copied from.

use byteforge_core::{Error, Result};
use std::collections::HashMap;

/// Identifies a cached page: the owning table's name and its byte offset
/// in that table's data file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub table: String,
    pub offset: u64,
}

impl PageKey {
    pub fn new(table: impl Into<String>, offset: u64) -> Self {
        PageKey {
            table: table.into(),
            offset,
        }
    }
}

/// A pure read-through LRU keyed by [`PageKey`]. Recency is tracked with
/// a plain `Vec` rather than an intrusive linked list — at the reference
/// capacity (10 entries per table) a linear scan on every access is
/// cheaper than the bookkeeping a real LRU list needs.
pub struct PageCache {
    capacity: usize,
    entries: HashMap<PageKey, Vec<u8>>,
    /// Recency order, least-recently-used first.
    order: Vec<PageKey>,
}

impl PageCache {
    pub fn new(capacity: usize) -> Self {
        PageCache {
            capacity,
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Returns the cached bytes for `key`, marking it most-recently-used.
    pub fn get(&mut self, key: &PageKey) -> Option<&[u8]> {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.touch(key);
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Inserts or replaces `key`'s bytes, evicting the least-recently-used
    /// entry first if the cache is already at capacity.
    pub fn put(&mut self, key: PageKey, bytes: Vec<u8>) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(lru) = self.order.first().cloned() {
                self.entries.remove(&lru);
                self.order.remove(0);
            }
        }
        self.touch(&key);
        self.entries.insert(key, bytes);
    }

    /// Explicitly invalidates `key`. A missing key is benign — callers
    /// invalidate on every mutation whether or not the page was ever
    /// cached, so [`Error::CacheMiss`] is expected and swallowed by the
    /// caller, not this method.
    pub fn remove(&mut self, key: &PageKey) -> Result<()> {
        if self.entries.remove(key).is_none() {
            return Err(Error::CacheMiss);
        }
        self.order.retain(|k| k != key);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, key: &PageKey) {
        self.order.retain(|k| k != key);
        self.order.push(key.clone());
    }
}
