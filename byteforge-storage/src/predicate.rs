//! The engine's entire query surface: an in-memory map of column name to
//! an equality value. There is no parser and no expression tree — a
//! predicate is exactly as rich as `select`, `update`, and `delete` need
//! to be, per the engine's scope (no range queries, no joins).

use byteforge_core::{Error, Result, Value};
use crate::column::Column;

/// A conjunction of column-equals-value tests. An empty predicate matches
/// every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    equalities: Vec<(String, Value)>,
}

impl Predicate {
    pub fn new() -> Self {
        Predicate::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: Value) -> Self {
        self.equalities.push((column.into(), value));
        self
    }

    pub fn from_pairs(equalities: Vec<(String, Value)>) -> Self {
        Predicate { equalities }
    }

    pub fn is_empty(&self) -> bool {
        self.equalities.is_empty()
    }

    /// The predicate's `id` equality, if it has one. Table consults this
    /// to decide whether a `select` can go through the primary index
    /// instead of a full scan.
    pub fn id(&self) -> Option<i64> {
        self.equalities.iter().find_map(|(name, value)| {
            if name == "id" {
                value.as_id()
            } else {
                None
            }
        })
    }

    /// Fails if any predicate column is not declared on the table. Called
    /// on the full-scan path, where an undeclared column is a fatal
    /// error rather than a trivial non-match (see the engine's select
    /// semantics).
    pub fn validate_against(&self, columns: &[Column]) -> Result<()> {
        for (name, _) in &self.equalities {
            if !columns.iter().any(|c| &c.name == name) {
                return Err(Error::MalformedPredicate(format!(
                    "unknown column in predicate: {name}"
                )));
            }
        }
        Ok(())
    }

    /// Strict per-value equality against a decoded record. A predicate
    /// column absent from `get` trivially matches (the caller is
    /// expected to have validated the predicate's columns are all
    /// declared, so "absent" only happens for columns the record itself
    /// doesn't carry — which should not occur for a schema-complete
    /// record, but is not treated as a mismatch either way).
    pub fn matches(&self, get: impl Fn(&str) -> Option<Value>) -> bool {
        self.equalities
            .iter()
            .all(|(name, want)| get(name).as_ref() == Some(want))
    }
}
