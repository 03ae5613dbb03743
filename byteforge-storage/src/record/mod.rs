//! Records: typed rows keyed by the table's fixed column order.

mod parser;

pub use parser::{ParsedRecord, RecordParser};

use byteforge_core::{tag, ColumnType, Error, Result, Value};
use crate::column::Column;
use crate::tlv;

/// An ordered mapping from column name to scalar value. Column order
/// always follows the owning table's declared schema; `Record` itself
/// does not enforce that (callers always build one from a schema-aware
/// path — see [`Record::from_pairs`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<(String, Value)>,
}

impl Record {
    pub fn from_pairs(values: Vec<(String, Value)>) -> Self {
        Record { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.values.iter()
    }

    /// The record's `id` column, which is always a non-nullable `int64`.
    pub fn id(&self) -> Result<i64> {
        match self.get("id") {
            Some(Value::Int64(v)) => Ok(*v),
            Some(_) => Err(Error::RecordCorruption("id column is not int64".into())),
            None => Err(Error::UnknownColumn("id".into())),
        }
    }

    /// Overlays `patch`'s columns onto this record, leaving every column
    /// `patch` does not mention untouched. Used by `update`, which is
    /// specified as delete-then-insert-with-overlay.
    pub fn overlay(&self, patch: &Record) -> Record {
        let mut values = self.values.clone();
        for (name, value) in &patch.values {
            if let Some(slot) = values.iter_mut().find(|(n, _)| n == name) {
                slot.1 = value.clone();
            } else {
                values.push((name.clone(), value.clone()));
            }
        }
        Record { values }
    }
}

/// Validates `record` against `columns`: every declared column must
/// appear exactly once, unknown columns are rejected, and non-nullable
/// columns may not carry `Value::Null`.
///
/// `require_all` is `false` when validating an `update` patch, which is
/// allowed to mention only the columns it changes.
pub fn validate(columns: &[Column], record: &Record, require_all: bool) -> Result<()> {
    for (name, _) in record.iter() {
        if !columns.iter().any(|c| &c.name == name) {
            return Err(Error::UnknownColumn(name.clone()));
        }
    }
    for column in columns {
        match record.get(&column.name) {
            Some(Value::Null) if !column.nullable => {
                return Err(Error::NullViolation(column.name.clone()))
            }
            Some(_) => {}
            None if require_all => return Err(Error::UnknownColumn(column.name.clone())),
            None => {}
        }
    }
    Ok(())
}

/// Encodes `record` as a `record` TLV: tag [`tag::RECORD`], payload is the
/// concatenation of one scalar TLV per column, in declared order.
pub fn encode_record(columns: &[Column], record: &Record) -> Result<Vec<u8>> {
    validate(columns, record, true)?;
    let mut payload = Vec::new();
    for column in columns {
        let value = record.get(&column.name).unwrap_or(&Value::Null);
        payload.extend(tlv::encode_value(column.column_type, value));
    }
    Ok(tlv::encode_tlv(tag::RECORD, &payload))
}

/// Decodes a `record` TLV payload into a [`Record`], given the owning
/// table's columns in declared order.
pub fn decode_record(columns: &[Column], payload: &[u8]) -> Result<Record> {
    let mut offset = 0;
    let mut values = Vec::with_capacity(columns.len());
    for column in columns {
        let (tlv, consumed) = tlv::read_tlv(&payload[offset..])?;
        let value = tlv::decode_value(column.column_type, tlv.tag, tlv.payload)?;
        values.push((column.name.clone(), value));
        offset += consumed;
    }
    if offset != payload.len() {
        return Err(Error::RecordCorruption(format!(
            "record payload has {} trailing bytes after {} declared columns",
            payload.len() - offset,
            columns.len()
        )));
    }
    Ok(Record { values })
}
