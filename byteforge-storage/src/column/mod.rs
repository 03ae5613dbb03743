//! Column schema: fixed-width names, scalar types, and nullability.
//!
//! A table's schema is a fixed, ordered list of [`Column`]s chosen at
//! creation time and never revisited — there is no migration path, by
//! design (see the engine's Non-goals). Each column serializes as one
//! `column-definition` TLV at the head of the data file; [`write_schema`]
//! / [`read_schema`] are the only code that needs to know that.

use byteforge_core::{tag, ColumnType, Error, Result, COLUMN_NAME_LEN};
use crate::tlv;
use std::io::Read;

/// One column in a table's fixed schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType, nullable: bool) -> Result<Self> {
        let name = name.into();
        if name.as_bytes().len() > COLUMN_NAME_LEN {
            return Err(Error::ColumnNameTooLong(name));
        }
        Ok(Column {
            name,
            column_type,
            nullable,
        })
    }

    /// Encodes this column as a `column-definition` TLV: the name
    /// zero-padded to exactly [`COLUMN_NAME_LEN`] bytes, the type tag, and
    /// the nullable flag, each wrapped as its own nested TLV.
    pub fn encode(&self) -> Vec<u8> {
        let mut padded = vec![0u8; COLUMN_NAME_LEN];
        let name_bytes = self.name.as_bytes();
        padded[..name_bytes.len()].copy_from_slice(name_bytes);

        let name_tlv = tlv::encode_tlv(tag::STRING, &padded);
        let type_tlv = tlv::encode_tlv(tag::BYTE, &[self.column_type.tag()]);
        let nullable_tlv = tlv::encode_tlv(tag::BOOL, &[self.nullable as u8]);

        let mut payload = Vec::with_capacity(name_tlv.len() + type_tlv.len() + nullable_tlv.len());
        payload.extend(name_tlv);
        payload.extend(type_tlv);
        payload.extend(nullable_tlv);
        tlv::encode_tlv(tag::COLUMN_DEFINITION, &payload)
    }

    /// Decodes a column from the payload of an already-unwrapped
    /// `column-definition` TLV.
    fn decode_payload(payload: &[u8]) -> Result<Self> {
        let (name_tlv, consumed) = tlv::read_tlv(payload)?;
        if name_tlv.tag != tag::STRING {
            return Err(Error::UnexpectedTag {
                found: name_tlv.tag,
                context: "column name",
            });
        }
        if name_tlv.payload.len() != COLUMN_NAME_LEN {
            return Err(Error::Truncated {
                expected: COLUMN_NAME_LEN,
                found: name_tlv.payload.len(),
            });
        }
        let nul = name_tlv
            .payload
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(COLUMN_NAME_LEN);
        let name = std::str::from_utf8(&name_tlv.payload[..nul])
            .map_err(|e| Error::RecordCorruption(format!("invalid utf-8 column name: {e}")))?
            .to_string();
        let rest = &payload[consumed..];

        let (type_tlv, consumed2) = tlv::read_tlv(rest)?;
        if type_tlv.tag != tag::BYTE || type_tlv.payload.len() != 1 {
            return Err(Error::UnexpectedTag {
                found: type_tlv.tag,
                context: "column type",
            });
        }
        let column_type = ColumnType::from_tag(type_tlv.payload[0])
            .ok_or(Error::UnsupportedTag(type_tlv.payload[0]))?;
        let rest = &rest[consumed2..];

        let (nullable_tlv, _) = tlv::read_tlv(rest)?;
        if nullable_tlv.tag != tag::BOOL || nullable_tlv.payload.len() != 1 {
            return Err(Error::UnexpectedTag {
                found: nullable_tlv.tag,
                context: "column nullable flag",
            });
        }
        let nullable = nullable_tlv.payload[0] != 0;

        Ok(Column {
            name,
            column_type,
            nullable,
        })
    }
}

/// Writes every column's definition, in declared order, to `out`.
pub fn write_schema(columns: &[Column]) -> Vec<u8> {
    let mut out = Vec::new();
    for column in columns {
        out.extend(column.encode());
    }
    out
}

/// Reads column definitions from the front of `reader` until a non
/// `column-definition` tag is encountered. That tag's header has already
/// been consumed from `reader`, so it is returned to the caller as the
/// boundary marker between the schema header and the first page.
pub fn read_schema<R: Read>(reader: &mut R) -> Result<(Vec<Column>, Option<(u8, u32)>)> {
    let mut columns = Vec::new();
    loop {
        let (read_tag, len) = match tlv::read_tlv_header(reader) {
            Ok(header) => header,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Ok((columns, None));
            }
            Err(e) => return Err(e.into()),
        };
        if read_tag != tag::COLUMN_DEFINITION {
            return Ok((columns, Some((read_tag, len))));
        }
        let payload = tlv::read_payload(reader, len)?;
        columns.push(Column::decode_payload(&payload)?);
    }
}
