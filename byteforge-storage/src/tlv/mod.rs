//! The Type-Length-Value wire format used uniformly for column
//! definitions, records, index items, and WAL entries.

mod codec;

pub use codec::{
    decode_int64, decode_list_items, decode_map_entries, decode_value, encode_int64, encode_list,
    encode_map, encode_tlv, encode_value, read_payload, read_tlv, read_tlv_header, Tlv,
};
