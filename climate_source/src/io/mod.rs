//! Byte-level decoding of fetched payloads.

pub mod decode;

pub use decode::{decode_csv, decode_metadata};
