//! SSTable Module
//!
//! Sorted String Table - immutable on-disk sorted key-value storage.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (14 bytes)                                       │
//! │   Magic: "RRST" (4) | Version: u16 (2) | Count: u64 (8) │
//! ├─────────────────────────────────────────────────────────┤
//! │ Data Block (variable)                                   │
//! │   [KeyLen: u32][ValLen: u32][Key][Value]                │
//! │   ... one per key, ascending ...                        │
//! │   (ValLen = u32::MAX marks a tombstone, no value bytes) │
//! ├─────────────────────────────────────────────────────────┤
//! │ Index Block (variable)                                  │
//! │   [KeyLen: u32][Offset: u64][Key]                       │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (16 bytes)                                       │
//! │   IndexOffset: u64 (8) | DataCRC: u32 (4) | Padding (4) │
//! └─────────────────────────────────────────────────────────┘
//! ```
//! All integers are little-endian. The CRC covers the data block.

mod builder;
mod iterator;
mod reader;

use std::path::PathBuf;

pub use builder::SSTableBuilder;
pub use iterator::SSTableIterator;
pub use reader::SSTableReader;

/// Magic bytes identifying a rockredis SSTable file
pub(crate) const MAGIC: &[u8; 4] = b"RRST";

pub(crate) const VERSION: u16 = 1;

/// Magic (4) + Version (2) + EntryCount (8)
pub(crate) const HEADER_SIZE: u64 = 14;

/// IndexOffset (8) + DataCRC (4) + Padding (4)
pub(crate) const FOOTER_SIZE: u64 = 16;

/// Entry header: KeyLen (4) + ValLen (4)
pub(crate) const ENTRY_HEADER_SIZE: u64 = 8;

/// `ValLen` value marking a tombstone
pub(crate) const TOMBSTONE_MARKER: u32 = u32::MAX;

/// A key and its value, `None` for a tombstone
pub type SSTableEntry = (Vec<u8>, Option<Vec<u8>>);

/// Summary of a finished SSTable
#[derive(Debug, Clone)]
pub struct SSTable {
    pub path: PathBuf,
    pub entry_count: u64,
    pub min_key: Vec<u8>,
    pub max_key: Vec<u8>,
    pub file_size: u64,
}

/// Encode an entry header
pub(crate) fn entry_header(key: &[u8], value: Option<&[u8]>) -> [u8; ENTRY_HEADER_SIZE as usize] {
    let val_len = value.map_or(TOMBSTONE_MARKER, |v| v.len() as u32);
    let mut header = [0u8; ENTRY_HEADER_SIZE as usize];
    header[0..4].copy_from_slice(&(key.len() as u32).to_le_bytes());
    header[4..8].copy_from_slice(&val_len.to_le_bytes());
    header
}

/// Decode an entry header into `(key_len, val_len)`; `val_len` is `None`
/// for a tombstone
pub(crate) fn parse_entry_header(header: &[u8; ENTRY_HEADER_SIZE as usize]) -> (usize, Option<usize>) {
    let key_len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let val_len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    let val_len = (val_len != TOMBSTONE_MARKER).then_some(val_len as usize);
    (key_len as usize, val_len)
}
