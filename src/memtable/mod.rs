//! MemTable Module
//!
//! In-memory data structure for recent writes.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Apply a whole batch under one lock acquisition
//! - Track size for flush triggers
//! - Ordered iteration for SSTable creation and range scans
//!
//! ## Data Structure Choice
//! `BTreeMap` behind a `parking_lot::RwLock`: ordered keys for flushes and
//! scans, many concurrent readers, one writer.

mod table;

pub use table::{MemTable, MemTableIterator};

/// Entry stored in the MemTable
#[derive(Debug, Clone, PartialEq)]
pub enum MemTableEntry {
    /// A live value
    Value(Vec<u8>),

    /// A tombstone (deleted key)
    Tombstone,
}

impl MemTableEntry {
    /// The live value, or `None` for a tombstone
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            MemTableEntry::Value(v) => Some(v),
            MemTableEntry::Tombstone => None,
        }
    }

    /// Bytes this entry contributes to the table size
    fn footprint(&self) -> usize {
        self.value().map_or(0, <[u8]>::len)
    }
}
