//! SSTable Iterator
//!
//! Ordered iteration over a key range of one SSTable.

use std::collections::btree_map;

use crate::error::Result;

use super::{SSTableEntry, SSTableReader};

/// Iterator over SSTable entries in key order
///
/// Walks the in-memory index and reads each entry on demand, so an early
/// stop reads nothing past the last entry consumed.
pub struct SSTableIterator<'a> {
    reader: &'a SSTableReader,
    offsets: btree_map::Range<'a, Vec<u8>, u64>,
}

impl<'a> SSTableIterator<'a> {
    pub(super) fn new(reader: &'a SSTableReader, offsets: btree_map::Range<'a, Vec<u8>, u64>) -> Self {
        Self { reader, offsets }
    }
}

impl<'a> Iterator for SSTableIterator<'a> {
    /// `(key, value)`; a `None` value is a tombstone
    type Item = Result<SSTableEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let (_, &offset) = self.offsets.next()?;
        Some(self.reader.read_entry_at(offset))
    }
}
