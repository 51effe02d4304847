//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{RwLock, RwLockReadGuard};

use crate::wal::BatchOp;

use super::MemTableEntry;

/// In-memory table for recent writes
///
/// `size` approximates key + value bytes held, tombstones counting their
/// key only.
pub struct MemTable {
    data: RwLock<BTreeMap<Vec<u8>, MemTableEntry>>,
    size: AtomicUsize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            size: AtomicUsize::new(0),
        }
    }

    /// Get the entry for a key; a tombstone means "deleted here"
    pub fn get(&self, key: &[u8]) -> Option<MemTableEntry> {
        self.data.read().get(key).cloned()
    }

    /// Put a key-value pair, returning the new approximate size
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> usize {
        let mut data = self.data.write();
        self.insert(&mut data, key, MemTableEntry::Value(value))
    }

    /// Record a tombstone, returning the new approximate size
    pub fn delete(&self, key: Vec<u8>) -> usize {
        let mut data = self.data.write();
        self.insert(&mut data, key, MemTableEntry::Tombstone)
    }

    /// Apply every operation under a single write lock
    pub fn apply_batch(&self, ops: Vec<BatchOp>) -> usize {
        let mut data = self.data.write();
        let mut size = self.size();
        for (key, value) in ops {
            let entry = match value {
                Some(v) => MemTableEntry::Value(v),
                None => MemTableEntry::Tombstone,
            };
            size = self.insert(&mut data, key, entry);
        }
        size
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    /// Number of keys, tombstones included
    pub fn entry_count(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Check if should flush (size >= limit)
    pub fn should_flush(&self, size_limit: usize) -> bool {
        self.size() >= size_limit
    }

    /// Snapshot of all entries in key order (for flush)
    pub fn iter(&self) -> MemTableIterator {
        let entries: Vec<_> = self
            .data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        MemTableIterator {
            inner: entries.into_iter(),
        }
    }

    /// Shared access to the map for range scans
    ///
    /// Writers block while the guard is held.
    pub fn read(&self) -> RwLockReadGuard<'_, BTreeMap<Vec<u8>, MemTableEntry>> {
        self.data.read()
    }

    /// Clear all entries (after successful flush)
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.clear();
        self.size.store(0, Ordering::Release);
    }

    fn insert(&self, data: &mut BTreeMap<Vec<u8>, MemTableEntry>, key: Vec<u8>, entry: MemTableEntry) -> usize {
        let added = entry.footprint();
        let key_len = key.len();

        let size = match data.insert(key, entry) {
            // Key bytes were already counted
            Some(old) => self.size() - old.footprint() + added,
            None => self.size() + key_len + added,
        };
        self.size.store(size, Ordering::Release);
        size
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a snapshot of MemTable entries
pub struct MemTableIterator {
    inner: std::vec::IntoIter<(Vec<u8>, MemTableEntry)>,
}

impl Iterator for MemTableIterator {
    type Item = (Vec<u8>, MemTableEntry);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
