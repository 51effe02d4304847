//! Per-key lock table
//!
//! A fixed array of mutexes; a key maps to `crc32(key) % shards`. Two keys
//! may share a shard, which only costs parallelism.

use parking_lot::{Mutex, MutexGuard};

/// Sharded key guards
pub struct KeyLocks {
    shards: Box<[Mutex<()>]>,
}

impl KeyLocks {
    /// Create a table with `shards` mutexes (at least one)
    pub fn new(shards: usize) -> Self {
        let shards = (0..shards.max(1)).map(|_| Mutex::new(())).collect();
        Self { shards }
    }

    /// Block until the guard for `key` is held
    pub fn lock(&self, key: &[u8]) -> MutexGuard<'_, ()> {
        self.shards[self.shard_of(key)].lock()
    }

    /// Index of the shard guarding `key`
    pub fn shard_of(&self, key: &[u8]) -> usize {
        crc32fast::hash(key) as usize % self.shards.len()
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}
