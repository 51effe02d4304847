//! Write batches
//!
//! A batch is a parallel pair of key and value sequences whose buffers live
//! in the request arena. A `None` value at index `i` deletes `keys[i]`.

use crate::arena::{Arena, ArenaBuf};
use crate::error::Result;

/// Keys and values to apply atomically
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    keys: Vec<ArenaBuf>,
    values: Vec<Option<ArenaBuf>>,
}

impl Batch {
    /// Create a batch sized for `capacity` operations
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Queue a write of `value` under `key`
    pub fn put(&mut self, key: ArenaBuf, value: ArenaBuf) {
        self.keys.push(key);
        self.values.push(Some(value));
    }

    /// Queue a delete of `key`
    pub fn delete(&mut self, key: ArenaBuf) {
        self.keys.push(key);
        self.values.push(None);
    }

    pub fn keys(&self) -> &[ArenaBuf] {
        &self.keys
    }

    pub fn values(&self) -> &[Option<ArenaBuf>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate operations as `(key, value)` handle pairs
    pub fn iter(&self) -> impl Iterator<Item = (ArenaBuf, Option<ArenaBuf>)> + '_ {
        self.keys.iter().copied().zip(self.values.iter().copied())
    }

    /// Copy every operation out of the arena
    ///
    /// Used by stores that must own the bytes past the request (WAL, memtable).
    pub fn to_owned_ops(&self, arena: &Arena) -> Result<Vec<(Vec<u8>, Option<Vec<u8>>)>> {
        self.iter()
            .map(|(key, value)| -> Result<(Vec<u8>, Option<Vec<u8>>)> {
                let key = arena.bytes(&key)?.to_vec();
                let value = match value {
                    Some(v) => Some(arena.bytes(&v)?.to_vec()),
                    None => None,
                };
                Ok((key, value))
            })
            .collect()
    }
}
