//! In-memory store
//!
//! Ordered map behind a single `RwLock`. Batches are applied under one
//! write-lock acquisition, so readers never observe half a batch.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use crate::arena::{Arena, ArenaBuf};
use crate::error::Result;

use super::{Batch, Collector, Store};

/// `BTreeMap`-backed [`Store`]
#[derive(Default)]
pub struct MemStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Owned copy of every key with the given prefix, in order
    pub fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Vec<u8>> {
        self.data
            .read()
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect()
    }
}

impl Store for MemStore {
    fn get(&self, arena: &mut Arena, key: ArenaBuf) -> Result<Option<ArenaBuf>> {
        let data = self.data.read();
        let found = data.get(arena.bytes(&key)?);
        Ok(found.map(|value| arena.copy_from(value)))
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn batch(&self, arena: &Arena, batch: &Batch) -> Result<()> {
        // Resolve every handle before taking the lock so a stale buffer
        // cannot leave a partially applied batch behind
        let mut ops = Vec::with_capacity(batch.len());
        for (key, value) in batch.iter() {
            let value = match value {
                Some(v) => Some(arena.bytes(&v)?),
                None => None,
            };
            ops.push((arena.bytes(&key)?, value));
        }

        let mut data = self.data.write();
        for (key, value) in ops {
            match value {
                Some(v) => {
                    data.insert(key.to_vec(), v.to_vec());
                }
                None => {
                    data.remove(key);
                }
            }
        }
        Ok(())
    }

    fn scan(&self, arena: &mut Arena, start: ArenaBuf, collector: &mut Collector<'_>) -> Result<()> {
        let data = self.data.read();
        let range = data.range::<[u8], _>((Bound::Included(arena.bytes(&start)?), Bound::Unbounded));

        for (key, value) in range {
            let key = arena.copy_from(key);
            let value = arena.copy_from(value);
            if !collector(arena, key, value) {
                break;
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
