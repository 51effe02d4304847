//! Store Module
//!
//! The ordered key-value contract every command handler is written against.
//!
//! ## Responsibilities
//! - Point reads copied into the caller's arena
//! - Unconditional set/delete
//! - Atomic multi-key batches (a `None` value deletes the key)
//! - Forward ordered scans with early stop
//!
//! ## Implementations
//! - [`MemStore`]: `BTreeMap` behind a `RwLock`, for tests and `--in-memory`
//! - [`crate::engine::Engine`]: the persistent WAL + MemTable + SSTable engine

mod batch;
mod mem;

pub use batch::Batch;
pub use mem::MemStore;

use crate::arena::{Arena, ArenaBuf};
use crate::error::Result;

/// Scan callback: receives each `(key, value)` copied into the arena and
/// returns `false` to stop the scan
pub type Collector<'c> = dyn FnMut(&Arena, ArenaBuf, ArenaBuf) -> bool + 'c;

/// Ordered key-value substrate
///
/// Implementations handle their own internal locking; callers serialize
/// read-modify-write sequences themselves (see `commands::KeyLocks`).
pub trait Store: Send + Sync {
    /// Read a key, copying the value into `arena`
    fn get(&self, arena: &mut Arena, key: ArenaBuf) -> Result<Option<ArenaBuf>>;

    /// Write a single key
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove a single key (no-op if absent)
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Apply every operation in `batch` atomically
    fn batch(&self, arena: &Arena, batch: &Batch) -> Result<()>;

    /// Visit keys `>= start` in ascending order until `collector` returns false
    fn scan(&self, arena: &mut Arena, start: ArenaBuf, collector: &mut Collector<'_>) -> Result<()>;

    /// Make all acknowledged writes durable
    fn flush(&self) -> Result<()>;

    /// Flush and release resources; the store must not be used afterwards
    fn close(&self) -> Result<()>;
}
