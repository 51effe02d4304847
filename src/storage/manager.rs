//! Storage Manager
//!
//! Owns the set of open SSTables.
//!
//! ## Responsibilities
//! - Discover existing SSTables on startup
//! - Search SSTables newest → oldest for reads
//! - Turn a MemTable into a new SSTable on flush
//! - Hand out a stable view of all tables for scans

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockReadGuard};
use tracing::{debug, info};

use crate::error::{Result, RockError};
use crate::memtable::MemTable;

use super::{SSTable, SSTableBuilder, SSTableReader};

/// Manages the storage layer
///
/// ## Concurrency
/// - `sstables`: `RwLock`; lookups and scans share it, a flush takes it
///   exclusively only to publish the new table
/// - `next_sstable_id`: atomic counter
pub struct StorageManager {
    dir: PathBuf,

    /// Open readers, ordered newest → oldest
    sstables: RwLock<Vec<SSTableReader>>,

    next_sstable_id: AtomicU64,
}

impl StorageManager {
    /// Open or create storage in `path`, loading every `sstable_*.sst`
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;

        let mut ids = Vec::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.is_file() {
                if let Some(id) = Self::parse_sstable_id(&file_path) {
                    ids.push(id);
                }
            }
        }
        ids.sort_unstable_by(|a, b| b.cmp(a));

        let sstables = ids
            .iter()
            .map(|&id| SSTableReader::open(&Self::sstable_path_in(path, id)))
            .collect::<Result<Vec<_>>>()?;

        let next_id = ids.first().map_or(1, |&id| id + 1);
        info!(dir = %path.display(), sstables = sstables.len(), "Storage opened");

        Ok(Self {
            dir: path.to_path_buf(),
            sstables: RwLock::new(sstables),
            next_sstable_id: AtomicU64::new(next_id),
        })
    }

    /// Look a key up in every SSTable, newest first
    ///
    /// `Ok(None)` covers both "never written" and "deleted".
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let sstables = self.sstables.read();

        for reader in sstables.iter() {
            if !reader.might_contain(key) {
                continue;
            }
            match reader.get(key) {
                Ok(value) => return Ok(value),
                Err(RockError::KeyNotFound) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }

    /// Write `memtable` out as a new SSTable and publish it as the newest
    pub fn flush(&self, memtable: &MemTable) -> Result<SSTable> {
        if memtable.is_empty() {
            return Err(RockError::Storage("cannot flush an empty MemTable".to_string()));
        }

        let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
        let path = self.sstable_path(id);

        let mut builder = SSTableBuilder::new(&path)?;
        for (key, entry) in memtable.iter() {
            builder.add_entry(&key, entry.value())?;
        }
        let table = builder.finish()?;
        let reader = SSTableReader::open(&path)?;

        self.sstables.write().insert(0, reader);
        debug!(
            path = %table.path.display(),
            entries = table.entry_count,
            bytes = table.file_size,
            "SSTable written"
        );

        Ok(table)
    }

    /// Shared view of every table, newest first
    ///
    /// Flushes wait for the guard to be dropped before publishing.
    pub fn tables(&self) -> RwLockReadGuard<'_, Vec<SSTableReader>> {
        self.sstables.read()
    }

    pub fn sstable_count(&self) -> usize {
        self.sstables.read().len()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn next_sstable_id(&self) -> u64 {
        self.next_sstable_id.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn sstable_path(&self, id: u64) -> PathBuf {
        Self::sstable_path_in(&self.dir, id)
    }

    fn sstable_path_in(dir: &Path, id: u64) -> PathBuf {
        dir.join(format!("sstable_{:06}.sst", id))
    }

    /// "sstable_000042.sst" → Some(42)
    fn parse_sstable_id(path: &Path) -> Option<u64> {
        if path.extension()? != "sst" {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        stem.strip_prefix("sstable_")?.parse().ok()
    }
}
