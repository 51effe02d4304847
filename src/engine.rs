//! Engine Module
//!
//! The persistent [`Store`]: WAL + MemTable + SSTables.
//!
//! ## Responsibilities
//! - Log every write before applying it
//! - Apply batches atomically (one WAL record, one MemTable lock)
//! - Merge MemTable and SSTables for ordered scans
//! - Flush the MemTable when it grows past its limit
//! - Replay the WAL on startup
//!
//! ## Write Path
//! ```text
//! set / delete / batch
//!        │
//!        ▼
//!   wal.lock()  ──► WalWriter::append(op) ──► MemTable ──► size ≥ limit?
//!   (serializes                                               │ yes
//!    all writers)                                             ▼
//!                                          StorageManager::flush → clear → WAL truncate
//! ```
//!
//! ## Read Path
//! `get`: MemTable (a tombstone ends the search), then SSTables newest →
//! oldest. `scan`: [`MergingIterator`] over a MemTable range and every
//! SSTable range, holding both read guards so no flush can interleave.

use std::fs;
use std::ops::Bound;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::arena::{Arena, ArenaBuf};
use crate::config::Config;
use crate::error::Result;
use crate::memtable::{MemTable, MemTableEntry};
use crate::storage::{MergingIterator, SSTableEntry, Source, StorageManager};
use crate::store::{Batch, Collector, Store};
use crate::wal::{Operation, WalRecovery, WalWriter};

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader
///
/// - **Writes** (set/delete/batch/flush): serialized by the `wal` mutex;
///   the guard is held from the WAL append through any triggered flush
/// - **Reads** (get/scan): never take the `wal` mutex; the MemTable and
///   the SSTable list each have their own `RwLock`
pub struct Engine {
    config: Config,

    /// Directory holding the SSTables
    storage_dir: PathBuf,

    /// Write-ahead log; its mutex is the writer lock
    wal: Mutex<WalWriter>,

    memtable: MemTable,

    storage: StorageManager,
}

impl Engine {
    const WAL_FILENAME: &'static str = "wal.log";
    const SSTABLE_DIR: &'static str = "sstables";

    /// Open or create an engine
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Load existing SSTables
    /// 3. Replay the WAL into the MemTable and flush it to a new SSTable
    /// 4. Start a fresh WAL
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let storage_dir = config.data_dir.join(Self::SSTABLE_DIR);
        let wal_path = config.data_dir.join(Self::WAL_FILENAME);

        let storage = StorageManager::open(&storage_dir)?;
        let memtable = MemTable::new();

        if wal_path.exists() {
            let (entries, result) = WalRecovery::recover(&wal_path)?;
            if result.entries_recovered > 0 || result.entries_corrupted > 0 {
                info!(
                    recovered = result.entries_recovered,
                    corrupted = result.entries_corrupted,
                    last_lsn = result.last_lsn,
                    "WAL recovery"
                );
            }

            for entry in entries {
                Self::replay(&memtable, entry.operation);
            }

            // Recovered writes become durable in an SSTable before the WAL
            // is replaced
            if !memtable.is_empty() {
                info!(entries = memtable.entry_count(), "Flushing recovered entries");
                storage.flush(&memtable)?;
                memtable.clear();
            }
        }

        let wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;
        info!(dir = %config.data_dir.display(), "Engine opened");

        Ok(Self {
            config,
            storage_dir,
            wal: Mutex::new(wal),
            memtable,
            storage,
        })
    }

    /// Open with default config rooted at `path`
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    // =========================================================================
    // Internal Read/Write Paths
    // =========================================================================

    fn lookup(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.memtable.get(key) {
            return Ok(match entry {
                MemTableEntry::Value(value) => Some(value),
                MemTableEntry::Tombstone => None,
            });
        }
        self.storage.get(key)
    }

    /// Log `operation`, apply it to the MemTable, flush if over the limit
    fn write(&self, operation: Operation) -> Result<()> {
        let mut wal = self.wal.lock();
        let lsn = wal.append(&operation)?;

        let ops = operation.op_count();
        let size = Self::replay(&self.memtable, operation);
        debug!(lsn, ops, memtable_bytes = size, "Write applied");

        if self.memtable.should_flush(self.config.memtable_size_limit) {
            self.flush_locked(&mut wal)?;
        }
        Ok(())
    }

    /// Apply a logged operation to `memtable`, returning its new size
    fn replay(memtable: &MemTable, operation: Operation) -> usize {
        match operation {
            Operation::Put { key, value } => memtable.put(key, value),
            Operation::Delete { key } => memtable.delete(key),
            Operation::Batch { ops } => memtable.apply_batch(ops),
        }
    }

    /// Flush with the writer lock held
    fn flush_locked(&self, wal: &mut WalWriter) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }

        let table = self.storage.flush(&self.memtable)?;
        self.memtable.clear();
        wal.truncate()?;

        info!(
            entries = table.entry_count,
            sstables = self.storage.sstable_count(),
            "MemTable flushed"
        );
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    pub fn sstable_count(&self) -> usize {
        self.storage.sstable_count()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Store for Engine {
    fn get(&self, arena: &mut Arena, key: ArenaBuf) -> Result<Option<ArenaBuf>> {
        let value = self.lookup(arena.bytes(&key)?)?;
        Ok(value.map(|v| arena.copy_from(&v)))
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write(Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.write(Operation::Delete { key: key.to_vec() })
    }

    fn batch(&self, arena: &Arena, batch: &Batch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let ops = batch.to_owned_ops(arena)?;
        self.write(Operation::Batch { ops })
    }

    fn scan(&self, arena: &mut Arena, start: ArenaBuf, collector: &mut Collector<'_>) -> Result<()> {
        let start = arena.bytes(&start)?.to_vec();

        // Tables first: a flush publishes its SSTable before clearing the
        // MemTable, and cannot publish while this guard is held
        let tables = self.storage.tables();
        let memtable = self.memtable.read();

        let mut sources: Vec<Source<'_>> = Vec::with_capacity(tables.len() + 1);
        sources.push(Box::new(
            memtable
                .range::<[u8], _>((Bound::Included(start.as_slice()), Bound::Unbounded))
                .map(|(key, entry)| -> Result<SSTableEntry> {
                    Ok((key.clone(), entry.value().map(<[u8]>::to_vec)))
                }),
        ));
        for table in tables.iter() {
            sources.push(Box::new(table.range_from(&start)));
        }

        for item in MergingIterator::new(sources) {
            let (key, value) = item?;
            let key = arena.copy_from(&key);
            let value = arena.copy_from(&value);
            if !collector(arena, key, value) {
                break;
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut wal = self.wal.lock();
        self.flush_locked(&mut wal)
    }

    /// Flush the MemTable and sync the WAL
    fn close(&self) -> Result<()> {
        let mut wal = self.wal.lock();
        self.flush_locked(&mut wal)?;
        wal.sync()?;
        info!(dir = %self.config.data_dir.display(), "Engine closed");
        Ok(())
    }
}
