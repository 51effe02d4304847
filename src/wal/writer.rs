//! WAL Writer
//!
//! Handles appending records to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::WalSyncStrategy;
use crate::error::{Result, RockError};

use super::{Operation, WalEntry};

/// Writes records to the WAL file
pub struct WalWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    /// LSN of the last appended record (0 before the first)
    current_lsn: u64,
    sync_strategy: WalSyncStrategy,
    /// Records appended since the last sync
    uncommitted: usize,
}

impl WalWriter {
    /// Create an empty WAL file, replacing any existing one
    ///
    /// Callers recover the previous contents first.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            current_lsn: 0,
            sync_strategy,
            uncommitted: 0,
        })
    }

    /// Append an operation, returning its LSN
    ///
    /// The record reaches the OS before this returns, so it survives the
    /// process dying; the sync strategy only decides when it is fsynced.
    pub fn append(&mut self, operation: &Operation) -> Result<u64> {
        let lsn = self.current_lsn + 1;
        let entry = WalEntry::new(lsn, operation.clone());
        let record = entry.encode_record()?;

        self.writer
            .write_all(&record)
            .and_then(|_| self.writer.flush())
            .map_err(|e| RockError::WalWrite(format!("append lsn {}: {}", lsn, e)))?;
        self.current_lsn = lsn;
        self.uncommitted += 1;

        match self.sync_strategy {
            WalSyncStrategy::EveryWrite => self.sync()?,
            WalSyncStrategy::EveryNEntries { count } => {
                if self.uncommitted >= count {
                    self.sync()?;
                }
            }
        }

        Ok(lsn)
    }

    /// Fsync appended records
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.uncommitted = 0;
        Ok(())
    }

    /// Drop every record (their effects are durable elsewhere)
    ///
    /// LSNs keep increasing across truncations.
    pub fn truncate(&mut self) -> Result<()> {
        self.writer.flush()?;
        let file = self.writer.get_mut();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.sync_all()?;
        self.uncommitted = 0;

        debug!(path = %self.path.display(), lsn = self.current_lsn, "WAL truncated");
        Ok(())
    }

    /// LSN of the last appended record
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    /// Records appended since the last sync
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
