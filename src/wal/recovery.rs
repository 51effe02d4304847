//! WAL Recovery
//!
//! Rebuilds the sequence of acknowledged writes after a crash.
//!
//! Records are replayed in order up to the first one that fails its
//! checks. Everything from that record on is treated as a torn write and
//! the file is cut back to the last valid record.

use std::fs::OpenOptions;
use std::path::Path;

use tracing::warn;

use crate::error::{Result, RockError};

use super::{WalEntry, WalReader};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted records found (recovery stops at the first)
    pub entries_corrupted: u64,

    /// Last valid LSN (0 if none)
    pub last_lsn: u64,

    /// Byte length of the valid prefix
    pub valid_bytes: u64,

    /// Whether the WAL was truncated (torn tail removed)
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Read records until the end or the first corrupt one
    /// 2. Truncate the file to the valid prefix if anything followed it
    /// 3. Return the valid entries in order
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let (entries, mut result) = Self::scan(path)?;

        if result.entries_corrupted > 0 {
            warn!(
                path = %path.display(),
                valid_bytes = result.valid_bytes,
                last_lsn = result.last_lsn,
                "Truncating torn WAL tail"
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(result.valid_bytes)?;
            file.sync_all()?;
            result.was_truncated = true;
        }

        Ok((entries, result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        Self::scan(path).map(|(_, result)| result)
    }

    fn scan(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let mut reader = WalReader::open(path)?;
        let mut entries = Vec::new();
        let mut result = RecoveryResult::default();

        loop {
            match reader.next_entry() {
                Ok(Some(entry)) => {
                    result.entries_recovered += 1;
                    result.last_lsn = entry.lsn;
                    entries.push(entry);
                }
                Ok(None) => break,
                Err(RockError::WalCorruption(detail)) => {
                    warn!(path = %path.display(), %detail, "WAL corruption");
                    result.entries_corrupted = 1;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        result.valid_bytes = reader.position();
        Ok((entries, result))
    }
}
