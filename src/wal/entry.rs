//! WAL Entry definitions
//!
//! Defines the structure of individual WAL records.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RockError};

/// Record header: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// One operation inside a batch; `None` deletes the key
pub type BatchOp = (Vec<u8>, Option<Vec<u8>>);

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to perform
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Delete a key
    Delete { key: Vec<u8> },

    /// Several puts and deletes replayed all-or-nothing
    Batch { ops: Vec<BatchOp> },
}

impl WalEntry {
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| RockError::Serialization(e.to_string()))
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| RockError::Serialization(e.to_string()))
    }

    /// Full on-disk record: header followed by the serialized entry
    pub fn encode_record(&self) -> Result<Vec<u8>> {
        let data = self.serialize()?;
        let len = u32::try_from(data.len())
            .map_err(|_| RockError::WalWrite(format!("entry too large: {} bytes", data.len())))?;

        let mut record = Vec::with_capacity(HEADER_SIZE + data.len());
        record.extend_from_slice(&self.lsn.to_le_bytes());
        record.extend_from_slice(&crc32fast::hash(&data).to_le_bytes());
        record.extend_from_slice(&len.to_le_bytes());
        record.extend_from_slice(&data);
        Ok(record)
    }
}

impl Operation {
    /// Number of key operations this record carries
    pub fn op_count(&self) -> usize {
        match self {
            Operation::Put { .. } | Operation::Delete { .. } => 1,
            Operation::Batch { ops } => ops.len(),
        }
    }
}
