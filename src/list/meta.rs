//! List metadata record

use crate::error::{Result, RockError};

/// Decoded 16-byte list metadata record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMeta {
    /// Number of live elements
    pub count: u32,
    /// Sequence number of the head element
    pub min_seq: u32,
    /// Unix seconds when the list was created
    pub created_at: u32,
    /// Unix seconds of the last mutation
    pub updated_at: u32,
}

impl ListMeta {
    /// Encoded size in bytes
    pub const ENCODED_LEN: usize = 16;

    /// Metadata for a new list of `count` elements starting at `min_seq`
    pub fn new(count: u32, min_seq: u32, now: u32) -> Self {
        Self {
            count,
            min_seq,
            created_at: now,
            updated_at: now,
        }
    }

    /// Parse a stored record
    ///
    /// Anything other than exactly 16 bytes, or a window `min_seq + count`
    /// outside the u32 sequence space, is corrupt data for this key.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::ENCODED_LEN {
            return Err(RockError::Encoding(format!(
                "list metadata must be {} bytes, got {}",
                Self::ENCODED_LEN,
                bytes.len()
            )));
        }

        let field = |at: usize| u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);

        let meta = Self {
            count: field(0),
            min_seq: field(4),
            created_at: field(8),
            updated_at: field(12),
        };

        // Element seqs are u32; a window running past u32::MAX cannot exist
        if meta.end_seq() > u32::MAX as u64 + 1 {
            return Err(RockError::Encoding(format!(
                "list metadata window {}+{} overflows the sequence space",
                meta.min_seq, meta.count
            )));
        }

        Ok(meta)
    }

    /// Serialize to the stored layout
    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[0..4].copy_from_slice(&self.count.to_be_bytes());
        out[4..8].copy_from_slice(&self.min_seq.to_be_bytes());
        out[8..12].copy_from_slice(&self.created_at.to_be_bytes());
        out[12..16].copy_from_slice(&self.updated_at.to_be_bytes());
        out
    }

    /// Sequence number one past the tail element
    pub fn end_seq(&self) -> u64 {
        self.min_seq as u64 + self.count as u64
    }
}
