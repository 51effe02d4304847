//! Arena Module
//!
//! Per-connection bump allocator for request-scoped byte buffers.
//!
//! ## Responsibilities
//! - Serve short-lived buffers (request arguments, encoded keys, metadata
//!   records, values read back from the store) without touching the global
//!   allocator on the hot path
//! - Reset in O(1) between requests
//! - Detect use of a buffer after the reset that invalidated it
//!
//! ## Handles
//! [`Arena::allocate`] returns an [`ArenaBuf`], a small `Copy` handle that
//! records where the bytes live and which **epoch** they were allocated in.
//! Bytes are reached through [`Arena::bytes`] / [`Arena::bytes_mut`], which
//! compare the handle's epoch against the arena's. [`Arena::reset`] bumps
//! the epoch, so every handle issued before it resolves to
//! [`RockError::StaleArenaBuffer`] instead of silently reading bytes that
//! now belong to a later request.
//!
//! ## Allocation Policy
//! ```text
//! size <= remaining       → bump the cursor in the current backing buffer
//! size >  capacity        → dedicated buffer, dropped on reset
//! otherwise               → retire the current backing buffer, start a fresh
//!                           one of the same capacity, serve from its start
//! ```
//! Retired backing buffers stay alive until the next reset so handles into
//! them keep resolving for the rest of the request.

use crate::error::{Result, RockError};

/// Handle to a buffer allocated from an [`Arena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaBuf {
    /// Arena epoch when this allocation was made
    epoch: u32,
    /// Which backing buffer holds the bytes
    region: Region,
    /// Byte offset within the backing buffer
    offset: u32,
    /// Length in bytes
    len: u32,
}

/// Backing buffer a handle points into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    /// Index into the pooled backing buffers (last one is current)
    Pooled(u32),
    /// Index into the oversized, unpooled buffers
    Oversized(u32),
}

impl ArenaBuf {
    /// Length of the buffer in bytes
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether the buffer is zero-length
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Epoch this buffer was allocated in
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Byte offset within its backing buffer
    pub fn offset(&self) -> usize {
        self.offset as usize
    }

    /// Whether the buffer was served from the pooled backing region
    pub fn is_pooled(&self) -> bool {
        matches!(self.region, Region::Pooled(_))
    }

    /// View of the same bytes without the first `skip` bytes
    ///
    /// `skip` is clamped to the buffer length.
    pub fn suffix(&self, skip: usize) -> ArenaBuf {
        let skip = skip.min(self.len()) as u32;
        ArenaBuf {
            offset: self.offset + skip,
            len: self.len - skip,
            ..*self
        }
    }

    fn range(&self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.len as usize
    }
}

/// One piece of a buffer assembled by [`Arena::concat`]
#[derive(Debug, Clone, Copy)]
pub enum Piece<'a> {
    /// Bytes owned outside the arena
    Bytes(&'a [u8]),
    /// Bytes already in the arena
    Buf(ArenaBuf),
}

/// Bump allocator with epoch-checked handles
pub struct Arena {
    /// Pooled backing buffers; the last one is current, earlier ones are
    /// retired and released on the next reset
    pooled: Vec<Box<[u8]>>,
    /// Buffers larger than the backing capacity
    oversized: Vec<Box<[u8]>>,
    /// Capacity of each pooled backing buffer
    capacity: usize,
    /// Bump cursor into the current backing buffer
    offset: usize,
    /// Incremented on every reset
    epoch: u32,
}

impl Arena {
    /// Create an arena whose backing buffer holds `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            pooled: vec![vec![0u8; capacity].into_boxed_slice()],
            oversized: Vec::new(),
            capacity,
            offset: 0,
            epoch: 0,
        }
    }

    /// Allocate `size` bytes
    ///
    /// Contents are whatever an earlier request left there; callers must
    /// overwrite the buffer before reading it.
    pub fn allocate(&mut self, size: usize) -> ArenaBuf {
        if size <= self.capacity - self.offset {
            let offset = self.offset;
            self.offset += size;
            return self.handle(Region::Pooled(self.current_index()), offset, size);
        }

        if size > self.capacity {
            self.oversized.push(vec![0u8; size].into_boxed_slice());
            let index = (self.oversized.len() - 1) as u32;
            return self.handle(Region::Oversized(index), 0, size);
        }

        // Fits in a fresh backing buffer but not in what is left of this one
        self.pooled
            .push(vec![0u8; self.capacity].into_boxed_slice());
        self.offset = size;
        self.handle(Region::Pooled(self.current_index()), 0, size)
    }

    /// Allocate a buffer holding a copy of `src`
    pub fn copy_from(&mut self, src: &[u8]) -> ArenaBuf {
        let buf = self.allocate(src.len());
        let range = buf.range();
        self.backing_mut(buf.region)[range].copy_from_slice(src);
        buf
    }

    /// Allocate a buffer holding the concatenation of `pieces`
    pub fn concat(&mut self, pieces: &[Piece<'_>]) -> Result<ArenaBuf> {
        let mut total = 0usize;
        for piece in pieces {
            total += match piece {
                Piece::Bytes(bytes) => bytes.len(),
                Piece::Buf(buf) => {
                    self.check(buf)?;
                    buf.len()
                }
            };
        }

        let dst = self.allocate(total);
        let mut at = dst.offset();
        for piece in pieces {
            match piece {
                Piece::Bytes(bytes) => {
                    self.backing_mut(dst.region)[at..at + bytes.len()].copy_from_slice(bytes);
                    at += bytes.len();
                }
                Piece::Buf(src) => {
                    self.copy_between(*src, dst.region, at);
                    at += src.len();
                }
            }
        }

        Ok(dst)
    }

    /// Resolve a handle to its bytes
    pub fn bytes(&self, buf: &ArenaBuf) -> Result<&[u8]> {
        self.check(buf)?;
        Ok(&self.backing(buf.region)[buf.range()])
    }

    /// Resolve a handle to its bytes for writing
    pub fn bytes_mut(&mut self, buf: &ArenaBuf) -> Result<&mut [u8]> {
        self.check(buf)?;
        Ok(&mut self.backing_mut(buf.region)[buf.range()])
    }

    /// Invalidate every outstanding handle and rewind the cursor
    ///
    /// Contents are not cleared. Retired and oversized buffers are released.
    pub fn reset(&mut self) {
        if self.pooled.len() > 1 {
            let current = self.pooled.len() - 1;
            self.pooled.swap(0, current);
            self.pooled.truncate(1);
        }
        self.oversized.clear();
        self.offset = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Current epoch (number of resets so far, wrapping)
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Bytes handed out from the current backing buffer
    pub fn used(&self) -> usize {
        self.offset
    }

    /// Capacity of each pooled backing buffer
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn current_index(&self) -> u32 {
        (self.pooled.len() - 1) as u32
    }

    fn handle(&self, region: Region, offset: usize, len: usize) -> ArenaBuf {
        ArenaBuf {
            epoch: self.epoch,
            region,
            offset: offset as u32,
            len: len as u32,
        }
    }

    /// Verify a handle belongs to the current epoch and lies in bounds
    fn check(&self, buf: &ArenaBuf) -> Result<()> {
        let stale = || RockError::StaleArenaBuffer {
            buffer_epoch: buf.epoch,
            arena_epoch: self.epoch,
        };

        if buf.epoch != self.epoch {
            return Err(stale());
        }

        let backing_len = match buf.region {
            Region::Pooled(i) => self.pooled.get(i as usize).map(|b| b.len()),
            Region::Oversized(i) => self.oversized.get(i as usize).map(|b| b.len()),
        };

        match backing_len {
            Some(len) if buf.range().end <= len => Ok(()),
            _ => Err(stale()),
        }
    }

    fn backing(&self, region: Region) -> &[u8] {
        match region {
            Region::Pooled(i) => &self.pooled[i as usize][..],
            Region::Oversized(i) => &self.oversized[i as usize][..],
        }
    }

    fn backing_mut(&mut self, region: Region) -> &mut [u8] {
        match region {
            Region::Pooled(i) => &mut self.pooled[i as usize][..],
            Region::Oversized(i) => &mut self.oversized[i as usize][..],
        }
    }

    /// Copy a checked source handle into `dst` at byte offset `at`
    fn copy_between(&mut self, src: ArenaBuf, dst: Region, at: usize) {
        let src_range = src.range();

        if src.region == dst {
            self.backing_mut(dst).copy_within(src_range, at);
            return;
        }

        let len = src.len();
        let Arena {
            pooled, oversized, ..
        } = self;

        let (from, to): (&[u8], &mut [u8]) = match (src.region, dst) {
            (Region::Pooled(s), Region::Oversized(d)) => {
                (&pooled[s as usize][..], &mut oversized[d as usize][..])
            }
            (Region::Oversized(s), Region::Pooled(d)) => {
                (&oversized[s as usize][..], &mut pooled[d as usize][..])
            }
            (Region::Pooled(s), Region::Pooled(d)) => split_pair(pooled, s as usize, d as usize),
            (Region::Oversized(s), Region::Oversized(d)) => {
                split_pair(oversized, s as usize, d as usize)
            }
        };

        to[at..at + len].copy_from_slice(&from[src_range]);
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(32 * 1024)
    }
}

/// Borrow two distinct backing buffers, one shared and one mutable
fn split_pair(buffers: &mut [Box<[u8]>], src: usize, dst: usize) -> (&[u8], &mut [u8]) {
    if src < dst {
        let (lo, hi) = buffers.split_at_mut(dst);
        (&lo[src][..], &mut hi[0][..])
    } else {
        let (lo, hi) = buffers.split_at_mut(src);
        (&hi[0][..], &mut lo[dst][..])
    }
}
