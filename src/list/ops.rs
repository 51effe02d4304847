//! List operations
//!
//! Each mutation takes the current metadata (if any) and returns the
//! [`Batch`] that moves the list to its next state. Nothing here writes to
//! the store; [`range`] and [`pop`] only read from it.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::arena::{Arena, ArenaBuf};
use crate::error::{Result, RockError};
use crate::store::{Batch, Store};

use super::keys::{data_key, data_prefix};
use super::meta::ListMeta;
use super::SEQ_START;

/// Which end of a list an operation works on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    Head,
    Tail,
}

/// Current time in whole unix seconds
pub fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

// =============================================================================
// Mutations
// =============================================================================

/// Batch creating a new list holding `values` in order
///
/// Element `i` is stored at `SEQ_START + i`.
pub fn create(arena: &mut Arena, meta_key: ArenaBuf, values: &[ArenaBuf], now: u32) -> Result<Batch> {
    if values.is_empty() {
        return Ok(Batch::default());
    }

    let count = seq_count(values.len())?;
    check_window(SEQ_START as u64, count as u64)?;

    let meta = ListMeta::new(count, SEQ_START, now);
    let mut batch = Batch::with_capacity(values.len() + 1);
    put_meta(arena, &mut batch, meta_key, &meta);
    put_elements(arena, &mut batch, meta_key, SEQ_START, values.iter().copied())?;
    Ok(batch)
}

/// Batch appending `values` after the tail
pub fn rpush(
    arena: &mut Arena,
    meta_key: ArenaBuf,
    meta: &ListMeta,
    values: &[ArenaBuf],
    now: u32,
) -> Result<Batch> {
    if values.is_empty() {
        return Ok(Batch::default());
    }

    let added = seq_count(values.len())?;
    let count = meta.count.checked_add(added).ok_or(RockError::SeqExhausted)?;
    check_window(meta.min_seq as u64, count as u64)?;

    let first = meta.end_seq() as u32;
    let next = ListMeta {
        count,
        updated_at: now,
        ..*meta
    };

    let mut batch = Batch::with_capacity(values.len() + 1);
    put_meta(arena, &mut batch, meta_key, &next);
    put_elements(arena, &mut batch, meta_key, first, values.iter().copied())?;
    Ok(batch)
}

/// Batch prepending `values` before the head
///
/// Value `i` lands at `min_seq - i - 1`, so the last argument ends up at
/// the head of the list.
pub fn lpush(
    arena: &mut Arena,
    meta_key: ArenaBuf,
    meta: &ListMeta,
    values: &[ArenaBuf],
    now: u32,
) -> Result<Batch> {
    if values.is_empty() {
        return Ok(Batch::default());
    }

    let added = seq_count(values.len())?;
    let min_seq = meta.min_seq.checked_sub(added).ok_or(RockError::SeqExhausted)?;
    let count = meta.count.checked_add(added).ok_or(RockError::SeqExhausted)?;

    let next = ListMeta {
        count,
        min_seq,
        updated_at: now,
        ..*meta
    };

    // Walking the arguments backwards from the new head gives ascending seqs
    let mut batch = Batch::with_capacity(values.len() + 1);
    put_meta(arena, &mut batch, meta_key, &next);
    put_elements(arena, &mut batch, meta_key, min_seq, values.iter().rev().copied())?;
    Ok(batch)
}

/// Batch removing `left` elements from the head and `right` from the tail
///
/// When nothing would remain, the metadata and every element key are
/// deleted and the list goes back to absent.
pub fn trim(
    arena: &mut Arena,
    meta_key: ArenaBuf,
    meta: &ListMeta,
    left: u32,
    right: u32,
    now: u32,
) -> Result<Batch> {
    let removed = left as u64 + right as u64;
    let end = meta.end_seq();

    if removed >= meta.count as u64 {
        let mut batch = Batch::with_capacity(meta.count as usize + 1);
        batch.delete(meta_key);
        delete_elements(arena, &mut batch, meta_key, meta.min_seq as u64..end)?;
        return Ok(batch);
    }

    let next = ListMeta {
        count: meta.count - left - right,
        min_seq: meta.min_seq + left,
        updated_at: now,
        ..*meta
    };

    let mut batch = Batch::with_capacity(removed as usize + 1);
    put_meta(arena, &mut batch, meta_key, &next);
    delete_elements(arena, &mut batch, meta_key, meta.min_seq as u64..meta.min_seq as u64 + left as u64)?;
    delete_elements(arena, &mut batch, meta_key, end - right as u64..end)?;
    Ok(batch)
}

// =============================================================================
// Reads
// =============================================================================

/// Length of a list, 0 when absent
pub fn llen(meta: Option<&ListMeta>) -> u32 {
    meta.map_or(0, |m| m.count)
}

/// Map inclusive, possibly negative indices onto `[0, count)`
///
/// Returns `None` when the range selects nothing.
pub fn normalize_range(count: u32, start: i64, end: i64) -> Option<(u32, u32)> {
    let count = count as i64;
    let mut start = if start < 0 { start + count } else { start };
    let mut end = if end < 0 { end + count } else { end };

    if start < 0 {
        start = 0;
    }
    if start > end || start >= count {
        return None;
    }
    if end >= count {
        end = count - 1;
    }

    Some((start as u32, end as u32))
}

/// Elements `start..=end` (normalized like [`normalize_range`]) in order
///
/// One forward scan from the first selected element key. Keys of other
/// lists whose user key extends this one (`a` and `a:...`) can sort inside
/// this list's key range; they are skipped. Every collected key must carry
/// the next expected seq, so a missing record is an `Encoding` error.
pub fn range(
    store: &dyn Store,
    arena: &mut Arena,
    meta_key: ArenaBuf,
    meta: &ListMeta,
    start: i64,
    end: i64,
) -> Result<Vec<ArenaBuf>> {
    let Some((start, end)) = normalize_range(meta.count, start, end) else {
        return Ok(Vec::new());
    };

    let wanted = (end - start + 1) as usize;
    let first_seq = meta.min_seq + start;
    let first = data_key(arena, meta_key, first_seq)?;
    let prefix = data_prefix(arena, meta_key)?;
    let own_len = prefix.len() + 4;

    let mut out = Vec::with_capacity(wanted);
    let mut expected = first_seq;
    let mut found: Option<u32> = None;

    store.scan(arena, first, &mut |arena: &Arena, key: ArenaBuf, value: ArenaBuf| {
        let Ok(key) = arena.bytes(&key) else {
            return false;
        };
        if !key.starts_with(&prefix) {
            return false;
        }
        if key.len() != own_len {
            return true;
        }

        let seq = u32::from_be_bytes([key[own_len - 4], key[own_len - 3], key[own_len - 2], key[own_len - 1]]);
        if seq != expected {
            found = Some(seq);
            return false;
        }

        out.push(value);
        expected = expected.wrapping_add(1);
        out.len() < wanted
    })?;

    if let Some(seq) = found {
        return Err(RockError::Encoding(format!(
            "list element record {} missing, next record is {}",
            expected, seq
        )));
    }
    if out.len() != wanted {
        return Err(RockError::Encoding(format!(
            "list has {} element records in range, metadata expects {}",
            out.len(),
            wanted
        )));
    }

    Ok(out)
}

/// Read up to `n` elements from one end and build the batch removing them
///
/// Values come back in pop order: head first for [`End::Head`], tail first
/// for [`End::Tail`].
pub fn pop(
    store: &dyn Store,
    arena: &mut Arena,
    meta_key: ArenaBuf,
    meta: &ListMeta,
    end: End,
    n: u32,
    now: u32,
) -> Result<(Vec<ArenaBuf>, Batch)> {
    let n = n.min(meta.count);
    if n == 0 {
        return Ok((Vec::new(), Batch::default()));
    }

    let count = meta.count as i64;
    let (values, left, right) = match end {
        End::Head => (range(store, arena, meta_key, meta, 0, n as i64 - 1)?, n, 0),
        End::Tail => {
            let mut values = range(store, arena, meta_key, meta, count - n as i64, count - 1)?;
            values.reverse();
            (values, 0, n)
        }
    };

    let batch = trim(arena, meta_key, meta, left, right, now)?;
    Ok((values, batch))
}

/// Translate `LTRIM start stop` into head and tail removal counts
pub fn ltrim_counts(meta: &ListMeta, start: i64, stop: i64) -> (u32, u32) {
    match normalize_range(meta.count, start, stop) {
        Some((start, stop)) => (start, meta.count - 1 - stop),
        None => (meta.count, 0),
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn seq_count(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| RockError::SeqExhausted)
}

/// The last seq of a window `[min_seq, min_seq + count)` must fit in a u32
fn check_window(min_seq: u64, count: u64) -> Result<()> {
    if min_seq + count > u32::MAX as u64 + 1 {
        return Err(RockError::SeqExhausted);
    }
    Ok(())
}

fn put_meta(arena: &mut Arena, batch: &mut Batch, meta_key: ArenaBuf, meta: &ListMeta) {
    let value = arena.copy_from(&meta.encode());
    batch.put(meta_key, value);
}

fn put_elements(
    arena: &mut Arena,
    batch: &mut Batch,
    meta_key: ArenaBuf,
    first: u32,
    values: impl Iterator<Item = ArenaBuf>,
) -> Result<()> {
    for (i, value) in values.enumerate() {
        let key = data_key(arena, meta_key, first + i as u32)?;
        batch.put(key, value);
    }
    Ok(())
}

fn delete_elements(
    arena: &mut Arena,
    batch: &mut Batch,
    meta_key: ArenaBuf,
    seqs: std::ops::Range<u64>,
) -> Result<()> {
    for seq in seqs {
        let key = data_key(arena, meta_key, seq as u32)?;
        batch.delete(key);
    }
    Ok(())
}
