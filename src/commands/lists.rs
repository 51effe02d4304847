//! List commands
//!
//! Every handler that reads metadata and then writes a batch holds the
//! key's guard from [`super::KeyLocks`] across the whole sequence.

use crate::arena::{Arena, ArenaBuf};
use crate::error::{Result, RockError};
use crate::list::{self, End, ListMeta};
use crate::protocol::Reply;

use super::{parse_int, Context};

/// Fetch and decode the metadata record under `meta_key`
pub(crate) fn read_meta(ctx: &Context, arena: &mut Arena, meta_key: ArenaBuf) -> Result<Option<ListMeta>> {
    match ctx.store.get(arena, meta_key)? {
        Some(buf) => Ok(Some(ListMeta::decode(arena.bytes(&buf)?)?)),
        None => Ok(None),
    }
}

// =============================================================================
// Push
// =============================================================================

/// `LPUSH key value [value ...]`
pub fn lpush(ctx: &Context, arena: &mut Arena, args: &[ArenaBuf]) -> Result<Reply> {
    push(ctx, arena, args, End::Head)
}

/// `RPUSH key value [value ...]`
pub fn rpush(ctx: &Context, arena: &mut Arena, args: &[ArenaBuf]) -> Result<Reply> {
    push(ctx, arena, args, End::Tail)
}

fn push(ctx: &Context, arena: &mut Arena, args: &[ArenaBuf], end: End) -> Result<Reply> {
    let (user_key, values) = (args[0], &args[1..]);
    let meta_key = list::meta_key(arena, user_key)?;
    let _guard = ctx.locks.lock(arena.bytes(&meta_key)?);
    let now = list::unix_now();

    let (len, batch) = match read_meta(ctx, arena, meta_key)? {
        None if end == End::Head => {
            let reversed: Vec<ArenaBuf> = values.iter().rev().copied().collect();
            (values.len() as u64, list::create(arena, meta_key, &reversed, now)?)
        }
        None => (values.len() as u64, list::create(arena, meta_key, values, now)?),
        Some(meta) => {
            let batch = match end {
                End::Head => list::lpush(arena, meta_key, &meta, values, now)?,
                End::Tail => list::rpush(arena, meta_key, &meta, values, now)?,
            };
            (meta.count as u64 + values.len() as u64, batch)
        }
    };

    ctx.store.batch(arena, &batch)?;
    Ok(Reply::count(len))
}

// =============================================================================
// Read
// =============================================================================

/// `LRANGE key start stop`
pub fn lrange(ctx: &Context, arena: &mut Arena, args: &[ArenaBuf]) -> Result<Reply> {
    let start = parse_int(arena, &args[1])?;
    let stop = parse_int(arena, &args[2])?;

    let meta_key = list::meta_key(arena, args[0])?;
    let _guard = ctx.locks.lock(arena.bytes(&meta_key)?);

    let values = match read_meta(ctx, arena, meta_key)? {
        Some(meta) => list::range(ctx.store.as_ref(), arena, meta_key, &meta, start, stop)?,
        None => Vec::new(),
    };
    Ok(Reply::MultiBulk(values))
}

/// `LLEN key`
pub fn llen(ctx: &Context, arena: &mut Arena, args: &[ArenaBuf]) -> Result<Reply> {
    let meta_key = list::meta_key(arena, args[0])?;
    let meta = read_meta(ctx, arena, meta_key)?;
    Ok(Reply::count(list::llen(meta.as_ref())))
}

// =============================================================================
// Pop / Trim
// =============================================================================

/// `LPOP key [count]`
pub fn lpop(ctx: &Context, arena: &mut Arena, args: &[ArenaBuf]) -> Result<Reply> {
    pop(ctx, arena, args, End::Head)
}

/// `RPOP key [count]`
pub fn rpop(ctx: &Context, arena: &mut Arena, args: &[ArenaBuf]) -> Result<Reply> {
    pop(ctx, arena, args, End::Tail)
}

fn pop(ctx: &Context, arena: &mut Arena, args: &[ArenaBuf], end: End) -> Result<Reply> {
    let name = match end {
        End::Head => "lpop",
        End::Tail => "rpop",
    };

    // Without a count the reply is a single bulk; with one it is an array
    let count = match args {
        [_] => None,
        [_, count] => {
            let n = parse_int(arena, count)?;
            Some(u32::try_from(n).map_err(|_| RockError::NotInteger)?)
        }
        _ => return Err(RockError::WrongArity(name.to_string())),
    };

    let meta_key = list::meta_key(arena, args[0])?;
    let _guard = ctx.locks.lock(arena.bytes(&meta_key)?);

    let Some(meta) = read_meta(ctx, arena, meta_key)? else {
        return Ok(match count {
            None => Reply::Null,
            Some(_) => Reply::NullArray,
        });
    };

    let (values, batch) = list::pop(
        ctx.store.as_ref(),
        arena,
        meta_key,
        &meta,
        end,
        count.unwrap_or(1),
        list::unix_now(),
    )?;
    if !batch.is_empty() {
        ctx.store.batch(arena, &batch)?;
    }

    Ok(match count {
        None => values.first().map_or(Reply::Null, |v| Reply::Bulk(*v)),
        Some(_) => Reply::MultiBulk(values),
    })
}

/// `LTRIM key start stop`
pub fn ltrim(ctx: &Context, arena: &mut Arena, args: &[ArenaBuf]) -> Result<Reply> {
    let start = parse_int(arena, &args[1])?;
    let stop = parse_int(arena, &args[2])?;

    let meta_key = list::meta_key(arena, args[0])?;
    let _guard = ctx.locks.lock(arena.bytes(&meta_key)?);

    if let Some(meta) = read_meta(ctx, arena, meta_key)? {
        let (left, right) = list::ltrim_counts(&meta, start, stop);
        if left > 0 || right > 0 {
            let batch = list::trim(arena, meta_key, &meta, left, right, list::unix_now())?;
            ctx.store.batch(arena, &batch)?;
        }
    }

    Ok(Reply::ok())
}
