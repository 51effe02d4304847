//! String commands
//!
//! Plain values live under `'S' ++ key`, apart from the list namespaces.

use crate::arena::{Arena, ArenaBuf, Piece};
use crate::error::Result;
use crate::list;
use crate::protocol::Reply;

use super::Context;

/// Prefix byte of a string value key
pub const STRING_PREFIX: u8 = b'S';

fn string_key(arena: &mut Arena, key: ArenaBuf) -> Result<ArenaBuf> {
    arena.concat(&[Piece::Bytes(&[STRING_PREFIX]), Piece::Buf(key)])
}

/// `GET key`
pub fn get(ctx: &Context, arena: &mut Arena, args: &[ArenaBuf]) -> Result<Reply> {
    let key = string_key(arena, args[0])?;
    Ok(match ctx.store.get(arena, key)? {
        Some(value) => Reply::Bulk(value),
        None => Reply::Null,
    })
}

/// `SET key value`
pub fn set(ctx: &Context, arena: &mut Arena, args: &[ArenaBuf]) -> Result<Reply> {
    let key = string_key(arena, args[0])?;
    ctx.store.set(arena.bytes(&key)?, arena.bytes(&args[1])?)?;
    Ok(Reply::ok())
}

/// `DEL key [key ...]`
///
/// Removes string values and whole lists; replies with how many keys existed.
pub fn del(ctx: &Context, arena: &mut Arena, args: &[ArenaBuf]) -> Result<Reply> {
    let mut removed = 0u32;

    for &user_key in args {
        let meta_key = list::meta_key(arena, user_key)?;
        let _guard = ctx.locks.lock(arena.bytes(&meta_key)?);

        let mut existed = false;

        let key = string_key(arena, user_key)?;
        if ctx.store.get(arena, key)?.is_some() {
            ctx.store.delete(arena.bytes(&key)?)?;
            existed = true;
        }

        if let Some(meta) = super::lists::read_meta(ctx, arena, meta_key)? {
            let batch = list::trim(arena, meta_key, &meta, meta.count, 0, list::unix_now())?;
            ctx.store.batch(arena, &batch)?;
            existed = true;
        }

        if existed {
            removed += 1;
        }
    }

    Ok(Reply::count(removed))
}
