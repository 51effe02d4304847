//! List key encoding

use crate::arena::{Arena, ArenaBuf, Piece};
use crate::error::Result;

/// Prefix byte of a list metadata key
pub const LIST_META_PREFIX: u8 = b'L';

/// Prefix byte of a list element key
pub const LIST_DATA_PREFIX: u8 = b'D';

/// Separator between user key and sequence number in element keys
pub const SEQ_SEPARATOR: u8 = b':';

/// Build `'L' ++ user_key` in the arena
pub fn meta_key(arena: &mut Arena, user_key: ArenaBuf) -> Result<ArenaBuf> {
    arena.concat(&[Piece::Bytes(&[LIST_META_PREFIX]), Piece::Buf(user_key)])
}

/// Build `'D' ++ user_key ++ ':' ++ u32_be(seq)` from a metadata key
pub fn data_key(arena: &mut Arena, meta_key: ArenaBuf, seq: u32) -> Result<ArenaBuf> {
    arena.concat(&[
        Piece::Bytes(&[LIST_DATA_PREFIX]),
        Piece::Buf(meta_key.suffix(1)),
        Piece::Bytes(&[SEQ_SEPARATOR]),
        Piece::Bytes(&seq.to_be_bytes()),
    ])
}

/// `'D' ++ user_key ++ ':'`, the prefix shared by every element key of a list
pub fn data_prefix(arena: &Arena, meta_key: ArenaBuf) -> Result<Vec<u8>> {
    let user_key = arena.bytes(&meta_key.suffix(1))?;
    let mut prefix = Vec::with_capacity(user_key.len() + 2);
    prefix.push(LIST_DATA_PREFIX);
    prefix.extend_from_slice(user_key);
    prefix.push(SEQ_SEPARATOR);
    Ok(prefix)
}
