//! List Module
//!
//! Encodes a list as one fixed-size metadata record plus one record per
//! element, keyed by a 32-bit sequence number.
//!
//! ## Key Layout
//! ```text
//! metadata:  'L' ++ user_key                      → ListMeta (16 bytes)
//! element:   'D' ++ user_key ++ ':' ++ u32_be(seq) → raw element bytes
//! ```
//!
//! ## Metadata Record (big-endian)
//! ```text
//! ┌───────────┬────────────┬───────────────┬───────────────┐
//! │ count (4) │ min_seq (4)│ created_at (4)│ updated_at (4)│
//! └───────────┴────────────┴───────────────┴───────────────┘
//! ```
//!
//! Live element keys are exactly `min_seq .. min_seq + count`. Because the
//! sequence number is fixed-width big-endian, key order is list order, so a
//! forward scan from any element key walks the list from that position.
//!
//! New lists start at [`SEQ_START`] (2^30) so pushes can grow toward both
//! ends. Every operation here only computes a [`crate::store::Batch`]; the
//! caller applies it.

mod keys;
mod meta;
mod ops;

pub use keys::{data_key, data_prefix, meta_key, LIST_DATA_PREFIX, LIST_META_PREFIX, SEQ_SEPARATOR};
pub use meta::ListMeta;
pub use ops::{
    create, llen, lpush, ltrim_counts, normalize_range, pop, range, rpush, trim, unix_now, End,
};

/// Sequence number of the first element of a freshly created list
pub const SEQ_START: u32 = 1 << 30;
