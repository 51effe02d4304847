//! Storage Module
//!
//! Persistent storage layer: immutable sorted tables plus the merge that
//! reads across them.
//!
//! ## Responsibilities
//! - Persist flushed MemTables as SSTables
//! - Point lookups newest → oldest
//! - Ordered range reads merged across the MemTable and every SSTable
//!
//! ## Layout
//! ```text
//! <data_dir>/sstables/sstable_000001.sst
//!                     sstable_000002.sst   ← higher id = newer
//! ```
//! See [`sstable`] for the file format.

mod manager;
mod merge;
pub mod sstable;

pub use manager::StorageManager;
pub use merge::{MergingIterator, Source};
pub use sstable::{SSTable, SSTableBuilder, SSTableEntry, SSTableIterator, SSTableReader};
