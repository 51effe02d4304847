//! Write-Ahead Log (WAL) Module
//!
//! Makes acknowledged writes durable before they reach the MemTable.
//!
//! ## Responsibilities
//! - Append one record per write (a list batch is a single record)
//! - CRC32 checksums for torn/corrupt record detection
//! - Log Sequence Numbers (LSN) for ordering
//! - Crash recovery: replay the valid prefix, cut the torn tail
//!
//! ## File Format
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │ Record 1                                          │
//! │ ┌─────────┬─────────┬─────────┬─────────────────┐ │
//! │ │ LSN (8) │ CRC (4) │ Len (4) │ bincode(entry)  │ │
//! │ └─────────┴─────────┴─────────┴─────────────────┘ │
//! ├───────────────────────────────────────────────────┤
//! │ Record 2 ...                                      │
//! └───────────────────────────────────────────────────┘
//! ```
//! Header fields are little-endian. The CRC covers the entry bytes only.

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{BatchOp, Operation, WalEntry, HEADER_SIZE};
pub use reader::{WalIterator, WalReader};
pub use recovery::{RecoveryResult, WalRecovery};
pub use writer::WalWriter;
