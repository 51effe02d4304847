//! # rockredis
//!
//! A Redis-compatible (RESP) key-value server whose lists live in an
//! ordered key-value store:
//! - Lists encoded as one metadata record plus one record per element
//! - Per-connection arena for request-scoped memory
//! - Write-Ahead Logging (WAL) and crash recovery in the persistent engine
//! - Thread-per-connection TCP server with graceful shutdown
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                             │
//! │          (thread per connection, one Arena each)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ RESP request
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Command Registry                            │
//! │        (arity check, per-key locks, handlers)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │ List codec  │─────────►│ dyn Store    │
//!   │ (meta+data) │  batches │ get/scan/... │
//!   └─────────────┘          └──────┬───────┘
//!                                   │
//!                  ┌────────────────┴────────────────┐
//!                  ▼                                 ▼
//!           ┌─────────────┐                 ┌─────────────────┐
//!           │  MemStore   │                 │     Engine      │
//!           │ (BTreeMap)  │                 │ WAL+MemTable+SST│
//!           └─────────────┘                 └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod arena;
pub mod config;
pub mod error;

pub mod commands;
pub mod engine;
pub mod list;
pub mod memtable;
pub mod network;
pub mod protocol;
pub mod storage;
pub mod store;
pub mod wal;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use arena::{Arena, ArenaBuf};
pub use config::Config;
pub use engine::Engine;
pub use error::{Result, RockError};
pub use store::{Batch, MemStore, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of rockredis
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
