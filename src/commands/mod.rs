//! Commands Module
//!
//! Maps decoded requests onto handlers that drive the [`crate::store::Store`]
//! and the [`crate::list`] encoding.
//!
//! ## Flow
//! ```text
//! Request ──► Registry::dispatch ──► arity check ──► handler(ctx, arena, args)
//!                                                         │
//!                        ┌────────────────────────────────┤
//!                        ▼                                ▼
//!               KeyLocks::lock(metaKey)           Store::get / scan
//!                        │                                │
//!                        └──► list::{create,push,trim} ──► Store::batch
//!                                                         │
//!                                                         ▼
//!                                                       Reply
//! ```
//!
//! ## Responsibilities
//! - Static name → handler table built once at startup
//! - Argument count validation before any handler runs
//! - Serializing read-modify-write sequences on the same list
//! - Turning handler errors into `-ERR` replies

mod generic;
mod lists;
mod locks;
mod registry;
mod strings;

pub use locks::KeyLocks;
pub use registry::{Arity, CommandSpec, Handler, Registry};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::arena::{Arena, ArenaBuf};
use crate::error::{Result, RockError};
use crate::store::Store;

/// Shared state every handler runs against
pub struct Context {
    /// The backing store, shared by all connections
    pub store: Arc<dyn Store>,

    /// Per-key guards for read-modify-write sequences
    pub locks: KeyLocks,

    /// Set by `SHUTDOWN`; polled by the server loop
    pub shutdown: Arc<AtomicBool>,
}

impl Context {
    pub fn new(store: Arc<dyn Store>, lock_shards: usize) -> Self {
        Self {
            store,
            locks: KeyLocks::new(lock_shards),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a client asked the server to stop
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

/// Parse a decimal integer argument
pub(crate) fn parse_int(arena: &Arena, arg: &ArenaBuf) -> Result<i64> {
    std::str::from_utf8(arena.bytes(arg)?)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(RockError::NotInteger)
}
