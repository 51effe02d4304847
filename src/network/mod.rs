//! Network Module
//!
//! TCP server and per-client connection handling.
//!
//! ## Architecture
//! ```text
//!                 ┌──────────────────────┐
//!   TCP clients ─►│ acceptor (run loop)  │ non-blocking accept, polls the
//!                 └──────────┬───────────┘ shutdown flag
//!                            │ spawn (≤ max_connections)
//!            ┌───────────────┼───────────────┐
//!            ▼               ▼               ▼
//!       Connection      Connection      Connection     one thread each,
//!       (own Arena)     (own Arena)     (own Arena)    one Arena each
//!            └───────────────┼───────────────┘
//!                            ▼
//!              Registry::dispatch → Arc<dyn Store>
//! ```
//!
//! Shutdown: `SHUTDOWN` raises the flag, the acceptor stops, half-closes
//! every client socket for reading, waits on a `crossbeam` `WaitGroup` for
//! the workers to finish their current request, then closes the store.

mod connection;
mod server;

pub use connection::Connection;
pub use server::Server;
