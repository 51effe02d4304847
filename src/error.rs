//! Error types for rockredis
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using RockError
pub type Result<T> = std::result::Result<T, RockError>;

/// Unified error type for rockredis operations
#[derive(Debug, Error)]
pub enum RockError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("WAL write failed: {0}")]
    WalWrite(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal to the SSTable lookup path: the key is not in this table.
    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Encoding Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A persisted record does not have the layout its key namespace requires.
    #[error("Encoding violation: {0}")]
    Encoding(String),

    /// A push would move a list's sequence window outside `u32`.
    #[error("list sequence space exhausted")]
    SeqExhausted,

    // -------------------------------------------------------------------------
    // Arena Errors
    // -------------------------------------------------------------------------
    #[error("Arena buffer from epoch {buffer_epoch} used after reset (arena epoch {arena_epoch})")]
    StaleArenaBuffer { buffer_epoch: u32, arena_epoch: u32 },

    // -------------------------------------------------------------------------
    // Network / Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Command Errors (reported to the client, connection stays open)
    // -------------------------------------------------------------------------
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(String),

    #[error("value is not an integer or out of range")]
    NotInteger,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RockError {
    /// Whether this error is a client mistake rather than a server fault.
    ///
    /// Client errors are answered with `-ERR` and the connection is kept.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RockError::UnknownCommand(_) | RockError::WrongArity(_) | RockError::NotInteger
        )
    }
}
