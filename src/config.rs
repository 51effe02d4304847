//! Configuration for rockredis
//!
//! Centralized configuration with sensible defaults. Values can come from
//! the builder, from a `key value` config file, or from CLI flags layered
//! on top by the server binary.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, RockError};

/// Main configuration for a rockredis instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files (WAL, SSTables, etc.)
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── wal.log          (write-ahead log)
    ///     └── sstables/        (SSTable files)
    pub data_dir: PathBuf,

    /// Serve from an in-memory ordered map instead of the on-disk engine
    pub in_memory: bool,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Max size of memtable before flush (in bytes)
    pub memtable_size_limit: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Request Processing
    // -------------------------------------------------------------------------
    /// Backing capacity of each connection's arena (in bytes)
    pub arena_size: usize,

    /// Number of shards in the per-key lock table
    pub lock_shards: usize,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./rockredis_data"),
            in_memory: false,
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            memtable_size_limit: 64 * 1024 * 1024, // 64 MB
            listen_addr: "127.0.0.1:6379".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
            arena_size: 32 * 1024, // 32 KB
            lock_shards: 64,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load a config file on top of the defaults
    ///
    /// The file holds one `key value` pair per line. Blank lines and lines
    /// starting with `#` are skipped. Unknown keys are logged and ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            RockError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_str_lines(&text)
    }

    /// Parse config text (same format as [`Config::from_file`])
    pub fn from_str_lines(text: &str) -> Result<Self> {
        let mut config = Config::default();

        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let (key, value) = match (parts.next(), parts.next(), parts.next()) {
                (Some(k), Some(v), None) => (k, v),
                _ => {
                    return Err(RockError::Config(format!(
                        "line {}: expected `key value`, got {:?}",
                        lineno + 1,
                        line
                    )))
                }
            };

            config.apply(key, value)?;
        }

        Ok(config)
    }

    /// Apply a single `key value` setting
    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        // `max-connections` and `maxconnections` name the same setting
        let normalized: String = key
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "dir" | "datadir" => self.data_dir = PathBuf::from(value),
            "addr" | "listen" | "listenaddr" => self.listen_addr = value.to_string(),
            "inmemory" => self.in_memory = parse_bool(key, value)?,
            "maxconnections" => self.max_connections = parse_size(key, value)?,
            "memtablesize" | "memtablesizelimit" => {
                self.memtable_size_limit = parse_size(key, value)?
            }
            "arenasize" => self.arena_size = parse_size(key, value)?,
            "lockshards" => self.lock_shards = parse_size(key, value)?.max(1),
            "readtimeoutms" => self.read_timeout_ms = parse_size(key, value)? as u64,
            "writetimeoutms" => self.write_timeout_ms = parse_size(key, value)? as u64,
            "walsync" => {
                self.wal_sync_strategy = match value {
                    "always" | "everywrite" => WalSyncStrategy::EveryWrite,
                    n => WalSyncStrategy::EveryNEntries {
                        count: parse_size(key, n)?.max(1),
                    },
                }
            }
            _ => tracing::warn!("Ignoring unknown config key '{}'", key),
        }

        Ok(())
    }
}

/// Parse a size with an optional `k`/`m`/`g` suffix ("4m" → 4194304)
pub fn parse_size(key: &str, value: &str) -> Result<usize> {
    let lower = value.to_ascii_lowercase();
    let digits_end = lower
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(lower.len());
    let (digits, suffix) = lower.split_at(digits_end);

    let multiplier: usize = match suffix {
        "" | "b" => 1,
        "k" | "kb" => 1024,
        "m" | "mb" => 1024 * 1024,
        "g" | "gb" => 1024 * 1024 * 1024,
        _ => {
            return Err(RockError::Config(format!(
                "{}: unknown size suffix in {:?}",
                key, value
            )))
        }
    };

    let n: usize = digits
        .parse()
        .map_err(|_| RockError::Config(format!("{}: expected a number, got {:?}", key, value)))?;

    n.checked_mul(multiplier)
        .ok_or_else(|| RockError::Config(format!("{}: {:?} overflows", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Ok(true),
        "no" | "false" | "0" => Ok(false),
        _ => Err(RockError::Config(format!(
            "{}: expected yes/no, got {:?}",
            key, value
        ))),
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Start from an existing config (e.g. one loaded from a file)
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Use the in-memory store instead of the on-disk engine
    pub fn in_memory(mut self, enabled: bool) -> Self {
        self.config.in_memory = enabled;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the memtable size limit (in bytes)
    pub fn memtable_size_limit(mut self, size: usize) -> Self {
        self.config.memtable_size_limit = size;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the per-connection arena capacity (in bytes)
    pub fn arena_size(mut self, size: usize) -> Self {
        self.config.arena_size = size;
        self
    }

    /// Set the number of per-key lock shards
    pub fn lock_shards(mut self, shards: usize) -> Self {
        self.config.lock_shards = shards.max(1);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
