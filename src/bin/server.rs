//! rockredis Server Binary
//!
//! Starts the RESP server.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rockredis::config::ConfigBuilder;
use rockredis::network::Server;
use rockredis::{Config, Engine, MemStore, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// rockredis Server
#[derive(Parser, Debug)]
#[command(name = "rockredis-server")]
#[command(about = "Redis-compatible list server over an ordered key-value store")]
#[command(version)]
struct Args {
    /// Config file (`key value` per line); flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Listen address (host:port)
    #[arg(short, long)]
    listen: Option<String>,

    /// Maximum concurrent connections
    #[arg(long)]
    max_connections: Option<usize>,

    /// MemTable size limit in MB before flush
    #[arg(short = 'm', long)]
    memtable_mb: Option<usize>,

    /// Per-connection arena size in KB
    #[arg(long)]
    arena_kb: Option<usize>,

    /// Keep all data in memory (nothing is persisted)
    #[arg(long)]
    in_memory: bool,
}

impl Args {
    fn into_config(self) -> rockredis::Result<Config> {
        let base = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        let mut builder = ConfigBuilder::from_config(base);
        if let Some(dir) = self.data_dir {
            builder = builder.data_dir(dir);
        }
        if let Some(addr) = self.listen {
            builder = builder.listen_addr(addr);
        }
        if let Some(n) = self.max_connections {
            builder = builder.max_connections(n);
        }
        if let Some(mb) = self.memtable_mb {
            builder = builder.memtable_size_limit(mb * 1024 * 1024);
        }
        if let Some(kb) = self.arena_kb {
            builder = builder.arena_size(kb * 1024);
        }
        if self.in_memory {
            builder = builder.in_memory(true);
        }
        Ok(builder.build())
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rockredis=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    tracing::info!("rockredis Server v{}", rockredis::VERSION);
    tracing::info!("Listen address: {}", config.listen_addr);

    let store: Arc<dyn Store> = if config.in_memory {
        tracing::info!("Using in-memory store");
        Arc::new(MemStore::new())
    } else {
        tracing::info!("Data directory: {}", config.data_dir.display());
        match Engine::open(config.clone()) {
            Ok(engine) => Arc::new(engine),
            Err(e) => {
                tracing::error!("Failed to open engine: {}", e);
                std::process::exit(1);
            }
        }
    };

    let server = match Server::bind(config, store) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.shutdown_on_signal() {
        tracing::error!("Failed to install signal handler: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
