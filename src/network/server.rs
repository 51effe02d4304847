//! TCP Server
//!
//! Accepts connections and runs each on its own thread.

use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::commands::{Context, Registry};
use crate::config::Config;
use crate::error::{Result, RockError};
use crate::store::Store;

use super::Connection;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// TCP server for rockredis
pub struct Server {
    config: Config,
    listener: TcpListener,
    ctx: Arc<Context>,
    registry: Arc<Registry>,

    /// Live connection count, checked against `max_connections`
    active: Arc<AtomicUsize>,

    /// Clones of live client sockets, half-closed on shutdown
    streams: Arc<Mutex<HashMap<u64, TcpStream>>>,
}

impl Server {
    /// Bind the listener; nothing is accepted until [`Server::run`]
    pub fn bind(config: Config, store: Arc<dyn Store>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)
            .map_err(|e| RockError::Network(format!("bind {}: {}", config.listen_addr, e)))?;
        listener.set_nonblocking(true)?;

        let ctx = Arc::new(Context::new(store, config.lock_shards));

        Ok(Self {
            config,
            listener,
            ctx,
            registry: Arc::new(Registry::standard()),
            active: Arc::new(AtomicUsize::new(0)),
            streams: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Flag that stops the accept loop when set
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.ctx.shutdown)
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.ctx.request_shutdown();
    }

    /// Stop gracefully on SIGINT / SIGTERM
    ///
    /// The handler only raises the shutdown flag; [`Server::run`] then
    /// drains connections and closes the store. Installable once per process.
    pub fn shutdown_on_signal(&self) -> Result<()> {
        let flag = self.shutdown_handle();
        ctrlc::set_handler(move || {
            info!("Termination signal received");
            flag.store(true, Ordering::Release);
        })
        .map_err(|e| RockError::Network(format!("install signal handler: {}", e)))
    }

    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Accept until shutdown, drain connections, close the store
    pub fn run(self) -> Result<()> {
        info!(
            addr = %self.local_addr()?,
            max_connections = self.config.max_connections,
            "Server listening"
        );

        let wait_group = WaitGroup::new();
        let mut next_id: u64 = 0;

        while !self.ctx.shutdown_requested() {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    next_id += 1;
                    if let Err(e) = self.admit(stream, peer, next_id, &wait_group) {
                        warn!(%peer, error = %e, "Failed to start connection");
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL_INTERVAL),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        info!(active = self.active_connections(), "Shutting down, draining connections");
        for stream in self.streams.lock().values() {
            let _ = stream.shutdown(Shutdown::Read);
        }
        wait_group.wait();

        self.ctx.store.close()?;
        info!("Server stopped");
        Ok(())
    }

    /// Start a worker for an accepted stream, or turn it away when full
    fn admit(&self, mut stream: TcpStream, peer: SocketAddr, id: u64, wait_group: &WaitGroup) -> Result<()> {
        stream.set_nonblocking(false)?;

        if self.active.load(Ordering::Acquire) >= self.config.max_connections {
            debug!(%peer, "Connection limit reached, rejecting");
            let _ = stream.write_all(b"-ERR max number of clients reached\r\n");
            return Ok(());
        }

        self.active.fetch_add(1, Ordering::AcqRel);
        self.streams.lock().insert(id, stream.try_clone()?);

        let ctx = Arc::clone(&self.ctx);
        let registry = Arc::clone(&self.registry);
        let config = self.config.clone();
        let active = Arc::clone(&self.active);
        let streams = Arc::clone(&self.streams);
        let wait_group = wait_group.clone();

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", id))
            .spawn(move || {
                match Connection::new(stream, ctx, registry, &config) {
                    Ok(mut connection) => {
                        if let Err(e) = connection.handle() {
                            debug!(%peer, error = %e, "Connection ended with error");
                        }
                    }
                    Err(e) => warn!(%peer, error = %e, "Connection setup failed"),
                }

                streams.lock().remove(&id);
                active.fetch_sub(1, Ordering::AcqRel);
                drop(wait_group);
            });

        if let Err(e) = spawned {
            self.streams.lock().remove(&id);
            self.active.fetch_sub(1, Ordering::AcqRel);
            return Err(e.into());
        }
        Ok(())
    }
}
