//! Connection Handler
//!
//! Serves one client: read a request, dispatch it, write the reply, reset
//! the arena, repeat.

use std::io::{self, BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::arena::Arena;
use crate::commands::{Context, Registry};
use crate::config::Config;
use crate::error::{Result, RockError};
use crate::protocol::{read_request, write_reply, Reply, Request};

/// Handles a single client connection
pub struct Connection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    ctx: Arc<Context>,
    registry: Arc<Registry>,

    /// Request-scoped memory, reset after every reply
    arena: Arena,

    /// Reused request buffer
    request: Request,

    peer_addr: String,
}

impl Connection {
    /// Wrap an accepted stream
    pub fn new(stream: TcpStream, ctx: Arc<Context>, registry: Arc<Registry>, config: &Config) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;
        if config.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
        }
        if config.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
        }

        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            ctx,
            registry,
            arena: Arena::new(config.arena_size),
            request: Request::new(),
            peer_addr,
        })
    }

    /// Serve requests until the client leaves, a framing error occurs, or
    /// shutdown is requested
    pub fn handle(&mut self) -> Result<()> {
        debug!(peer = %self.peer_addr, "Connection established");

        loop {
            match read_request(&mut self.reader, &mut self.arena, &mut self.request) {
                Ok(true) => {}
                Ok(false) => {
                    debug!(peer = %self.peer_addr, "Client disconnected");
                    return Ok(());
                }
                Err(RockError::Io(ref e)) if is_disconnect(e) => {
                    debug!(peer = %self.peer_addr, error = %e, "Connection closed");
                    return Ok(());
                }
                Err(e) => {
                    warn!(peer = %self.peer_addr, error = %e, "Bad request, closing");
                    let _ = self.send(&Reply::from(&e));
                    return Err(e);
                }
            }

            trace!(peer = %self.peer_addr, command = %self.request.name, "Request");
            let reply = self.registry.dispatch(&self.ctx, &mut self.arena, &self.request);

            match self.send(&reply) {
                Ok(()) => {}
                Err(RockError::Io(ref e)) if is_disconnect(e) => {
                    debug!(peer = %self.peer_addr, error = %e, "Client left before reply");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }

            self.arena.reset();

            if self.ctx.shutdown_requested() {
                debug!(peer = %self.peer_addr, "Closing for shutdown");
                return Ok(());
            }
        }
    }

    fn send(&mut self, reply: &Reply) -> Result<()> {
        write_reply(&mut self.writer, &self.arena, reply)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Peer went away or went idle past the read timeout
fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}
