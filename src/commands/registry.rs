//! Command registry
//!
//! Static table from uppercase command name to arity and handler.

use std::collections::HashMap;

use tracing::{trace, warn};

use crate::arena::{Arena, ArenaBuf};
use crate::error::{Result, RockError};
use crate::protocol::{Reply, Request};

use super::{generic, lists, strings, Context};

/// Handler signature; `args` excludes the command name
pub type Handler = fn(&Context, &mut Arena, &[ArenaBuf]) -> Result<Reply>;

/// Accepted element count, command name included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, argc: usize) -> bool {
        match *self {
            Arity::Exact(n) => argc == n,
            Arity::AtLeast(n) => argc >= n,
        }
    }
}

/// One registered command
#[derive(Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub arity: Arity,
    pub handler: Handler,
}

/// Name → command table
#[derive(Default)]
pub struct Registry {
    commands: HashMap<&'static str, CommandSpec>,
}

impl Registry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in command
    pub fn standard() -> Self {
        let mut registry = Self::new();

        // Connection / server
        registry.register("PING", Arity::AtLeast(1), generic::ping);
        registry.register("ECHO", Arity::Exact(2), generic::echo);
        registry.register("SHUTDOWN", Arity::Exact(1), generic::shutdown);

        // Strings
        registry.register("GET", Arity::Exact(2), strings::get);
        registry.register("SET", Arity::Exact(3), strings::set);
        registry.register("DEL", Arity::AtLeast(2), strings::del);

        // Lists
        registry.register("LPUSH", Arity::AtLeast(3), lists::lpush);
        registry.register("RPUSH", Arity::AtLeast(3), lists::rpush);
        registry.register("LRANGE", Arity::Exact(4), lists::lrange);
        registry.register("LLEN", Arity::Exact(2), lists::llen);
        registry.register("LPOP", Arity::AtLeast(2), lists::lpop);
        registry.register("RPOP", Arity::AtLeast(2), lists::rpop);
        registry.register("LTRIM", Arity::Exact(4), lists::ltrim);

        registry
    }

    /// Add or replace a command; `name` must be uppercase
    pub fn register(&mut self, name: &'static str, arity: Arity, handler: Handler) {
        self.commands.insert(
            name,
            CommandSpec {
                name,
                arity,
                handler,
            },
        );
    }

    pub fn lookup(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run `request` and produce its reply
    ///
    /// Never fails: every error becomes a [`Reply::Error`]. Errors that are
    /// not the client's fault are logged.
    pub fn dispatch(&self, ctx: &Context, arena: &mut Arena, request: &Request) -> Reply {
        trace!(command = %request.name, argc = request.argc(), "Dispatching");

        match self.execute(ctx, arena, request) {
            Ok(reply) => reply,
            Err(e) => {
                if !e.is_client_error() {
                    warn!(command = %request.name, error = %e, "Command failed");
                }
                Reply::from(&e)
            }
        }
    }

    fn execute(&self, ctx: &Context, arena: &mut Arena, request: &Request) -> Result<Reply> {
        let spec = self
            .lookup(&request.name)
            .ok_or_else(|| RockError::UnknownCommand(request.sent_name().to_string()))?;

        if !spec.arity.accepts(request.argc()) {
            return Err(RockError::WrongArity(spec.name.to_ascii_lowercase()));
        }

        (spec.handler)(ctx, arena, &request.args)
    }
}
