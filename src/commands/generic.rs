//! Connection and server commands

use tracing::info;

use crate::arena::{Arena, ArenaBuf};
use crate::error::{Result, RockError};
use crate::protocol::Reply;

use super::Context;

/// `PING [message]`
pub fn ping(_ctx: &Context, _arena: &mut Arena, args: &[ArenaBuf]) -> Result<Reply> {
    match args {
        [] => Ok(Reply::Status("PONG")),
        [message] => Ok(Reply::Bulk(*message)),
        _ => Err(RockError::WrongArity("ping".to_string())),
    }
}

/// `ECHO message`
pub fn echo(_ctx: &Context, _arena: &mut Arena, args: &[ArenaBuf]) -> Result<Reply> {
    Ok(Reply::Bulk(args[0]))
}

/// `SHUTDOWN`
///
/// Only raises the flag; the server drains connections and closes the store.
pub fn shutdown(ctx: &Context, _arena: &mut Arena, _args: &[ArenaBuf]) -> Result<Reply> {
    info!("Shutdown requested by client");
    ctx.request_shutdown();
    Ok(Reply::ok())
}
