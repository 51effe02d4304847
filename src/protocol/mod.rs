//! Protocol Module
//!
//! RESP framing for client-server communication.
//!
//! ## Request Format
//! Every request is a multi-bulk array of bulk strings; the first element is
//! the command name (matched case-insensitively).
//! ```text
//! *<argc>\r\n
//! $<len>\r\n<bytes>\r\n      ← repeated argc times
//! ```
//!
//! ## Reply Kinds
//! ```text
//! +OK\r\n                    status
//! -ERR <message>\r\n         error
//! :<int>\r\n                 integer
//! $<len>\r\n<bytes>\r\n      bulk        ($-1\r\n for null)
//! *<n>\r\n<bulk>...          multi-bulk  (*-1\r\n for null)
//! ```
//!
//! The server side ([`read_request`], [`write_reply`]) keeps every payload
//! in the connection's [`crate::arena::Arena`]. The client side
//! ([`encode_request`], [`decode_reply`]) uses owned buffers.

mod client;
mod codec;
mod request;
mod response;

pub use client::{decode_reply, encode_request, Value};
pub use codec::{read_request, write_reply, MAX_ARGUMENTS, MAX_PAYLOAD_SIZE};
pub use request::Request;
pub use response::Reply;
