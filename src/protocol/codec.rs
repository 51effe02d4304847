//! Server-side RESP codec
//!
//! Decodes multi-bulk requests into the connection arena and encodes
//! [`Reply`] values onto a writer.
//!
//! ## Request Framing
//! ```text
//! ┌──────────────┬──────────────────────────┬─────────────────────────┐
//! │ *<argc>\r\n  │ $<len>\r\n<name>\r\n     │ $<len>\r\n<arg>\r\n ... │
//! └──────────────┴──────────────────────────┴─────────────────────────┘
//! ```
//! Any deviation is a [`RockError::Protocol`]; the connection answers with
//! an error reply and closes.

use std::io::{BufRead, ErrorKind, Read, Write};

use crate::arena::Arena;
use crate::error::{Result, RockError};

use super::{Reply, Request};

/// Maximum bulk string size (16 MB)
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Maximum number of elements in one request
pub const MAX_ARGUMENTS: usize = 1024 * 1024;

/// Longest header line accepted (`*<n>` / `$<n>`)
const MAX_HEADER_LINE: usize = 64;

const CRLF: &[u8] = b"\r\n";

// =============================================================================
// Request Decoding
// =============================================================================

/// Read one request into `request`
///
/// Argument bytes are allocated from `arena`. Returns `Ok(false)` when the
/// peer closed the stream cleanly before sending anything.
pub fn read_request<R: BufRead>(reader: &mut R, arena: &mut Arena, request: &mut Request) -> Result<bool> {
    request.clear();

    if !read_line(reader, &mut request.line)? {
        return Ok(false);
    }

    let argc = parse_header(&request.line, b'*')?;
    if argc == 0 || argc > MAX_ARGUMENTS {
        return Err(RockError::Protocol(format!("invalid multi-bulk length {}", argc)));
    }

    for i in 0..argc {
        if !read_line(reader, &mut request.line)? {
            return Err(RockError::Protocol("unexpected end of stream".to_string()));
        }

        let len = parse_header(&request.line, b'$')?;
        if len > MAX_PAYLOAD_SIZE {
            return Err(RockError::Protocol(format!(
                "bulk string too large: {} bytes (max {})",
                len, MAX_PAYLOAD_SIZE
            )));
        }

        let buf = arena.allocate(len);
        read_exact(reader, arena.bytes_mut(&buf)?)?;

        let mut crlf = [0u8; 2];
        read_exact(reader, &mut crlf)?;
        if crlf != *b"\r\n" {
            return Err(RockError::Protocol("bulk string not terminated by CRLF".to_string()));
        }

        if i == 0 {
            request.raw_name.push_str(&String::from_utf8_lossy(arena.bytes(&buf)?));
            request.name.push_str(&request.raw_name.to_ascii_uppercase());
        } else {
            request.args.push(buf);
        }
    }

    Ok(true)
}

/// Read a `\r\n`-terminated line without the terminator
///
/// Returns false on EOF before the first byte.
fn read_line<R: BufRead>(reader: &mut R, line: &mut Vec<u8>) -> Result<bool> {
    line.clear();
    let n = reader
        .by_ref()
        .take(MAX_HEADER_LINE as u64 + 2)
        .read_until(b'\n', line)?;

    if n == 0 {
        return Ok(false);
    }
    if !line.ends_with(CRLF) {
        return Err(RockError::Protocol("header line not terminated by CRLF".to_string()));
    }

    line.truncate(line.len() - 2);
    Ok(true)
}

/// Parse `<prefix><decimal>`
fn parse_header(line: &[u8], prefix: u8) -> Result<usize> {
    let (&first, digits) = line
        .split_first()
        .ok_or_else(|| RockError::Protocol("empty header line".to_string()))?;

    if first != prefix {
        return Err(RockError::Protocol(format!(
            "expected '{}', got '{}'",
            prefix as char,
            first.escape_ascii()
        )));
    }

    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| RockError::Protocol(format!("invalid length '{}'", digits.escape_ascii())))
}

fn read_exact<R: BufRead>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => RockError::Protocol("unexpected end of stream".to_string()),
        _ => RockError::Io(e),
    })
}

// =============================================================================
// Reply Encoding
// =============================================================================

/// Write `reply` in RESP form
///
/// Does not flush; the connection flushes once per request.
pub fn write_reply<W: Write>(writer: &mut W, arena: &Arena, reply: &Reply) -> Result<()> {
    match reply {
        Reply::Status(code) => write!(writer, "+{}\r\n", code)?,
        Reply::Error(message) => {
            // A bare CR or LF would end the line early
            let message = message.replace(['\r', '\n'], " ");
            write!(writer, "-ERR {}\r\n", message)?;
        }
        Reply::Integer(n) => write!(writer, ":{}\r\n", n)?,
        Reply::Bulk(buf) => write_bulk(writer, arena.bytes(buf)?)?,
        Reply::Null => writer.write_all(b"$-1\r\n")?,
        Reply::MultiBulk(bufs) => {
            write!(writer, "*{}\r\n", bufs.len())?;
            for buf in bufs {
                write_bulk(writer, arena.bytes(buf)?)?;
            }
        }
        Reply::NullArray => writer.write_all(b"*-1\r\n")?,
    }
    Ok(())
}

fn write_bulk<W: Write>(writer: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    write!(writer, "${}\r\n", bytes.len())?;
    writer.write_all(bytes)?;
    writer.write_all(CRLF)
}
