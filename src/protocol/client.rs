//! Client-side RESP codec
//!
//! Used by `rockredis-cli` and the integration tests. Replies are decoded
//! incrementally from a [`BytesMut`]: an incomplete frame leaves the buffer
//! untouched and yields `Ok(None)` so the caller can read more.

use std::fmt;

use bytes::{Buf, BytesMut};

use crate::error::{Result, RockError};

/// A decoded reply, owning its bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Status(String),
    Error(String),
    Integer(i64),
    Bulk(Vec<u8>),
    Null,
    Array(Vec<Value>),
    NullArray,
}

/// Encode a command as a multi-bulk request
pub fn encode_request(args: &[&[u8]]) -> Vec<u8> {
    let payload: usize = args.iter().map(|a| a.len() + 16).sum();
    let mut out = Vec::with_capacity(16 + payload);

    out.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        out.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        out.extend_from_slice(arg);
        out.extend_from_slice(b"\r\n");
    }
    out
}

/// Decode one complete reply from the front of `buf`
pub fn decode_reply(buf: &mut BytesMut) -> Result<Option<Value>> {
    match parse(&buf[..], 0)? {
        Some((value, consumed)) => {
            buf.advance(consumed);
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Parse the frame starting at `pos`, returning the value and the offset
/// just past it
fn parse(buf: &[u8], pos: usize) -> Result<Option<(Value, usize)>> {
    let Some(line_end) = find_crlf(buf, pos) else {
        return Ok(None);
    };
    let kind = buf[pos];
    let line = &buf[pos + 1..line_end];
    let next = line_end + 2;

    let parsed = match kind {
        b'+' => (Value::Status(text(line)), next),
        b'-' => (Value::Error(text(line)), next),
        b':' => (Value::Integer(parse_int(line)?), next),
        b'$' => {
            let len = parse_int(line)?;
            if len < 0 {
                (Value::Null, next)
            } else {
                let end = next + len as usize;
                if buf.len() < end + 2 {
                    return Ok(None);
                }
                if &buf[end..end + 2] != b"\r\n" {
                    return Err(RockError::Protocol("bulk reply not terminated by CRLF".to_string()));
                }
                (Value::Bulk(buf[next..end].to_vec()), end + 2)
            }
        }
        b'*' => {
            let n = parse_int(line)?;
            if n < 0 {
                (Value::NullArray, next)
            } else {
                let mut items = Vec::with_capacity(n.min(1024) as usize);
                let mut at = next;
                for _ in 0..n {
                    match parse(buf, at)? {
                        Some((item, after)) => {
                            items.push(item);
                            at = after;
                        }
                        None => return Ok(None),
                    }
                }
                (Value::Array(items), at)
            }
        }
        other => {
            return Err(RockError::Protocol(format!(
                "unexpected reply type byte '{}'",
                other.escape_ascii()
            )))
        }
    };

    Ok(Some(parsed))
}

fn find_crlf(buf: &[u8], from: usize) -> Option<usize> {
    if from >= buf.len() {
        return None;
    }
    buf[from..]
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|i| from + i)
}

fn text(line: &[u8]) -> String {
    String::from_utf8_lossy(line).into_owned()
}

fn parse_int(line: &[u8]) -> Result<i64> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| RockError::Protocol(format!("invalid integer '{}'", line.escape_ascii())))
}

// =============================================================================
// Display (redis-cli style)
// =============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Status(s) => write!(f, "{}", s),
            Value::Error(e) => write!(f, "(error) {}", e),
            Value::Integer(n) => write!(f, "(integer) {}", n),
            Value::Bulk(b) => write!(f, "\"{}\"", b.escape_ascii()),
            Value::Null | Value::NullArray => write!(f, "(nil)"),
            Value::Array(items) if items.is_empty() => write!(f, "(empty array)"),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, item)?;
                }
                Ok(())
            }
        }
    }
}
