//! Reply definitions
//!
//! Typed replies returned by command handlers.

use crate::arena::ArenaBuf;
use crate::error::RockError;

/// A reply to send to the client
///
/// Bulk payloads are arena handles, so a reply must be written before the
/// connection arena is reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+<code>`
    Status(&'static str),

    /// `-ERR <message>`
    Error(String),

    /// `:<n>`
    Integer(i64),

    /// `$<len>` followed by the bytes
    Bulk(ArenaBuf),

    /// `$-1`
    Null,

    /// `*<n>` followed by `n` bulk strings
    MultiBulk(Vec<ArenaBuf>),

    /// `*-1`
    NullArray,
}

impl Reply {
    /// The `+OK` status reply
    pub fn ok() -> Self {
        Reply::Status("OK")
    }

    /// Integer reply from any unsigned count
    pub fn count(n: impl Into<u64>) -> Self {
        Reply::Integer(n.into() as i64)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl From<&RockError> for Reply {
    fn from(err: &RockError) -> Self {
        Reply::Error(err.to_string())
    }
}
