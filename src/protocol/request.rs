//! Request definitions
//!
//! A decoded request: the uppercased command name and its arguments.

use crate::arena::ArenaBuf;

/// A parsed request, reused across requests on one connection
///
/// Argument handles point into the connection arena and are only valid
/// until that arena is reset.
#[derive(Debug, Default)]
pub struct Request {
    /// Command name, ASCII-uppercased
    pub name: String,

    /// Command name as the client spelled it
    pub raw_name: String,

    /// Arguments after the command name
    pub args: Vec<ArenaBuf>,

    /// Scratch for header lines
    pub(crate) line: Vec<u8>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous request while keeping allocations
    pub fn clear(&mut self) {
        self.name.clear();
        self.raw_name.clear();
        self.args.clear();
        self.line.clear();
    }

    /// Name for error messages: the client's spelling when known
    pub fn sent_name(&self) -> &str {
        if self.raw_name.is_empty() {
            &self.name
        } else {
            &self.raw_name
        }
    }

    /// Number of elements including the command name
    pub fn argc(&self) -> usize {
        self.args.len() + 1
    }
}
