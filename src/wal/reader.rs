//! WAL Reader
//!
//! Sequentially decodes records from a WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{Result, RockError};

use super::{WalEntry, HEADER_SIZE};

/// Reads records from the WAL file
pub struct WalReader {
    reader: BufReader<File>,
    /// Byte offset just past the last valid record
    position: u64,
    file_len: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            file_len,
        })
    }

    /// Read the next record
    ///
    /// `Ok(None)` at a clean end of file. A partial header, a length running
    /// past the end, a CRC mismatch or an undecodable entry is
    /// [`RockError::WalCorruption`]; `position()` then still points at the
    /// start of the bad record.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        let mut header = [0u8; HEADER_SIZE];
        let read = read_full(&mut self.reader, &mut header)?;
        if read == 0 {
            return Ok(None);
        }
        if read < HEADER_SIZE {
            return Err(self.corruption(format!("torn header ({} of {} bytes)", read, HEADER_SIZE)));
        }

        let lsn = le_u64(&header[0..8]);
        let crc = le_u32(&header[8..12]);
        let len = le_u32(&header[12..16]) as u64;

        let remaining = self
            .file_len
            .saturating_sub(self.position + HEADER_SIZE as u64);
        if len > remaining {
            return Err(self.corruption(format!(
                "lsn {} claims {} bytes, only {} remain",
                lsn, len, remaining
            )));
        }

        let mut data = vec![0u8; len as usize];
        self.reader.read_exact(&mut data)?;

        if crc32fast::hash(&data) != crc {
            return Err(self.corruption(format!("checksum mismatch at lsn {}", lsn)));
        }

        let entry = WalEntry::deserialize(&data)
            .map_err(|e| self.corruption(format!("undecodable entry at lsn {}: {}", lsn, e)))?;
        if entry.lsn != lsn {
            return Err(self.corruption(format!(
                "header lsn {} does not match entry lsn {}",
                lsn, entry.lsn
            )));
        }

        self.position += HEADER_SIZE as u64 + len;
        Ok(Some(entry))
    }

    /// Iterate over records until the end or the first corruption
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    /// Offset just past the last record successfully read
    pub fn position(&self) -> u64 {
        self.position
    }

    fn corruption(&self, detail: String) -> RockError {
        RockError::WalCorruption(format!("offset {}: {}", self.position, detail))
    }
}

/// Iterator over WAL records; yields at most one error, then stops
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl WalIterator {
    pub fn position(&self) -> u64 {
        self.reader.position()
    }
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn le_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

fn le_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

/// Like `read_exact`, but reports how many bytes were read before EOF
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
