//! SSTable Reader
//!
//! Opens SSTable files and serves point lookups and ordered range reads via
//! the in-memory index.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::Bound;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{Result, RockError};

use super::iterator::SSTableIterator;
use super::{
    parse_entry_header, SSTableEntry, ENTRY_HEADER_SIZE, FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION,
};

/// Reader for one SSTable file
///
/// The file handle sits behind a mutex so lookups and scans work through
/// `&self`; many readers can share one table.
pub struct SSTableReader {
    path: PathBuf,
    file: Mutex<BufReader<File>>,
    /// key → entry offset
    index: BTreeMap<Vec<u8>, u64>,
    entry_count: u64,
}

impl SSTableReader {
    /// Open an SSTable, load its index and verify the data checksum
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();
        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(corrupt(path, format!("file too small ({} bytes)", file_size)));
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;

        if &header[0..4] != MAGIC {
            return Err(corrupt(path, format!("bad magic {:?}", &header[0..4])));
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(corrupt(path, format!("unsupported version {}", version)));
        }
        let mut count = [0u8; 8];
        count.copy_from_slice(&header[6..14]);
        let entry_count = u64::from_le_bytes(count);

        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut footer = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer)?;

        let mut offset = [0u8; 8];
        offset.copy_from_slice(&footer[0..8]);
        let index_offset = u64::from_le_bytes(offset);
        let data_crc = u32::from_le_bytes([footer[8], footer[9], footer[10], footer[11]]);

        if index_offset < HEADER_SIZE || index_offset > file_size - FOOTER_SIZE {
            return Err(corrupt(path, format!("index offset {} out of bounds", index_offset)));
        }

        // Data block checksum
        file.seek(SeekFrom::Start(HEADER_SIZE))?;
        let mut hasher = crc32fast::Hasher::new();
        let mut data = (&mut file).take(index_offset - HEADER_SIZE);
        let mut chunk = [0u8; 8192];
        loop {
            let n = data.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            hasher.update(&chunk[..n]);
        }
        if hasher.finalize() != data_crc {
            return Err(corrupt(path, "data block checksum mismatch".to_string()));
        }

        // Index block
        let mut index_block = vec![0u8; (file_size - FOOTER_SIZE - index_offset) as usize];
        file.seek(SeekFrom::Start(index_offset))?;
        file.read_exact(&mut index_block)?;
        let index = parse_index(path, &index_block)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(BufReader::new(file)),
            index,
            entry_count,
        })
    }

    /// Point lookup
    ///
    /// Returns:
    /// - `Ok(Some(value))`: key found with value
    /// - `Ok(None)`: key found but is a tombstone (deleted)
    /// - `Err(KeyNotFound)`: key not in this SSTable
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let offset = *self.index.get(key).ok_or(RockError::KeyNotFound)?;
        let (_, value) = self.read_entry_at(offset)?;
        Ok(value)
    }

    /// Entries with key `>= start`, in key order
    pub fn range_from(&self, start: &[u8]) -> SSTableIterator<'_> {
        let offsets = self
            .index
            .range::<[u8], _>((Bound::Included(start), Bound::Unbounded));
        SSTableIterator::new(self, offsets)
    }

    /// Every entry in key order
    pub fn iter(&self) -> SSTableIterator<'_> {
        self.range_from(&[])
    }

    /// Decode the entry stored at `offset`
    pub(super) fn read_entry_at(&self, offset: u64) -> Result<SSTableEntry> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut header = [0u8; ENTRY_HEADER_SIZE as usize];
        file.read_exact(&mut header)?;
        let (key_len, val_len) = parse_entry_header(&header);

        let mut key = vec![0u8; key_len];
        file.read_exact(&mut key)?;

        let value = match val_len {
            Some(len) => {
                let mut value = vec![0u8; len];
                file.read_exact(&mut value)?;
                Some(value)
            }
            None => None,
        };

        Ok((key, value))
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn min_key(&self) -> Option<&[u8]> {
        self.index.keys().next().map(|k| k.as_slice())
    }

    pub fn max_key(&self) -> Option<&[u8]> {
        self.index.keys().next_back().map(|k| k.as_slice())
    }

    /// False only if `key` is definitely outside `[min_key, max_key]`
    pub fn might_contain(&self, key: &[u8]) -> bool {
        match (self.min_key(), self.max_key()) {
            (Some(min), Some(max)) => key >= min && key <= max,
            _ => false,
        }
    }
}

/// Parse index records: `[key_len(4)][offset(8)][key]`
fn parse_index(path: &Path, block: &[u8]) -> Result<BTreeMap<Vec<u8>, u64>> {
    let mut index = BTreeMap::new();
    let mut pos = 0;

    while pos < block.len() {
        if pos + 12 > block.len() {
            return Err(corrupt(path, format!("truncated index record at {}", pos)));
        }
        let key_len = u32::from_le_bytes([block[pos], block[pos + 1], block[pos + 2], block[pos + 3]]) as usize;
        let mut offset = [0u8; 8];
        offset.copy_from_slice(&block[pos + 4..pos + 12]);
        pos += 12;

        if pos + key_len > block.len() {
            return Err(corrupt(path, format!("truncated index key at {}", pos)));
        }
        index.insert(block[pos..pos + key_len].to_vec(), u64::from_le_bytes(offset));
        pos += key_len;
    }

    Ok(index)
}

fn corrupt(path: &Path, detail: String) -> RockError {
    RockError::Storage(format!("SSTable {}: {}", path.display(), detail))
}
