//! SSTable Builder
//!
//! Streams sorted entries into a new SSTable file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, RockError};

use super::{entry_header, SSTable, ENTRY_HEADER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// Writes one SSTable; entries must arrive in strictly ascending key order
pub struct SSTableBuilder {
    path: PathBuf,
    writer: BufWriter<File>,
    /// Offset the next entry will be written at
    offset: u64,
    /// key → entry offset, in key order
    index: Vec<(Vec<u8>, u64)>,
    data_crc: crc32fast::Hasher,
}

impl SSTableBuilder {
    /// Create the file and write a header with a zero entry count
    pub fn new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&0u64.to_le_bytes())?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            offset: HEADER_SIZE,
            index: Vec::new(),
            data_crc: crc32fast::Hasher::new(),
        })
    }

    /// Add a live value
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.add_entry(key, Some(value))
    }

    /// Add a tombstone
    pub fn add_tombstone(&mut self, key: &[u8]) -> Result<()> {
        self.add_entry(key, None)
    }

    /// Add a value (`Some`) or tombstone (`None`)
    pub fn add_entry(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        if let Some((last, _)) = self.index.last() {
            if key <= last.as_slice() {
                return Err(RockError::Storage(format!(
                    "SSTable keys out of order: '{}' after '{}'",
                    key.escape_ascii(),
                    last.escape_ascii()
                )));
            }
        }

        let header = entry_header(key, value);
        let value = value.unwrap_or_default();

        for part in [&header[..], key, value] {
            self.writer.write_all(part)?;
            self.data_crc.update(part);
        }

        self.index.push((key.to_vec(), self.offset));
        self.offset += ENTRY_HEADER_SIZE + key.len() as u64 + value.len() as u64;
        Ok(())
    }

    /// Number of entries added so far
    pub fn entry_count(&self) -> u64 {
        self.index.len() as u64
    }

    /// Write the index block and footer, patch the entry count, fsync
    pub fn finish(mut self) -> Result<SSTable> {
        let index_offset = self.offset;
        let entry_count = self.entry_count();

        for (key, offset) in &self.index {
            self.writer.write_all(&(key.len() as u32).to_le_bytes())?;
            self.writer.write_all(&offset.to_le_bytes())?;
            self.writer.write_all(key)?;
        }

        let data_crc = self.data_crc.finalize();
        self.writer.write_all(&index_offset.to_le_bytes())?;
        self.writer.write_all(&data_crc.to_le_bytes())?;
        self.writer.write_all(&[0u8; 4])?;

        let mut file = self
            .writer
            .into_inner()
            .map_err(|e| RockError::Storage(format!("failed to flush SSTable: {}", e)))?;

        // Entry count sits right after magic + version
        file.seek(SeekFrom::Start(6))?;
        file.write_all(&entry_count.to_le_bytes())?;
        file.sync_all()?;

        let file_size = file.metadata()?.len();
        let min_key = self.index.first().map(|(k, _)| k.clone()).unwrap_or_default();
        let max_key = self.index.last().map(|(k, _)| k.clone()).unwrap_or_default();

        Ok(SSTable {
            path: self.path,
            entry_count,
            min_key,
            max_key,
            file_size,
        })
    }
}
