//! Merging iterator
//!
//! K-way merge of ordered sources into one ordered stream with a single
//! version per key.
//!
//! ```text
//! source 0 (newest: memtable)  a=1        c=⊥
//! source 1 (sstable 2)         a=0  b=7   c=3
//! source 2 (sstable 1)              b=5         d=9
//!                              ─────────────────────
//! merged                       a=1  b=7         d=9
//! ```
//! For equal keys the lowest-numbered source wins and the shadowed versions
//! are skipped. Tombstones (⊥) hide the key entirely.

use crate::error::Result;

use super::sstable::SSTableEntry;

/// One ordered input, `(key, value-or-tombstone)` in ascending key order
pub type Source<'a> = Box<dyn Iterator<Item = Result<SSTableEntry>> + 'a>;

/// Newest-wins merge over `Source`s ordered newest → oldest
pub struct MergingIterator<'a> {
    sources: Vec<Source<'a>>,
    /// Next unconsumed entry of each source
    heads: Vec<Option<SSTableEntry>>,
    primed: bool,
}

impl<'a> MergingIterator<'a> {
    pub fn new(sources: Vec<Source<'a>>) -> Self {
        let heads = sources.iter().map(|_| None).collect();
        Self {
            sources,
            heads,
            primed: false,
        }
    }

    /// Next winning entry, tombstones included
    pub fn next_entry(&mut self) -> Result<Option<SSTableEntry>> {
        if !self.primed {
            for i in 0..self.sources.len() {
                self.advance(i)?;
            }
            self.primed = true;
        }

        // Strict comparison keeps the newest source on ties
        let mut winner: Option<usize> = None;
        for (i, head) in self.heads.iter().enumerate() {
            let Some((key, _)) = head else { continue };
            let better = match winner.and_then(|w| self.heads[w].as_ref()) {
                Some((best, _)) => key < best,
                None => true,
            };
            if better {
                winner = Some(i);
            }
        }

        let Some(w) = winner else {
            return Ok(None);
        };
        let Some(entry) = self.heads[w].take() else {
            return Ok(None);
        };

        for i in w + 1..self.heads.len() {
            if matches!(&self.heads[i], Some((key, _)) if *key == entry.0) {
                self.advance(i)?;
            }
        }
        self.advance(w)?;

        Ok(Some(entry))
    }

    fn advance(&mut self, i: usize) -> Result<()> {
        self.heads[i] = self.sources[i].next().transpose()?;
        Ok(())
    }
}

impl<'a> Iterator for MergingIterator<'a> {
    /// Live `(key, value)` pairs
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next_entry() {
                Ok(Some((key, Some(value)))) => return Some(Ok((key, value))),
                Ok(Some((_, None))) => continue,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
