//! Tests for StorageManager
//!
//! These tests verify:
//! - Flushing a MemTable into a new SSTable
//! - Newest-first lookups across several tables
//! - Tombstones shadowing older values
//! - Reloading tables on reopen
//! - Merged scans over the published tables

use rockredis::memtable::MemTable;
use rockredis::storage::{MergingIterator, Source, StorageManager};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn memtable_with(entries: &[(&[u8], Option<&[u8]>)]) -> MemTable {
    let table = MemTable::new();
    for (key, value) in entries {
        match value {
            Some(v) => table.put(key.to_vec(), v.to_vec()),
            None => table.delete(key.to_vec()),
        };
    }
    table
}

// =============================================================================
// Flush Tests
// =============================================================================

#[test]
fn test_open_empty_dir() {
    let temp = TempDir::new().unwrap();
    let manager = StorageManager::open(temp.path()).unwrap();

    assert_eq!(manager.sstable_count(), 0);
    assert_eq!(manager.next_sstable_id(), 1);
    assert_eq!(manager.get(b"anything").unwrap(), None);
}

#[test]
fn test_flush_creates_sstable() {
    let temp = TempDir::new().unwrap();
    let manager = StorageManager::open(temp.path()).unwrap();

    let table = manager
        .flush(&memtable_with(&[(b"a", Some(b"1")), (b"b", Some(b"2"))]))
        .unwrap();

    assert_eq!(table.entry_count, 2);
    assert!(table.path.ends_with("sstable_000001.sst"));
    assert_eq!(manager.sstable_count(), 1);
    assert_eq!(manager.get(b"a").unwrap(), Some(b"1".to_vec()));
}

#[test]
fn test_flush_empty_memtable_fails() {
    let temp = TempDir::new().unwrap();
    let manager = StorageManager::open(temp.path()).unwrap();

    assert!(manager.flush(&MemTable::new()).is_err());
}

// =============================================================================
// Lookup Precedence
// =============================================================================

#[test]
fn test_newest_table_wins() {
    let temp = TempDir::new().unwrap();
    let manager = StorageManager::open(temp.path()).unwrap();

    manager.flush(&memtable_with(&[(b"k", Some(b"old")), (b"x", Some(b"1"))])).unwrap();
    manager.flush(&memtable_with(&[(b"k", Some(b"new"))])).unwrap();

    assert_eq!(manager.get(b"k").unwrap(), Some(b"new".to_vec()));
    assert_eq!(manager.get(b"x").unwrap(), Some(b"1".to_vec()));
}

#[test]
fn test_tombstone_shadows_older_value() {
    let temp = TempDir::new().unwrap();
    let manager = StorageManager::open(temp.path()).unwrap();

    manager.flush(&memtable_with(&[(b"k", Some(b"v"))])).unwrap();
    manager.flush(&memtable_with(&[(b"k", None)])).unwrap();

    assert_eq!(manager.get(b"k").unwrap(), None);
}

// =============================================================================
// Reopen Tests
// =============================================================================

#[test]
fn test_reopen_loads_tables_newest_first() {
    let temp = TempDir::new().unwrap();

    {
        let manager = StorageManager::open(temp.path()).unwrap();
        manager.flush(&memtable_with(&[(b"k", Some(b"1"))])).unwrap();
        manager.flush(&memtable_with(&[(b"k", Some(b"2"))])).unwrap();
    }

    let manager = StorageManager::open(temp.path()).unwrap();

    assert_eq!(manager.sstable_count(), 2);
    assert_eq!(manager.next_sstable_id(), 3);
    assert_eq!(manager.get(b"k").unwrap(), Some(b"2".to_vec()));
}

#[test]
fn test_reopen_ignores_foreign_files() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("notes.txt"), b"hello").unwrap();
    std::fs::write(temp.path().join("sstable_abc.sst"), b"junk").unwrap();

    let manager = StorageManager::open(temp.path()).unwrap();
    assert_eq!(manager.sstable_count(), 0);
}

// =============================================================================
// Merged Scans
// =============================================================================

#[test]
fn test_merging_tables_hides_deleted_keys() {
    let temp = TempDir::new().unwrap();
    let manager = StorageManager::open(temp.path()).unwrap();

    manager
        .flush(&memtable_with(&[(b"a", Some(b"1")), (b"b", Some(b"2")), (b"c", Some(b"3"))]))
        .unwrap();
    manager
        .flush(&memtable_with(&[(b"b", None), (b"c", Some(b"33")), (b"d", Some(b"4"))]))
        .unwrap();

    let tables = manager.tables();
    let sources: Vec<Source<'_>> = tables
        .iter()
        .map(|t| Box::new(t.iter()) as Source<'_>)
        .collect();
    let merged: Vec<_> = MergingIterator::new(sources)
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        merged,
        vec![
            (b"a".to_vec(), b"1".to_vec()),
            (b"c".to_vec(), b"33".to_vec()),
            (b"d".to_vec(), b"4".to_vec()),
        ]
    );
}
