//! Tests for Engine
//!
//! These tests verify:
//! - Basic get/set/delete through the `Store` trait
//! - Atomic batches, including across crash recovery
//! - Flush to SSTable when the MemTable fills
//! - Ordered scans merging MemTable and SSTables, tombstones included
//! - Lists stored in the engine survive a restart
//! - Concurrent readers alongside a writer

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Arc;
use std::thread;

use rockredis::arena::{Arena, ArenaBuf};
use rockredis::config::{Config, WalSyncStrategy};
use rockredis::engine::Engine;
use rockredis::list::{self, End, ListMeta};
use rockredis::store::{Batch, Store};
use rockredis::wal::{Operation, WalEntry};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn config_for(dir: &TempDir, memtable_size_limit: usize) -> Config {
    Config::builder()
        .data_dir(dir.path())
        .wal_sync_strategy(WalSyncStrategy::EveryWrite)
        .memtable_size_limit(memtable_size_limit)
        .build()
}

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(config_for(&temp_dir, 1024 * 1024)).unwrap();
    (temp_dir, engine)
}

fn get(engine: &Engine, key: &[u8]) -> Option<Vec<u8>> {
    let mut arena = Arena::new(256);
    let key = arena.copy_from(key);
    engine
        .get(&mut arena, key)
        .unwrap()
        .map(|buf| arena.bytes(&buf).unwrap().to_vec())
}

fn scan_all(engine: &Engine, start: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut arena = Arena::new(256);
    let start = arena.copy_from(start);
    let mut out = Vec::new();
    engine
        .scan(&mut arena, start, &mut |arena: &Arena, key: ArenaBuf, value: ArenaBuf| {
            out.push((
                arena.bytes(&key).unwrap().to_vec(),
                arena.bytes(&value).unwrap().to_vec(),
            ));
            true
        })
        .unwrap();
    out
}

fn wal_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("wal.log")
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_engine_open_creates_directories() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("mydb");

    let _engine = Engine::open_path(&data_dir).unwrap();

    assert!(data_dir.exists());
    assert!(data_dir.join("sstables").exists());
    assert!(data_dir.join("wal.log").exists());
}

#[test]
fn test_set_get_delete() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(get(&engine, b"k"), None);

    engine.set(b"k", b"v1").unwrap();
    assert_eq!(get(&engine, b"k"), Some(b"v1".to_vec()));

    engine.set(b"k", b"v2").unwrap();
    assert_eq!(get(&engine, b"k"), Some(b"v2".to_vec()));

    engine.delete(b"k").unwrap();
    assert_eq!(get(&engine, b"k"), None);
}

#[test]
fn test_batch_applies_puts_and_deletes() {
    let (_temp, engine) = setup_temp_engine();
    engine.set(b"gone", b"x").unwrap();

    let mut arena = Arena::new(256);
    let mut batch = Batch::default();
    batch.put(arena.copy_from(b"a"), arena.copy_from(b"1"));
    batch.put(arena.copy_from(b"b"), arena.copy_from(b"2"));
    batch.delete(arena.copy_from(b"gone"));
    engine.batch(&arena, &batch).unwrap();

    assert_eq!(get(&engine, b"a"), Some(b"1".to_vec()));
    assert_eq!(get(&engine, b"b"), Some(b"2".to_vec()));
    assert_eq!(get(&engine, b"gone"), None);
}

#[test]
fn test_batch_with_stale_handle_changes_nothing() {
    let (_temp, engine) = setup_temp_engine();

    let mut arena = Arena::new(256);
    let mut batch = Batch::default();
    batch.put(arena.copy_from(b"a"), arena.copy_from(b"1"));
    arena.reset();

    assert!(engine.batch(&arena, &batch).is_err());
    assert_eq!(get(&engine, b"a"), None);
    assert_eq!(engine.memtable_entry_count(), 0);
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_recovery_replays_wal() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = Engine::open(config_for(&temp_dir, 1024 * 1024)).unwrap();
        engine.set(b"a", b"1").unwrap();
        engine.set(b"b", b"2").unwrap();
        engine.delete(b"a").unwrap();
        // Dropped without close: only the WAL has these writes
        assert_eq!(engine.sstable_count(), 0);
    }

    let engine = Engine::open(config_for(&temp_dir, 1024 * 1024)).unwrap();

    assert_eq!(get(&engine, b"a"), None);
    assert_eq!(get(&engine, b"b"), Some(b"2".to_vec()));
    // Recovered writes were flushed to an SSTable on open
    assert_eq!(engine.sstable_count(), 1);
    assert_eq!(engine.memtable_entry_count(), 0);
}

#[test]
fn test_acknowledged_writes_survive_kill_before_sync() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .wal_sync_strategy(WalSyncStrategy::EveryNEntries { count: 100 })
        .build();

    {
        let engine = Engine::open(config.clone()).unwrap();
        for i in 0..5u32 {
            engine.set(format!("k{}", i).as_bytes(), b"v").unwrap();
        }
        // No close, no Drop
        std::mem::forget(engine);
    }

    let engine = Engine::open(config).unwrap();
    for i in 0..5u32 {
        assert_eq!(get(&engine, format!("k{}", i).as_bytes()), Some(b"v".to_vec()));
    }
}

#[test]
fn test_torn_batch_is_not_applied() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = Engine::open(config_for(&temp_dir, 1024 * 1024)).unwrap();
        engine.set(b"before", b"ok").unwrap();
    }

    // A crash halfway through appending a batch record
    let record = WalEntry::new(
        2,
        Operation::Batch {
            ops: vec![
                (b"x".to_vec(), Some(b"1".to_vec())),
                (b"y".to_vec(), Some(b"2".to_vec())),
                (b"before".to_vec(), None),
            ],
        },
    )
    .encode_record()
    .unwrap();
    let mut file = OpenOptions::new().append(true).open(wal_path(&temp_dir)).unwrap();
    file.write_all(&record[..record.len() - 3]).unwrap();
    drop(file);

    let engine = Engine::open(config_for(&temp_dir, 1024 * 1024)).unwrap();

    assert_eq!(get(&engine, b"before"), Some(b"ok".to_vec()));
    assert_eq!(get(&engine, b"x"), None);
    assert_eq!(get(&engine, b"y"), None);
}

#[test]
fn test_close_flushes_memtable() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = Engine::open(config_for(&temp_dir, 1024 * 1024)).unwrap();
        engine.set(b"k", b"v").unwrap();
        engine.close().unwrap();
        assert_eq!(engine.sstable_count(), 1);
    }

    assert_eq!(std::fs::metadata(wal_path(&temp_dir)).unwrap().len(), 0);

    let engine = Engine::open(config_for(&temp_dir, 1024 * 1024)).unwrap();
    assert_eq!(get(&engine, b"k"), Some(b"v".to_vec()));
}

// =============================================================================
// Flush + Scan Tests
// =============================================================================

#[test]
fn test_small_memtable_triggers_flush() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(config_for(&temp_dir, 100)).unwrap();

    for i in 0..20u32 {
        engine.set(format!("key{:02}", i).as_bytes(), &[b'v'; 10]).unwrap();
    }

    assert!(engine.sstable_count() > 0);
    assert!(engine.memtable_size() < 100);
    for i in 0..20u32 {
        assert_eq!(get(&engine, format!("key{:02}", i).as_bytes()), Some(vec![b'v'; 10]));
    }
}

#[test]
fn test_scan_merges_memtable_and_sstables() {
    let (_temp, engine) = setup_temp_engine();

    engine.set(b"a", b"1").unwrap();
    engine.set(b"b", b"2").unwrap();
    engine.set(b"c", b"3").unwrap();
    engine.flush().unwrap();

    engine.set(b"b", b"22").unwrap();
    engine.delete(b"c").unwrap();
    engine.flush().unwrap();

    engine.set(b"d", b"4").unwrap();
    engine.delete(b"a").unwrap();

    assert_eq!(engine.sstable_count(), 2);
    assert_eq!(
        scan_all(&engine, b""),
        vec![(b"b".to_vec(), b"22".to_vec()), (b"d".to_vec(), b"4".to_vec())]
    );
    assert_eq!(scan_all(&engine, b"c"), vec![(b"d".to_vec(), b"4".to_vec())]);
}

#[test]
fn test_scan_stops_when_collector_says_so() {
    let (_temp, engine) = setup_temp_engine();
    for key in [b"a", b"b", b"c", b"d"] {
        engine.set(key, b"v").unwrap();
    }

    let mut arena = Arena::new(256);
    let start = arena.copy_from(b"b");
    let mut seen = 0;
    engine
        .scan(&mut arena, start, &mut |_: &Arena, _: ArenaBuf, _: ArenaBuf| {
            seen += 1;
            seen < 2
        })
        .unwrap();

    assert_eq!(seen, 2);
}

// =============================================================================
// Lists on the Engine
// =============================================================================

#[test]
fn test_list_survives_restart() {
    let temp_dir = TempDir::new().unwrap();

    {
        // Tiny MemTable so the list spans several SSTables
        let engine = Engine::open(config_for(&temp_dir, 64)).unwrap();
        let mut arena = Arena::new(1024);
        let user_key = arena.copy_from(b"jobs");
        let meta_key = list::meta_key(&mut arena, user_key).unwrap();

        let values: Vec<_> = (0..5u8).map(|i| arena.copy_from(&[b'a' + i])).collect();
        let batch = list::create(&mut arena, meta_key, &values, 1).unwrap();
        engine.batch(&arena, &batch).unwrap();

        let stored = engine.get(&mut arena, meta_key).unwrap().unwrap();
        let meta = ListMeta::decode(arena.bytes(&stored).unwrap()).unwrap();
        let (popped, batch) = list::pop(&engine, &mut arena, meta_key, &meta, End::Head, 2, 2).unwrap();
        assert_eq!(arena.bytes(&popped[0]).unwrap(), b"a");
        engine.batch(&arena, &batch).unwrap();
    }

    let engine = Engine::open(config_for(&temp_dir, 64)).unwrap();
    let mut arena = Arena::new(1024);
    let user_key = arena.copy_from(b"jobs");
    let meta_key = list::meta_key(&mut arena, user_key).unwrap();
    let stored = engine.get(&mut arena, meta_key).unwrap().unwrap();
    let meta = ListMeta::decode(arena.bytes(&stored).unwrap()).unwrap();

    assert_eq!(meta.count, 3);
    let values = list::range(&engine, &mut arena, meta_key, &meta, 0, -1).unwrap();
    let values: Vec<_> = values.iter().map(|b| arena.bytes(b).unwrap().to_vec()).collect();
    assert_eq!(values, vec![b"c".to_vec(), b"d".to_vec(), b"e".to_vec()]);

    // Popped element records are gone from every layer
    let keys: Vec<_> = scan_all(&engine, b"Djobs:")
        .into_iter()
        .map(|(k, _)| k)
        .filter(|k| k.starts_with(b"Djobs:"))
        .collect();
    assert_eq!(keys.len(), 3);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_readers_and_writer() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Arc::new(Engine::open(config_for(&temp_dir, 4096)).unwrap());

    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0..500u32 {
                engine.set(&i.to_be_bytes(), &i.to_le_bytes()).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..20 {
                    // Every visible key carries its own value
                    for (key, value) in scan_all(&engine, b"") {
                        let n = u32::from_be_bytes([key[0], key[1], key[2], key[3]]);
                        assert_eq!(value, n.to_le_bytes().to_vec());
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(scan_all(&engine, b"").len(), 500);
}
