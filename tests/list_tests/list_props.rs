//! Property tests for the list encoding
//!
//! Random sequences of pushes, pops and trims are applied to a list in a
//! [`MemStore`] and to a `VecDeque` model. After every step the stored list
//! must match the model and its element keys must be exactly
//! `min_seq .. min_seq + count`.

use std::collections::VecDeque;

use proptest::prelude::*;
use rockredis::arena::{Arena, ArenaBuf};
use rockredis::list::{self, End, ListMeta};
use rockredis::store::{MemStore, Store};

#[derive(Debug, Clone)]
enum Op {
    Push(End, Vec<u8>),
    Pop(End, u32),
    Trim(i64, i64),
}

fn end_strategy() -> impl Strategy<Value = End> {
    prop_oneof![Just(End::Head), Just(End::Tail)]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (end_strategy(), prop::collection::vec(any::<u8>(), 1..4)).prop_map(|(e, v)| Op::Push(e, v)),
        2 => (end_strategy(), 0u32..4).prop_map(|(e, n)| Op::Pop(e, n)),
        1 => (-6i64..6, -6i64..6).prop_map(|(a, b)| Op::Trim(a, b)),
    ]
}

fn read_meta(store: &MemStore, arena: &mut Arena, meta_key: ArenaBuf) -> Option<ListMeta> {
    store
        .get(arena, meta_key)
        .unwrap()
        .map(|buf| ListMeta::decode(arena.bytes(&buf).unwrap()).unwrap())
}

/// Apply one op to the store; element values are single bytes
fn apply(store: &MemStore, arena: &mut Arena, meta_key: ArenaBuf, op: &Op) {
    let meta = read_meta(store, arena, meta_key);

    let batch = match (op, meta) {
        (Op::Push(end, values), meta) => {
            let values: Vec<ArenaBuf> = values.iter().map(|v| arena.copy_from(&[*v])).collect();
            match (meta, end) {
                (None, End::Tail) => list::create(arena, meta_key, &values, 0).unwrap(),
                (None, End::Head) => {
                    let reversed: Vec<_> = values.iter().rev().copied().collect();
                    list::create(arena, meta_key, &reversed, 0).unwrap()
                }
                (Some(meta), End::Head) => list::lpush(arena, meta_key, &meta, &values, 0).unwrap(),
                (Some(meta), End::Tail) => list::rpush(arena, meta_key, &meta, &values, 0).unwrap(),
            }
        }
        (Op::Pop(end, n), Some(meta)) => list::pop(store, arena, meta_key, &meta, *end, *n, 0).unwrap().1,
        (Op::Trim(start, stop), Some(meta)) => {
            let (left, right) = list::ltrim_counts(&meta, *start, *stop);
            list::trim(arena, meta_key, &meta, left, right, 0).unwrap()
        }
        (_, None) => return,
    };

    store.batch(arena, &batch).unwrap();
}

/// Apply one op to the model
fn model_apply(model: &mut VecDeque<u8>, op: &Op) {
    match op {
        Op::Push(End::Head, values) => values.iter().for_each(|v| model.push_front(*v)),
        Op::Push(End::Tail, values) => model.extend(values.iter().copied()),
        Op::Pop(End::Head, n) => {
            let n = (*n as usize).min(model.len());
            model.drain(..n);
        }
        Op::Pop(End::Tail, n) => {
            let n = (*n as usize).min(model.len());
            model.truncate(model.len() - n);
        }
        Op::Trim(start, stop) => match list::normalize_range(model.len() as u32, *start, *stop) {
            Some((start, stop)) => {
                model.truncate(stop as usize + 1);
                model.drain(..start as usize);
            }
            None => model.clear(),
        },
    }
}

proptest! {
    #[test]
    fn list_matches_model_and_keys_stay_contiguous(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let store = MemStore::new();
        let mut arena = Arena::new(1024);
        let mut model = VecDeque::new();

        for op in &ops {
            arena.reset();
            let user_key = arena.copy_from(b"p");
            let meta_key = list::meta_key(&mut arena, user_key).unwrap();

            apply(&store, &mut arena, meta_key, op);
            model_apply(&mut model, op);

            let meta = read_meta(&store, &mut arena, meta_key);
            let seqs: Vec<u32> = store
                .keys_with_prefix(b"Dp:")
                .iter()
                .map(|k| u32::from_be_bytes([k[3], k[4], k[5], k[6]]))
                .collect();

            match meta {
                None => {
                    prop_assert!(model.is_empty());
                    prop_assert!(seqs.is_empty());
                    prop_assert!(store.is_empty());
                }
                Some(meta) => {
                    prop_assert_eq!(meta.count as usize, model.len());
                    let expected: Vec<u32> = (meta.min_seq..meta.min_seq + meta.count).collect();
                    prop_assert_eq!(seqs, expected);

                    let values = list::range(&store, &mut arena, meta_key, &meta, 0, -1).unwrap();
                    let stored: Vec<u8> = values.iter().map(|b| arena.bytes(b).unwrap()[0]).collect();
                    let expected: Vec<u8> = model.iter().copied().collect();
                    prop_assert_eq!(stored, expected);
                }
            }
        }
    }

    #[test]
    fn pop_returns_elements_in_pop_order(
        values in prop::collection::vec(any::<u8>(), 1..20),
        n in 0u32..25,
        from_head in any::<bool>(),
    ) {
        let store = MemStore::new();
        let mut arena = Arena::new(1024);
        let user_key = arena.copy_from(b"q");
        let meta_key = list::meta_key(&mut arena, user_key).unwrap();

        let bufs: Vec<ArenaBuf> = values.iter().map(|v| arena.copy_from(&[*v])).collect();
        let batch = list::create(&mut arena, meta_key, &bufs, 0).unwrap();
        store.batch(&arena, &batch).unwrap();

        let meta = read_meta(&store, &mut arena, meta_key).unwrap();
        let end = if from_head { End::Head } else { End::Tail };
        let (popped, _) = list::pop(&store, &mut arena, meta_key, &meta, end, n, 0).unwrap();
        let popped: Vec<u8> = popped.iter().map(|b| arena.bytes(b).unwrap()[0]).collect();

        let take = (n as usize).min(values.len());
        let expected: Vec<u8> = if from_head {
            values[..take].to_vec()
        } else {
            values.iter().rev().take(take).copied().collect()
        };
        prop_assert_eq!(popped, expected);
    }
}
