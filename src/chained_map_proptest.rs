#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can reach
// the node handles behind map cursors.

use crate::chained_map::{ChainedHashMap, MapCursor};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::Cell;
use std::collections::hash_map::RandomState;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};
use std::rc::Rc;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    InsertWith(usize, i32),
    Emplace(usize, i32),
    EraseKey(usize),
    EraseCursor(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Rehash(usize),
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::InsertWith(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Emplace(i, v)),
            idx.clone().prop_map(OpI::EraseKey),
            idx.clone().prop_map(OpI::EraseCursor),
            idx.clone().prop_map(OpI::Find),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            (0usize..64).prop_map(OpI::Rehash),
            Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_against_model<S: BuildHasher>(
    mut sut: ChainedHashMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut live: HashMap<Key, MapCursor<Key, i32, S>> = HashMap::new();
    let mut stale: Vec<MapCursor<Key, i32, S>> = Vec::new();

    let value_calls = Rc::new(Cell::new(0));
    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let (c, inserted) = sut.insert(k.clone(), v);
                prop_assert_eq!(inserted, !already, "insert succeeds iff key is new");
                if inserted {
                    live.insert(k.clone(), c);
                    model.insert(k, v);
                } else {
                    prop_assert_eq!(Some(&c), live.get(&k), "duplicate returns existing entry");
                    prop_assert_eq!(c.get(&sut).1, &model[&k], "duplicate leaves value unchanged");
                }
            }
            OpI::InsertWith(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let counter = value_calls.clone();
                let before = counter.get();
                let (c, inserted) = sut.insert_with(k.clone(), move || {
                    counter.set(counter.get() + 1);
                    v
                });
                prop_assert_eq!(inserted, !already);
                if inserted {
                    prop_assert_eq!(value_calls.get(), before + 1, "builder must run exactly once on success");
                    live.insert(k.clone(), c);
                    model.insert(k, v);
                } else {
                    prop_assert_eq!(value_calls.get(), before, "builder must not run on duplicate");
                }
            }
            OpI::Emplace(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let kk = k.clone();
                let (c, inserted) = sut.emplace(move || (kk, v));
                prop_assert_eq!(inserted, !already);
                prop_assert_eq!(c.get(&sut).0, &k);
                if inserted {
                    live.insert(k.clone(), c);
                    model.insert(k, v);
                }
            }
            OpI::EraseKey(i) => {
                let k = key_from(pool, i);
                let removed = sut.erase_key(k.0.as_str());
                let expected = usize::from(model.remove(&k).is_some());
                prop_assert_eq!(removed, expected);
                if let Some(c) = live.remove(&k) {
                    stale.push(c);
                }
            }
            OpI::EraseCursor(i) => {
                let k = key_from(pool, i);
                let c = sut.find(&k);
                if let Some(tracked) = live.remove(&k) {
                    prop_assert_eq!(c, tracked);
                    let mut expected_next = c;
                    expected_next.advance(&sut);
                    let next = sut.erase(c);
                    prop_assert_eq!(next, expected_next, "erase returns the successor");
                    model.remove(&k);
                    stale.push(c);
                } else {
                    prop_assert_eq!(c, sut.end());
                    prop_assert_eq!(sut.erase(c), sut.end());
                }
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                let c = sut.find(&k);
                match model.get(&k) {
                    Some(v) => {
                        prop_assert_eq!(Some(&c), live.get(&k), "cursor stable for live entry");
                        prop_assert_eq!(c.get(&sut).1, v);
                    }
                    None => prop_assert_eq!(c, sut.end()),
                }
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(&c) = live.get(&k) {
                    let vr = c.get_mut(&mut sut).1;
                    *vr = vr.saturating_add(d);
                    if let Some(mv) = model.get_mut(&k) {
                        *mv = mv.saturating_add(d);
                    }
                }
            }
            OpI::Rehash(n) => {
                let before = sut.bucket_count();
                sut.rehash(n).map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert!(sut.bucket_count() >= before, "rehash never shrinks the index");
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);

                let mut walked = Vec::new();
                let mut c = sut.begin();
                while c != sut.end() {
                    walked.push(c.get(&sut).0.clone());
                    c.advance(&sut);
                }
                let iterated: Vec<Key> = sut.keys().cloned().collect();
                prop_assert_eq!(walked, iterated, "cursor walk and iter agree on order");
            }
        }

        // Post-conditions after each op
        for c in &stale {
            prop_assert!(c.try_get(&sut).is_none(), "stale cursor must not resolve");
        }
        for (k, c) in &live {
            prop_assert_eq!(c.get(&sut).0, k);
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.load_factor() <= sut.max_load_factor());
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - Duplicate keys are rejected; the existing entry's cursor is returned.
// - `find`/`contains_key` parity and cursor stability for live entries,
//   including across rehashes.
// - Erasing through a cursor returns its successor and invalidates it.
// - Cursor traversal and `iter` visit the same entries in the same order.
// - The load factor never exceeds the configured maximum.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: ChainedHashMap<Key, i32, RandomState> = ChainedHashMap::with_buckets(3);
        run_against_model(sut, &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior (constant hasher). Every entry lives in one chain, so
// this stresses unlinking from the head, middle and tail.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut: ChainedHashMap<Key, i32, ConstBuildHasher> = ChainedHashMap::with_hasher(ConstBuildHasher);
        run_against_model(sut, &pool, ops)?;
    }
}
