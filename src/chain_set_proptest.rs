#![cfg(test)]

// Property tests for ChainSet kept inside the crate so they can check the
// bucket structure directly through `check_invariants`.

use crate::ChainSet;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

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
    Insert(usize),
    InsertAll(Vec<usize>),
    Erase(usize),
    Take(usize),
    Find(usize),
    Contains(String),
    Rehash(usize),
    Reserve(usize),
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=40).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => idx.clone().prop_map(OpI::Insert),
            1 => proptest::collection::vec(idx.clone(), 0..12).prop_map(OpI::InsertAll),
            3 => idx.clone().prop_map(OpI::Erase),
            1 => idx.clone().prop_map(OpI::Take),
            2 => idx.clone().prop_map(OpI::Find),
            2 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => (0usize..200).prop_map(OpI::Rehash),
            1 => (0usize..200).prop_map(OpI::Reserve),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Drives a ChainSet and a std HashSet with the same operations and compares
// them after every step.
fn run_state_machine<S: BuildHasher>(
    mut sut: ChainSet<Key, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashSet<Key> = HashSet::new();
    for op in ops {
        match op {
            OpI::Insert(i) => {
                let k = key_from(pool, i);
                let fresh = !model.contains(&k);
                let (c, inserted) = sut.insert(k.clone());
                prop_assert_eq!(inserted, fresh);
                prop_assert_eq!(c.get(), Some(&k));
                model.insert(k);
            }
            OpI::InsertAll(is) => {
                let keys: Vec<Key> = is.iter().map(|&i| key_from(pool, i)).collect();
                sut.insert_all(keys.iter().cloned());
                model.extend(keys);
            }
            OpI::Erase(i) => {
                let k = key_from(pool, i);
                let before = sut.capacity();
                let removed = sut.erase(&k);
                prop_assert_eq!(removed, usize::from(model.remove(&k)));
                prop_assert_eq!(sut.count(&k), 0);
                prop_assert_eq!(sut.capacity(), before, "erase must not resize");
            }
            OpI::Take(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.take(&k), model.take(&k));
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                let c = sut.find(&k);
                if model.contains(&k) {
                    prop_assert_eq!(c.get(), Some(&k));
                } else {
                    prop_assert!(c == sut.end());
                }
            }
            OpI::Contains(s) => {
                let has = sut.contains(s.as_str());
                let has_model = model.iter().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
                prop_assert_eq!(sut.count(s.as_str()), usize::from(has_model));
            }
            OpI::Rehash(n) => {
                sut.rehash(n);
                prop_assert!(sut.capacity() >= n);
            }
            OpI::Reserve(n) => {
                sut.reserve(n);
                prop_assert!(n * 10 < sut.capacity() * 7, "reserved target must fit");
            }
            OpI::Iterate => {
                let seen: Vec<Key> = sut.iter().cloned().collect();
                let unique: BTreeSet<Key> = seen.iter().cloned().collect();
                prop_assert_eq!(seen.len(), unique.len(), "iteration repeated a key");
                let m_keys: BTreeSet<Key> = model.iter().cloned().collect();
                prop_assert_eq!(unique, m_keys);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), 12);
            }
        }

        sut.check_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashSet.
// Invariants exercised across random operation sequences:
// - insert reports "inserted" exactly for absent keys and lands on the key.
// - erase/take remove exactly present keys and never shrink the table.
// - find/contains/count parity with the model, including borrowed lookups.
// - Every node sits in the bucket of its stored hash, all nodes are
//   reachable exactly once, and len * 10 < buckets * 7 after every op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(ChainSet::new(), &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress chain traversal and
// unlinking inside a single bucket.
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

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine(ChainSet::with_hasher(ConstBuildHasher), &pool, ops)?;
    }
}

// Property: clones are deep. Mutating the clone leaves the original's
// membership untouched and vice versa.
proptest! {
    #[test]
    fn prop_clone_independence(
        base in proptest::collection::vec(0u16..500, 0..200),
        extra in proptest::collection::vec(0u16..500, 0..50),
        gone in proptest::collection::vec(0u16..500, 0..50),
    ) {
        let a: ChainSet<u16> = base.iter().copied().collect();
        let before: BTreeSet<u16> = a.iter().copied().collect();
        let mut b = a.clone();
        prop_assert!(a == b);
        b.insert_all(extra.iter().copied());
        for g in &gone {
            b.erase(g);
        }
        b.check_invariants();
        let after: BTreeSet<u16> = a.iter().copied().collect();
        prop_assert_eq!(before, after);

        let mut a = a;
        let b_snapshot: BTreeSet<u16> = b.iter().copied().collect();
        a.clear();
        let b_after: BTreeSet<u16> = b.iter().copied().collect();
        prop_assert_eq!(b_snapshot, b_after);
    }
}

// Property: equality is order-independent set equality.
proptest! {
    #[test]
    fn prop_equality_is_set_equality(
        keys in proptest::collection::vec(any::<i32>(), 0..150),
        seed in any::<u64>(),
    ) {
        let a: ChainSet<i32> = keys.iter().copied().collect();
        let mut shuffled = keys.clone();
        // Deterministic permutation from the seed.
        let mut s = seed | 1;
        for i in (1..shuffled.len()).rev() {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
            shuffled.swap(i, (s >> 33) as usize % (i + 1));
        }
        let b: ChainSet<i32> = shuffled.iter().copied().collect();
        prop_assert!(a == b);

        if let Some(&victim) = keys.first() {
            let mut c = b.clone();
            c.erase(&victim);
            prop_assert!(a != c);
        }
    }
}
