use super::*;

use crate::arena::EMPTY_HEIGHT;
use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

/// Checks every structural invariant of the map, panicking on the first breach.
pub(crate) fn validate_map<V, H>(m: &FixedMap<V, H>) {
    fn walk<V>(
        arena: &Arena<V>,
        at: SlotIdx,
        lo: Option<i32>,
        hi: Option<i32>,
        seen: &mut [bool],
    ) -> i8 {
        if at.is_nil() {
            return EMPTY_HEIGHT;
        }
        assert!(!seen[at.get()], "slot {at:?} reachable twice");
        seen[at.get()] = true;

        let slot = arena.slot(at);
        assert!(arena.is_occupied(at), "reachable slot {at:?} not marked occupied");
        assert!(slot.value.is_some(), "reachable slot {at:?} has no value");
        if let Some(lo) = lo {
            assert!(slot.key > lo, "BST order broken at {at:?}");
        }
        if let Some(hi) = hi {
            assert!(slot.key < hi, "BST order broken at {at:?}");
        }

        let l = walk(arena, slot.left, lo, Some(slot.key), seen);
        let r = walk(arena, slot.right, Some(slot.key), hi, seen);
        assert!((l - r).abs() <= 1, "AVL balance broken at {at:?}");
        assert_eq!(slot.height, l.max(r) + 1, "stored height stale at {at:?}");
        slot.height
    }

    let arena = &m.arena;
    let mut seen = vec![false; arena.capacity()];
    walk(arena, m.root, None, None, &mut seen);

    for (i, &reachable) in seen.iter().enumerate() {
        let idx = SlotIdx::new(i);
        assert_eq!(
            arena.is_occupied(idx),
            reachable,
            "bitmap disagrees with tree at slot {i}"
        );
        if !reachable {
            let slot = arena.slot(idx);
            assert!(slot.value.is_none(), "free slot {i} still holds a value");
            assert_eq!(slot.height, EMPTY_HEIGHT);
        }
    }
    assert_eq!(seen.iter().filter(|&&r| r).count(), m.count);
    assert_eq!(arena.occupied(), m.count, "bitmap popcount must match len");
    assert!(m.count <= arena.capacity());
}

/// Reference model: a `BTreeMap` keyed by hash with the same capacity rule.
struct Model<H> {
    map: BTreeMap<i32, u16>,
    capacity: usize,
    hasher: H,
}

impl<H: KeyHasher> Model<H> {
    fn set(&mut self, key: &str, value: u16) -> bool {
        let hash = self.hasher.hash_key(key);
        if self.map.len() >= self.capacity || self.map.contains_key(&hash) {
            return false;
        }
        self.map.insert(hash, value);
        true
    }

    fn get(&self, key: &str) -> Option<u16> {
        self.map.get(&self.hasher.hash_key(key)).copied()
    }

    fn delete(&mut self, key: &str) -> Option<u16> {
        self.map.remove(&self.hasher.hash_key(key))
    }
}

/// Keys are drawn from a small pool so that sets, gets and deletes collide often.
const KEY_POOL: u8 = 40;

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 50)]
    Set(#[proptest(strategy = "0..KEY_POOL")] u8, u16),
    #[proptest(weight = 25)]
    Delete(#[proptest(strategy = "0..KEY_POOL")] u8),
    #[proptest(weight = 24)]
    Get(#[proptest(strategy = "0..KEY_POOL")] u8),
    #[proptest(weight = 1)]
    Clear,
}

fn word_key(i: u8) -> String {
    format!("k{i}")
}

fn int_key(i: u8) -> String {
    (i32::from(i) - i32::from(KEY_POOL / 2)).to_string()
}

fn run_ops<H: KeyHasher + Clone>(
    capacity: usize,
    hasher: H,
    key_of: fn(u8) -> String,
    ops: Vec<Op>,
) -> std::result::Result<(), TestCaseError> {
    let mut m: FixedMap<u16, H> = FixedMap::with_hasher(capacity, hasher.clone()).unwrap();
    let mut model = Model {
        map: BTreeMap::new(),
        capacity,
        hasher,
    };

    for op in ops {
        match op {
            Op::Set(key, value) => {
                let key = key_of(key);
                prop_assert_eq!(m.set(&key, value), model.set(&key, value));
            }
            Op::Delete(key) => {
                let key = key_of(key);
                prop_assert_eq!(m.delete(&key), model.delete(&key));
            }
            Op::Get(key) => {
                let key = key_of(key);
                prop_assert_eq!(m.get(&key).copied(), model.get(&key));
            }
            Op::Clear => {
                m.clear();
                model.map.clear();
            }
        }
        prop_assert_eq!(m.len(), model.map.len());
        prop_assert!((m.load() - model.map.len() as f32 / capacity as f32).abs() < 1e-5);
    }

    validate_map(&m);
    let got: Vec<(i32, u16)> = m.iter().map(|(h, v)| (h, *v)).collect();
    let expected: Vec<(i32, u16)> = model.map.into_iter().collect();
    prop_assert_eq!(got, expected);
    Ok(())
}

fn parse_key(k: &str) -> i32 {
    k.parse().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_words(
        capacity in 1usize..=48,
        ops in prop::collection::vec(any::<Op>(), 0..=600),
    ) {
        run_ops(capacity, Poly31, word_key, ops)?;
    }

    #[test]
    fn prop_equivalence_ints(
        capacity in 1usize..=128,
        ops in prop::collection::vec(any::<Op>(), 0..=600),
    ) {
        run_ops(capacity, parse_key as fn(&str) -> i32, int_key, ops)?;
    }

    #[test]
    fn prop_balanced_after_every_op(
        keys in prop::collection::vec(any::<i32>(), 1..=200),
        deletes in prop::collection::vec(any::<prop::sample::Index>(), 0..=200),
    ) {
        let mut m = FixedMap::with_hasher(keys.len(), parse_key as fn(&str) -> i32).unwrap();
        for k in &keys {
            m.set(&k.to_string(), *k);
            validate_map(&m);
        }
        for d in deletes {
            let k = d.get(&keys);
            m.delete(&k.to_string());
            validate_map(&m);
        }
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

const SMALL_SET: [&str; 7] = ["50", "30", "70", "20", "40", "60", "80"];

#[test]
fn exhaustive_insert_order_small_set() {
    for_each_permutation(&SMALL_SET, |perm| {
        let mut m = FixedMap::with_hasher(SMALL_SET.len(), parse_key).unwrap();
        for k in &perm {
            assert!(m.set(k, parse_key(k)));
            validate_map(&m);
        }
        let got: Vec<i32> = m.iter().map(|(h, _)| h).collect();
        assert_eq!(got, vec![20, 30, 40, 50, 60, 70, 80]);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    // Insert in a fixed order, then remove in all permutations.
    let mut base = FixedMap::with_hasher(SMALL_SET.len(), parse_key).unwrap();
    for k in SMALL_SET {
        assert!(base.set(k, parse_key(k)));
    }

    for_each_permutation(&SMALL_SET, |perm| {
        let mut m = base.clone();
        for k in perm {
            assert_eq!(m.delete(k), Some(parse_key(k)));
            assert_eq!(m.get(k), None);
            validate_map(&m);
        }
        assert!(m.is_empty());
        assert!(m.root.is_nil());
        // Every slot is reusable once the tree is empty.
        for k in SMALL_SET {
            assert!(m.set(k, 0));
        }
        assert!(m.is_full());
    });
}
