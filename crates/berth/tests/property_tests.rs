//! Property-based tests for the three containers.
//!
//! Each container is model-checked against the matching std collection under
//! random operation sequences, with its own `validate()` audit asserted
//! along the way:
//!
//! - `FlatPq` against a sorted Vec (multiset behavior)
//! - `HandleMap` against `HashMap`, plus the handle-stability guarantee
//! - `WavlMap` against `BTreeSet` (membership, order, ranges)

use berth::{Buf, FlatPq, Handle, HandleMap, HeapOrder, WavlMap};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

// =============================================================================
// Flat priority queue
// =============================================================================

proptest! {
    /// After any interleaving of pushes and pops, the heap shape holds and
    /// pops drain in comparator order.
    #[test]
    fn prop_pq_matches_sorted_model(
        ops in prop::collection::vec(prop::option::of(0u32..1000), 1..200),
    ) {
        let mut pq = FlatPq::new(HeapOrder::Min, |a: &u32, b: &u32| a.cmp(b));
        let mut model: Vec<u32> = Vec::new();

        for op in ops {
            match op {
                Some(v) => {
                    pq.push(v).unwrap();
                    model.push(v);
                    model.sort_unstable();
                }
                None => {
                    let want = if model.is_empty() {
                        None
                    } else {
                        Some(model.remove(0))
                    };
                    prop_assert_eq!(pq.pop(), want);
                }
            }
            prop_assert!(pq.validate(), "heap shape broken mid-sequence");
            prop_assert_eq!(pq.len(), model.len());
        }
    }

    /// Heapsort returns the multiset sorted opposite to the heap order.
    #[test]
    fn prop_heapsort_sorts_and_preserves_the_multiset(
        values in prop::collection::vec(0u32..100, 0..100),
    ) {
        let pq = FlatPq::from_buf(
            Buf::from_vec(values.clone()),
            HeapOrder::Min,
            |a: &u32, b: &u32| a.cmp(b),
        );
        let sorted = pq.heapsort();

        let mut expect = values;
        expect.sort_unstable_by(|a, b| b.cmp(a)); // descending for a Min queue
        prop_assert_eq!(sorted.as_slice(), expect.as_slice());
    }

    /// Bulk heapify and one-by-one pushing describe the same queue.
    #[test]
    fn prop_heapify_equals_pushing(
        values in prop::collection::vec(0u32..100, 0..100),
    ) {
        let cmp = |a: &u32, b: &u32| a.cmp(b);
        let mut bulk = FlatPq::from_buf(Buf::from_vec(values.clone()), HeapOrder::Max, cmp);
        let mut incremental = FlatPq::new(HeapOrder::Max, cmp);
        for &v in &values {
            incremental.push(v).unwrap();
        }
        loop {
            let (a, b) = (bulk.pop(), incremental.pop());
            prop_assert_eq!(a, b);
            if a.is_none() {
                break;
            }
        }
    }

    /// Erase by position removes exactly that element.
    #[test]
    fn prop_pq_erase_removes_the_addressed_element(
        values in prop::collection::vec(0u32..1000, 1..64),
        pick in prop::num::usize::ANY,
    ) {
        let mut pq = FlatPq::from_buf(
            Buf::from_vec(values.clone()),
            HeapOrder::Min,
            |a: &u32, b: &u32| a.cmp(b),
        );
        let i = pick % pq.len();
        let victim = pq.as_slice()[i];
        prop_assert_eq!(pq.erase(i), Some(victim));
        prop_assert!(pq.validate());

        let mut remaining: Vec<u32> = Vec::new();
        while let Some(v) = pq.pop() {
            remaining.push(v);
        }
        let mut expect = values;
        let at = expect.iter().position(|&v| v == victim).unwrap();
        expect.remove(at);
        expect.sort_unstable();
        prop_assert_eq!(remaining, expect);
    }
}

// =============================================================================
// Handle hash map
// =============================================================================

proptest! {
    /// Membership tracks `HashMap`, overwrites keep the handle, and every
    /// live handle resolves to its element after every operation (handle
    /// stability), with Robin Hood displacement audited by `validate()`.
    #[test]
    fn prop_handle_map_matches_std_and_keeps_handles(
        ops in prop::collection::vec((0u32..60, prop::bool::ANY), 1..250),
    ) {
        let mut map = HandleMap::with_capacity(
            0,
            |e: &(u32, u64)| &e.0,
            |k: &u32| splitmix64(u64::from(*k)),
        );
        let mut model: HashMap<u32, u64> = HashMap::new();
        let mut handles: HashMap<u32, Handle> = HashMap::new();
        let mut stamp = 0u64;

        for (key, insert) in ops {
            if insert {
                stamp += 1;
                let (h, _old) = map.insert_or_assign((key, stamp)).unwrap();
                if let Some(&prev) = handles.get(&key) {
                    prop_assert_eq!(prev, h, "overwrite moved a payload slot");
                }
                handles.insert(key, h);
                model.insert(key, stamp);
            } else {
                let got = map.remove(&key).map(|e| e.1);
                prop_assert_eq!(got, model.remove(&key));
                handles.remove(&key);
            }

            for (k, h) in &handles {
                let elem = map.get_handle(*h);
                prop_assert_eq!(elem.map(|e| e.0), Some(*k), "handle lost its element");
                prop_assert_eq!(elem.map(|e| e.1), model.get(k).copied());
            }
            prop_assert!(map.validate(), "table audit failed mid-sequence");
            prop_assert_eq!(map.len(), model.len());
        }
    }

    /// `insert_or_assign` followed by `get` observes the assigned value.
    #[test]
    fn prop_map_round_trip(key in 0u32..1000, value in prop::num::u64::ANY) {
        let mut map = HandleMap::with_capacity(
            4,
            |e: &(u32, u64)| &e.0,
            |k: &u32| splitmix64(u64::from(*k)),
        );
        map.insert_or_assign((key, 0)).unwrap();
        map.insert_or_assign((key, value)).unwrap();
        prop_assert_eq!(map.get(&key), Some(&(key, value)));
    }
}

// =============================================================================
// WAVL ordered map
// =============================================================================

proptest! {
    /// Membership and in-order iteration track `BTreeSet`; the rank rules
    /// hold after every single operation.
    #[test]
    fn prop_wavl_matches_btree(
        ops in prop::collection::vec((0u32..80, prop::bool::ANY), 1..250),
    ) {
        let mut map = WavlMap::new(|e: &u32| e);
        let mut model = BTreeSet::new();

        for (key, insert) in ops {
            if insert {
                prop_assert_eq!(map.try_insert(key).unwrap(), model.insert(key));
            } else {
                prop_assert_eq!(map.remove(&key).is_some(), model.remove(&key));
            }
            prop_assert!(map.validate(), "rank or order rule broken mid-sequence");
            prop_assert_eq!(map.len(), model.len());
        }

        let got: Vec<u32> = map.iter().copied().collect();
        let want: Vec<u32> = model.iter().copied().collect();
        prop_assert_eq!(got, want);
    }

    /// `equal_range` agrees with `BTreeSet::range` over the half-open
    /// interval.
    #[test]
    fn prop_equal_range_matches_btree_range(
        keys in prop::collection::hash_set(0u32..100, 0..60),
        a in 0u32..100,
        b in 0u32..100,
    ) {
        let mut map = WavlMap::new(|e: &u32| e);
        for &k in &keys {
            map.try_insert(k).unwrap();
        }
        let model: BTreeSet<u32> = keys.iter().copied().collect();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        let got: Vec<u32> = map.equal_range(&lo, &hi).copied().collect();
        let want: Vec<u32> = model.range(lo..hi).copied().collect();
        prop_assert_eq!(got, want);

        let got_rev: Vec<u32> = map.equal_rrange(&hi, &lo).map(|v| *v).collect();
        let want_rev: Vec<u32> = model
            .range((
                std::ops::Bound::Excluded(lo),
                std::ops::Bound::Included(hi),
            ))
            .rev()
            .copied()
            .collect();
        prop_assert_eq!(got_rev, want_rev);
    }
}
