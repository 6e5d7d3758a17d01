//! Integration tests for the handle hash map: handle stability across
//! resizes and under sustained churn.

use berth::{Handle, HandleMap};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

type Rec = (u32, i64);

fn key_of(r: &Rec) -> &u32 {
    &r.0
}

fn hash_of(k: &u32) -> u64 {
    splitmix64(u64::from(*k))
}

fn growable_map() -> HandleMap<'static, Rec, u32, fn(&Rec) -> &u32, fn(&u32) -> u64> {
    HandleMap::with_capacity(0, key_of, hash_of)
}

/// Handles recorded immediately after each insert keep resolving to their
/// elements through every resize on the way to 50 live keys.
#[test]
fn handles_recorded_at_insert_survive_resizes() {
    let mut map = growable_map();
    let mut recorded: Vec<(u32, Handle)> = Vec::new();

    for id in 0..50 {
        let (h, inserted) = map.try_insert((id, i64::from(id) * 7)).unwrap();
        assert!(inserted);
        recorded.push((id, h));

        for (past, handle) in &recorded {
            assert_eq!(
                map.get_handle(*handle),
                Some(&(*past, i64::from(*past) * 7)),
                "handle for key {past} stopped resolving at size {}",
                map.len()
            );
        }
    }

    assert_eq!(map.len(), 50);
    assert!(map.capacity() >= 50);
    assert!(map.validate());
}

/// Random insert/overwrite/remove churn against a `HashMap` model. The map
/// grows through several prime capacities while live handles stay valid.
#[test]
fn churn_against_a_model() {
    let mut rng = StdRng::seed_from_u64(0x0be5_11e5);
    let mut map = growable_map();
    let mut model: HashMap<u32, i64> = HashMap::new();
    let mut handles: HashMap<u32, Handle> = HashMap::new();

    for round in 0..4000 {
        let key = rng.gen_range(0..512u32);
        if rng.gen_bool(0.6) {
            let val = rng.gen_range(-1000..1000i64);
            let (h, old) = map.insert_or_assign((key, val)).unwrap();
            assert_eq!(old.map(|e| e.1), model.insert(key, val));
            if let Some(&prev) = handles.get(&key) {
                assert_eq!(prev, h, "overwrite moved the payload slot of {key}");
            }
            handles.insert(key, h);
        } else {
            let got = map.remove(&key).map(|e| e.1);
            assert_eq!(got, model.remove(&key));
            handles.remove(&key);
        }

        assert_eq!(map.len(), model.len());
        if round % 64 == 0 {
            assert!(map.validate(), "table audit failed at round {round}");
            for (k, h) in &handles {
                assert_eq!(map.get_handle(*h).map(|e| e.1), model.get(k).copied());
            }
        }
    }

    // Final sweep: iteration agrees with the model exactly.
    let mut got: Vec<Rec> = map.iter().map(|(_, r)| *r).collect();
    let mut want: Vec<Rec> = model.iter().map(|(&k, &v)| (k, v)).collect();
    got.sort_unstable();
    want.sort_unstable();
    assert_eq!(got, want);
}

/// A fixed table accepts exactly `capacity` live elements, with no
/// load-factor ceiling in the way, and frees slots for reuse on removal.
#[test]
fn fixed_table_fills_to_capacity_exactly() {
    let mut map = HandleMap::fixed(16, key_of as fn(&Rec) -> &u32, hash_of as fn(&u32) -> u64);
    for id in 0..16 {
        let (_, inserted) = map.try_insert((id, 0)).unwrap();
        assert!(inserted);
    }
    assert!(map.try_insert((16, 0)).is_err());
    assert_eq!(map.len(), 16);
    assert!(map.validate());

    assert!(map.remove(&3).is_some());
    let (_, inserted) = map.try_insert((16, 0)).unwrap();
    assert!(inserted);
    assert_eq!(map.len(), 16);
    assert!(map.validate());
}

/// The lookup/insert laws: assignment is observable through `get`, a vacant
/// `or_insert` then a fresh lookup reach the same element.
#[test]
fn entry_laws_hold() {
    let mut map = growable_map();

    map.insert_or_assign((9, 90)).unwrap();
    assert_eq!(map.get(&9), Some(&(9, 90)));

    map.entry(&21).or_insert((21, 210)).unwrap();
    let first = map.find(&21).unwrap();
    map.entry(&21).or_insert((21, 999)).unwrap();
    let again = map.find(&21).unwrap();
    assert_eq!(first, again, "or_insert re-resolved to a different element");
    assert_eq!(map.get(&21), Some(&(21, 210)));
}
