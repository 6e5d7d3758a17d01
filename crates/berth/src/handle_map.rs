//! Robin Hood hash map with stable payload slots ("handles").
//!
//! The table is two parallel arrays of equal length: a metadata array of
//! [`Meta`] records (64-bit hash + owned payload slot index) and a payload
//! array of `Option<T>`. Metadata records migrate between positions under
//! Robin Hood displacement and backshift deletion, but **a live element's
//! payload slot is assigned exactly once, at insertion, and never changes
//! until removal, even across a resize**. The slot index is exposed as a
//! [`Handle`], which resolves in O(1) for as long as the element lives.
//!
//! Layout details:
//! - Positions 0 and 1 of both arrays are reserved; hashes reduce into
//!   `[2, total)` and the probe sequence wraps from the last slot back to 2.
//! - A hash of zero marks a vacant record (a true zero hash is remapped
//!   to 1).
//! - Every record, vacant or occupied, owns one payload slot; across the
//!   whole array those owned indices form a permutation of `0..total`, and
//!   the vacant records own exactly the free payload slots. This is what
//!   lets an insert claim a free slot in O(1) once the probe ends.
//!
//! The caller supplies the key projection and the hash function; the table
//! never hashes on its own (there is no default hasher).

use crate::buf::Buf;
use crate::entry::{self, Entry};
use crate::error::Error;
use crate::invariants::{debug_assert_live_bounded, debug_assert_owned_slot};
use crate::pq::{FlatPq, HeapOrder};
use std::marker::PhantomData;
use std::mem::MaybeUninit;

/// Reserved positions at the front of both arrays; never home slots, never
/// live.
const RESERVED: usize = 2;

/// A stable reference to a live element: its payload slot index.
///
/// Valid from the insertion that produced it until the element is removed.
/// Resolving a handle after removal yields `None` (or, if the slot has been
/// reused by a later insertion, that later element).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Handle(usize);

impl Handle {
    /// The raw payload slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One metadata record: the element hash (0 = vacant) and the payload slot
/// this record owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Meta {
    hash: u64,
    slot: usize,
}

impl Meta {
    #[inline]
    fn vacant(slot: usize) -> Self {
        Self { hash: 0, slot }
    }

    #[inline]
    fn occupied(self) -> bool {
        self.hash != 0
    }
}

// ---------------------------------------------------------------------
// TABLE GEOMETRY
// ---------------------------------------------------------------------
//
// Free functions over (index, total) so that the resize rebuild, which works
// on a table that is not yet `self`, shares them with the instance methods.

/// Fast range reduction of a hash into the home span `[RESERVED, total)`:
/// 128-bit widening multiply, then take the high 64 bits.
#[inline]
fn bucket_of(hash: u64, total: usize) -> usize {
    let usable = (total - RESERVED) as u128;
    RESERVED + ((u128::from(hash) * usable) >> 64) as usize
}

#[inline]
fn next_slot(i: usize, total: usize) -> usize {
    if i + 1 == total {
        RESERVED
    } else {
        i + 1
    }
}

#[inline]
fn prev_slot(i: usize, total: usize) -> usize {
    if i == RESERVED {
        total - 1
    } else {
        i - 1
    }
}

/// Probe distance from `home` to `at`, both in `[RESERVED, total)`.
#[inline]
fn distance(home: usize, at: usize, total: usize) -> usize {
    let usable = total - RESERVED;
    (at + usable - home) % usable
}

/// First position at which an incoming record with `hash` may rest: the
/// first vacant record, or the first occupant displaced less far than the
/// incoming record would be.
fn find_victim(meta: &[Meta], total: usize, hash: u64) -> usize {
    let home = bucket_of(hash, total);
    let mut at = home;
    let mut dist = 0;
    loop {
        let m = meta[at];
        if !m.occupied() || distance(bucket_of(m.hash, total), at, total) < dist {
            return at;
        }
        at = next_slot(at, total);
        dist += 1;
    }
}

/// Opens the position `victim` by shifting the occupied run starting there
/// one step away from home, absorbing the run's terminal vacant record.
/// Returns the payload slot that record owned: the free slot the caller's
/// new record takes over. The caller must overwrite `meta[victim]`.
fn slide_open(meta: &mut [Meta], total: usize, victim: usize) -> usize {
    let mut end = victim;
    while meta[end].occupied() {
        end = next_slot(end, total);
    }
    let freed = meta[end].slot;
    let mut at = end;
    while at != victim {
        let before = prev_slot(at, total);
        meta[at] = meta[before];
        at = before;
    }
    freed
}

/// Growth capacities: a doubling run of primes from 11 up to the largest
/// 64-bit prime, so the modulo fallback of the home reduction stays
/// well-distributed at every size.
const GROWTH_PRIMES: &[u64] = &[
    11,
    23,
    47,
    97,
    199,
    409,
    823,
    1_741,
    3_469,
    6_949,
    14_033,
    28_411,
    57_557,
    116_731,
    236_897,
    480_881,
    976_369,
    1_982_627,
    4_026_031,
    8_175_383,
    16_601_593,
    33_712_729,
    68_460_391,
    139_022_417,
    282_312_799,
    573_292_817,
    1_164_186_217,
    2_364_114_217,
    4_294_967_291,
    8_589_934_583,
    17_179_869_143,
    34_359_738_337,
    68_719_476_731,
    137_438_953_447,
    274_877_906_899,
    549_755_813_881,
    1_099_511_627_689,
    2_199_023_255_531,
    4_398_046_511_093,
    8_796_093_022_151,
    17_592_186_044_399,
    35_184_372_088_777,
    70_368_744_177_643,
    140_737_488_355_213,
    281_474_976_710_597,
    562_949_953_421_231,
    1_125_899_906_842_597,
    4_503_599_627_370_449,
    18_014_398_509_481_951,
    72_057_594_037_927_931,
    288_230_376_151_711_717,
    1_152_921_504_606_846_883,
    4_611_686_018_427_387_847,
    18_446_744_073_709_551_557,
];

fn next_prime_at_least(n: usize) -> Option<usize> {
    GROWTH_PRIMES
        .iter()
        .find(|&&p| p >= n as u64)
        .map(|&p| p as usize)
}

enum Probe {
    Occupied { meta_i: usize },
    Vacant { victim: Option<usize>, hash: u64 },
}

/// Robin Hood open-addressed map whose elements never move between payload
/// slots.
///
/// `key_of` projects the key out of an element; `hash_of` hashes a key to a
/// 64-bit value. Both are fixed at construction.
pub struct HandleMap<'a, T, K, F, H> {
    meta: Buf<'a, Meta>,
    slots: Buf<'a, Option<T>>,
    live: usize,
    growable: bool,
    key_of: F,
    hash_of: H,
    marker: PhantomData<K>,
}

impl<'a, T, K, F, H> HandleMap<'a, T, K, F, H>
where
    K: Eq,
    F: Fn(&T) -> &K,
    H: Fn(&K) -> u64,
{
    /// Creates a growable map with room for `capacity` live elements before
    /// the first resize. `capacity` 0 is permitted; the first insert then
    /// grows to the smallest table size.
    pub fn with_capacity(capacity: usize, key_of: F, hash_of: H) -> Self {
        Self::build(
            Buf::heap(capacity + RESERVED),
            Buf::heap(capacity + RESERVED),
            true,
            key_of,
            hash_of,
        )
    }

    /// Creates a map pinned at `capacity` live elements. It never resizes;
    /// inserting into a full table reports [`Error::CapacityExhausted`].
    pub fn fixed(capacity: usize, key_of: F, hash_of: H) -> Self {
        Self::build(
            Buf::heap_fixed(capacity + RESERVED),
            Buf::heap_fixed(capacity + RESERVED),
            false,
            key_of,
            hash_of,
        )
    }

    /// Creates a map over caller-provided regions. Both regions must have
    /// the same length; that length is the total slot count, of which 2 are
    /// reserved (so a region of length `n` holds `n - 2` live elements).
    /// The map never resizes.
    ///
    /// # Panics
    ///
    /// Panics if the regions differ in length.
    pub fn in_slices(
        meta: &'a mut [MaybeUninit<Meta>],
        slots: &'a mut [MaybeUninit<Option<T>>],
        key_of: F,
        hash_of: H,
    ) -> Self {
        assert_eq!(
            meta.len(),
            slots.len(),
            "metadata and payload regions must have the same length"
        );
        Self::build(
            Buf::in_slice(meta),
            Buf::in_slice(slots),
            false,
            key_of,
            hash_of,
        )
    }

    fn build(
        mut meta: Buf<'a, Meta>,
        mut slots: Buf<'a, Option<T>>,
        growable: bool,
        key_of: F,
        hash_of: H,
    ) -> Self {
        // Identity ownership to start with: record i owns payload slot i.
        let mut i = 0;
        meta.fill_with(|| {
            let m = Meta::vacant(i);
            i += 1;
            m
        });
        slots.fill_with(|| None);
        Self {
            meta,
            slots,
            live: 0,
            growable,
            key_of,
            hash_of,
            marker: PhantomData,
        }
    }

    // ---------------------------------------------------------------------
    // STATUS
    // ---------------------------------------------------------------------

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if no element is live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of live elements the current table can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.total().saturating_sub(RESERVED)
    }

    #[inline]
    fn total(&self) -> usize {
        self.meta.len()
    }

    #[inline]
    fn adjusted_hash(&self, key: &K) -> u64 {
        match (self.hash_of)(key) {
            0 => 1,
            h => h,
        }
    }

    // ---------------------------------------------------------------------
    // LOOKUP
    // ---------------------------------------------------------------------

    fn probe(&self, key: &K) -> Probe {
        let total = self.total();
        let hash = self.adjusted_hash(key);
        if total <= RESERVED {
            return Probe::Vacant { victim: None, hash };
        }
        let usable = total - RESERVED;
        let home = bucket_of(hash, total);
        let meta = self.meta.as_slice();
        let mut at = home;
        for dist in 0..usable {
            let m = meta[at];
            if !m.occupied() {
                return Probe::Vacant {
                    victim: Some(at),
                    hash,
                };
            }
            if m.hash == hash {
                let elem = self.slots.as_slice()[m.slot]
                    .as_ref()
                    .expect("occupied metadata references a live payload slot");
                if (self.key_of)(elem) == key {
                    return Probe::Occupied { meta_i: at };
                }
            }
            if distance(bucket_of(m.hash, total), at, total) < dist {
                // The occupant sits closer to home than we are; under Robin
                // Hood monotonicity the key cannot appear further on.
                return Probe::Vacant {
                    victim: Some(at),
                    hash,
                };
            }
            at = next_slot(at, total);
        }
        // Every position probed: the table is full and the key absent.
        Probe::Vacant { victim: None, hash }
    }

    /// Borrows the element stored under `key`.
    pub fn get(&self, key: &K) -> Option<&T> {
        match self.probe(key) {
            Probe::Occupied { meta_i } => {
                self.slots.as_slice()[self.meta.as_slice()[meta_i].slot].as_ref()
            }
            Probe::Vacant { .. } => None,
        }
    }

    /// Mutably borrows the element stored under `key`.
    ///
    /// Mutating the key through this reference corrupts the table; use
    /// [`validate`](HandleMap::validate) to diagnose that after the fact.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut T> {
        match self.probe(key) {
            Probe::Occupied { meta_i } => {
                let slot = self.meta.as_slice()[meta_i].slot;
                self.slots.as_mut_slice()[slot].as_mut()
            }
            Probe::Vacant { .. } => None,
        }
    }

    /// Returns true if `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        matches!(self.probe(key), Probe::Occupied { .. })
    }

    /// The handle of the element stored under `key`, if any.
    pub fn find(&self, key: &K) -> Option<Handle> {
        match self.probe(key) {
            Probe::Occupied { meta_i } => Some(Handle(self.meta.as_slice()[meta_i].slot)),
            Probe::Vacant { .. } => None,
        }
    }

    /// Resolves a handle to its element in O(1).
    #[inline]
    pub fn get_handle(&self, handle: Handle) -> Option<&T> {
        self.slots.as_slice().get(handle.0).and_then(Option::as_ref)
    }

    /// Resolves a handle to its element mutably in O(1).
    #[inline]
    pub fn get_handle_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .as_mut_slice()
            .get_mut(handle.0)
            .and_then(Option::as_mut)
    }

    // ---------------------------------------------------------------------
    // ENTRY & INSERTION
    // ---------------------------------------------------------------------

    /// Looks up `key` and returns an entry that can finish an insert,
    /// overwrite, or removal without searching again.
    ///
    /// When the map is growable and a follow-up insert would push the load
    /// factor past 80%, the resize happens here, eagerly, so the vacant
    /// entry's claimed position stays valid. A failed resize is remembered
    /// in the entry and surfaces from the inserting follow-up.
    pub fn entry(&mut self, key: &K) -> MapEntry<'_, 'a, T, K, F, H> {
        let grow_err = self.grow_if_needed().err();
        match self.probe(key) {
            Probe::Occupied { meta_i } => Entry::Occupied(OccupiedEntry { map: self, meta_i }),
            Probe::Vacant { victim, hash } => Entry::Vacant(VacantEntry {
                map: self,
                victim,
                hash,
                grow_err,
            }),
        }
    }

    /// Inserts `elem` unless its key is already present. Returns the handle
    /// of the live element and whether this call inserted it.
    pub fn try_insert(&mut self, elem: T) -> Result<(Handle, bool), Error> {
        self.grow_if_needed()?;
        let key = (self.key_of)(&elem);
        match self.probe(key) {
            Probe::Occupied { meta_i } => Ok((Handle(self.meta.as_slice()[meta_i].slot), false)),
            Probe::Vacant {
                victim: Some(victim),
                hash,
            } => Ok((self.emplace(victim, hash, elem)?, true)),
            Probe::Vacant { victim: None, .. } => Err(Error::CapacityExhausted {
                capacity: self.capacity(),
            }),
        }
    }

    /// Inserts `elem`, overwriting any element with the same key in place.
    /// Returns the handle (unchanged by an overwrite) and the previous
    /// element, if any.
    pub fn insert_or_assign(&mut self, elem: T) -> Result<(Handle, Option<T>), Error> {
        self.grow_if_needed()?;
        let key = (self.key_of)(&elem);
        match self.probe(key) {
            Probe::Occupied { meta_i } => {
                let slot = self.meta.as_slice()[meta_i].slot;
                let old = self.slots.as_mut_slice()[slot].replace(elem);
                Ok((Handle(slot), old))
            }
            Probe::Vacant {
                victim: Some(victim),
                hash,
            } => Ok((self.emplace(victim, hash, elem)?, None)),
            Probe::Vacant { victim: None, .. } => Err(Error::CapacityExhausted {
                capacity: self.capacity(),
            }),
        }
    }

    /// Removes the element stored under `key` by backshift deletion.
    pub fn remove(&mut self, key: &K) -> Option<T> {
        match self.probe(key) {
            Probe::Occupied { meta_i } => Some(self.remove_at(meta_i)),
            Probe::Vacant { .. } => None,
        }
    }

    /// Robin Hood insertion at a claimed victim position. The metadata run
    /// starting at the victim shifts one step away from home; the payload
    /// goes into the slot the run's terminal vacant record owned, and that
    /// slot never changes for this element again.
    fn emplace(&mut self, victim: usize, hash: u64, elem: T) -> Result<Handle, Error> {
        if self.live >= self.capacity() {
            return Err(Error::CapacityExhausted {
                capacity: self.capacity(),
            });
        }
        let total = self.total();
        let freed = slide_open(self.meta.as_mut_slice(), total, victim);
        debug_assert_owned_slot!(freed, total);
        self.meta.as_mut_slice()[victim] = Meta { hash, slot: freed };
        self.slots.as_mut_slice()[freed] = Some(elem);
        self.live += 1;
        debug_assert_live_bounded!(self.live, self.capacity());
        Ok(Handle(freed))
    }

    /// Backshift deletion: vacate the record (it takes ownership of the
    /// freed payload slot), then pull every displaced successor one step
    /// back toward its home.
    fn remove_at(&mut self, meta_i: usize) -> T {
        let total = self.total();
        let freed = self.meta.as_slice()[meta_i].slot;
        self.meta.as_mut_slice()[meta_i] = Meta::vacant(freed);
        let mut hole = meta_i;
        loop {
            let nxt = next_slot(hole, total);
            let m = self.meta.as_slice()[nxt];
            if !m.occupied() || distance(bucket_of(m.hash, total), nxt, total) == 0 {
                break;
            }
            self.meta.as_mut_slice().swap(hole, nxt);
            hole = nxt;
        }
        self.live -= 1;
        self.slots.as_mut_slice()[freed]
            .take()
            .expect("occupied metadata references a live payload slot")
    }

    // ---------------------------------------------------------------------
    // RESIZE
    // ---------------------------------------------------------------------

    fn grow_if_needed(&mut self) -> Result<(), Error> {
        if !self.growable {
            // Fixed tables fill to the brim; only genuine fullness stops an
            // insert, and that is reported at the insertion site.
            return Ok(());
        }
        if (self.live + 1) * 5 > self.capacity() * 4 {
            self.grow()
        } else {
            Ok(())
        }
    }

    /// Rebuilds at the next prime capacity at least twice the live count.
    /// Payload slots keep their indices, so every outstanding [`Handle`]
    /// survives.
    fn grow(&mut self) -> Result<(), Error> {
        let want = (self.live + 1).saturating_mul(2).max(self.capacity() + 1);
        let new_usable = next_prime_at_least(want).ok_or(Error::CapacityExhausted {
            capacity: self.capacity(),
        })?;
        let total = new_usable + RESERVED;

        // Both allocations happen before anything moves, so a denied request
        // leaves the table exactly as it was.
        let mut slots = Buf::try_heap(total)?;
        let mut meta = Buf::try_heap(total)?;
        slots.fill_with(|| None);
        meta.fill_with(|| Meta::vacant(0));

        // Payload: index-preserving move into the larger array.
        for (i, s) in self.slots.as_mut_slice().iter_mut().enumerate() {
            if s.is_some() {
                slots.as_mut_slice()[i] = s.take();
            }
        }

        // Metadata: re-place every occupied record by pure displacement.
        // Hashes are already stored, so no user callback runs here, and the
        // records keep their slot fields.
        for m in self.meta.as_slice().iter().filter(|m| m.occupied()) {
            let victim = find_victim(meta.as_slice(), total, m.hash);
            let _ = slide_open(meta.as_mut_slice(), total, victim);
            meta.as_mut_slice()[victim] = *m;
        }

        // The vacant records still own the placeholder slot 0. Hand them the
        // actually-free payload indices in ascending order: heapify the live
        // indices, then walk the candidates, popping matches.
        let taken: Vec<usize> = meta
            .as_slice()
            .iter()
            .filter(|m| m.occupied())
            .map(|m| m.slot)
            .collect();
        let mut taken = FlatPq::from_buf(
            Buf::from_vec(taken),
            HeapOrder::Min,
            |a: &usize, b: &usize| a.cmp(b),
        );
        let mut candidate = 0;
        for i in 0..total {
            if meta.as_slice()[i].occupied() {
                continue;
            }
            while taken.peek() == Some(&candidate) {
                taken.pop();
                candidate += 1;
            }
            meta.as_mut_slice()[i] = Meta::vacant(candidate);
            candidate += 1;
        }

        self.meta = meta;
        self.slots = slots;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // BULK OPERATIONS
    // ---------------------------------------------------------------------

    /// Iterates over `(handle, element)` pairs. The order is unspecified and
    /// changes under mutation.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.slots.as_slice().iter().enumerate(),
        }
    }

    /// Drops every element and resets the table to identity ownership.
    pub fn clear(&mut self) {
        for s in self.slots.as_mut_slice() {
            *s = None;
        }
        for (i, m) in self.meta.as_mut_slice().iter_mut().enumerate() {
            *m = Meta::vacant(i);
        }
        self.live = 0;
    }

    /// Full table audit, O(capacity):
    /// - owned payload slots form a permutation of the table positions;
    /// - vacant records own exactly the free payload slots;
    /// - stored hashes match the stored keys;
    /// - displacement grows by at most one step through every occupied run;
    /// - the live count is consistent.
    pub fn validate(&self) -> bool {
        let total = self.total();
        let meta = self.meta.as_slice();
        let slots = self.slots.as_slice();

        let mut seen = vec![false; total];
        for m in meta {
            if m.slot >= total || seen[m.slot] {
                return false;
            }
            seen[m.slot] = true;
        }

        let mut live = 0;
        for (i, m) in meta.iter().enumerate() {
            if i < RESERVED {
                if m.occupied() {
                    return false;
                }
                continue;
            }
            if !m.occupied() {
                if slots[m.slot].is_some() {
                    return false;
                }
                continue;
            }
            live += 1;
            let Some(elem) = slots[m.slot].as_ref() else {
                return false;
            };
            if self.adjusted_hash((self.key_of)(elem)) != m.hash {
                return false;
            }
            let dist = distance(bucket_of(m.hash, total), i, total);
            if dist > 0 {
                let before = prev_slot(i, total);
                let pm = meta[before];
                if !pm.occupied() {
                    return false;
                }
                if dist > distance(bucket_of(pm.hash, total), before, total) + 1 {
                    return false;
                }
            }
        }
        live == self.live
    }
}

/// Iterator over `(handle, element)` pairs in payload-slot order.
pub struct Iter<'s, T> {
    inner: std::iter::Enumerate<std::slice::Iter<'s, Option<T>>>,
}

impl<'s, T> Iterator for Iter<'s, T> {
    type Item = (Handle, &'s T);

    fn next(&mut self) -> Option<Self::Item> {
        for (i, slot) in self.inner.by_ref() {
            if let Some(elem) = slot.as_ref() {
                return Some((Handle(i), elem));
            }
        }
        None
    }
}

/// Entry into a [`HandleMap`] lookup.
pub type MapEntry<'m, 'a, T, K, F, H> =
    Entry<OccupiedEntry<'m, 'a, T, K, F, H>, VacantEntry<'m, 'a, T, K, F, H>>;

/// A present element, addressed by its current metadata position.
pub struct OccupiedEntry<'m, 'a, T, K, F, H> {
    map: &'m mut HandleMap<'a, T, K, F, H>,
    meta_i: usize,
}

impl<'m, 'a, T, K, F, H> OccupiedEntry<'m, 'a, T, K, F, H>
where
    K: Eq,
    F: Fn(&T) -> &K,
    H: Fn(&K) -> u64,
{
    /// The element's stable handle.
    pub fn handle(&self) -> Handle {
        Handle(self.map.meta.as_slice()[self.meta_i].slot)
    }

    fn slot(&self) -> usize {
        self.map.meta.as_slice()[self.meta_i].slot
    }
}

impl<'m, 'a, T, K, F, H> entry::Occupied<'m> for OccupiedEntry<'m, 'a, T, K, F, H>
where
    K: Eq,
    F: Fn(&T) -> &K,
    H: Fn(&K) -> u64,
{
    type Elem = T;

    fn get(&self) -> &T {
        self.map.slots.as_slice()[self.slot()]
            .as_ref()
            .expect("occupied metadata references a live payload slot")
    }

    fn get_mut(&mut self) -> &mut T {
        let slot = self.slot();
        self.map.slots.as_mut_slice()[slot]
            .as_mut()
            .expect("occupied metadata references a live payload slot")
    }

    fn into_mut(self) -> &'m mut T {
        let slot = self.slot();
        self.map.slots.as_mut_slice()[slot]
            .as_mut()
            .expect("occupied metadata references a live payload slot")
    }

    fn remove(self) -> T {
        self.map.remove_at(self.meta_i)
    }
}

/// A remembered insertion point: the claimed probe position and adjusted
/// hash, or the reason no insert can happen.
pub struct VacantEntry<'m, 'a, T, K, F, H> {
    map: &'m mut HandleMap<'a, T, K, F, H>,
    victim: Option<usize>,
    hash: u64,
    grow_err: Option<Error>,
}

impl<'m, 'a, T, K, F, H> VacantEntry<'m, 'a, T, K, F, H>
where
    K: Eq,
    F: Fn(&T) -> &K,
    H: Fn(&K) -> u64,
{
    /// Inserts and returns the new element's handle along with the element.
    pub fn insert_with_handle(self, elem: T) -> Result<(Handle, &'m mut T), Error> {
        if let Some(err) = self.grow_err {
            return Err(err);
        }
        let Some(victim) = self.victim else {
            return Err(Error::CapacityExhausted {
                capacity: self.map.capacity(),
            });
        };
        let handle = self.map.emplace(victim, self.hash, elem)?;
        let elem = self.map.slots.as_mut_slice()[handle.0]
            .as_mut()
            .expect("freshly inserted payload slot is live");
        Ok((handle, elem))
    }
}

impl<'m, 'a, T, K, F, H> entry::Vacant<'m> for VacantEntry<'m, 'a, T, K, F, H>
where
    K: Eq,
    F: Fn(&T) -> &K,
    H: Fn(&K) -> u64,
{
    type Elem = T;

    fn insert(self, elem: T) -> Result<&'m mut T, Error> {
        self.insert_with_handle(elem).map(|(_, elem)| elem)
    }
}
