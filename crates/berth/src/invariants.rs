//! Debug assertion macros for container invariants.
//!
//! These run only in debug builds (`debug_assert!`), so release builds pay
//! nothing. They are invoked at mutation sites; `validate()` on each
//! container performs the full (and much more expensive) audit on demand.

/// Assert that an index addresses an initialized slot.
///
/// Used in: `Buf::swap` before touching either slot.
macro_rules! debug_assert_index_bounds {
    ($i:expr, $len:expr) => {
        debug_assert!(
            $i < $len,
            "index {} out of bounds for initialized length {}",
            $i,
            $len
        )
    };
}

/// Assert the local heap relation after a sift: the slot at `$child` must
/// not beat its parent.
///
/// Used in: `FlatPq` push/pop/erase/update fix-up sites.
macro_rules! debug_assert_heap_site {
    ($ok:expr, $child:expr) => {
        debug_assert!(
            $ok,
            "heap order violated: slot {} beats its parent after fix-up",
            $child
        )
    };
}

/// Assert that the live count never exceeds the usable table capacity.
///
/// Used in: `HandleMap` after claiming or releasing a slot.
macro_rules! debug_assert_live_bounded {
    ($live:expr, $usable:expr) => {
        debug_assert!(
            $live <= $usable,
            "live count {} exceeds usable capacity {}",
            $live,
            $usable
        )
    };
}

/// Assert that a metadata record owns a payload slot inside the table.
///
/// Used in: `HandleMap` insertion after the run shift frees a slot.
macro_rules! debug_assert_owned_slot {
    ($slot:expr, $total:expr) => {
        debug_assert!(
            $slot < $total,
            "metadata owns payload slot {} outside a table of {} slots",
            $slot,
            $total
        )
    };
}

/// Assert that the tree sentinel is still self-referential with parity 1.
///
/// Used in: `WavlMap` at the end of structural mutations.
macro_rules! debug_assert_sentinel {
    ($node:expr) => {
        debug_assert!(
            $node.links == [0, 0] && $node.parent == 0 && $node.parity,
            "sentinel corrupted by a structural mutation"
        )
    };
}

pub(crate) use debug_assert_heap_site;
pub(crate) use debug_assert_index_bounds;
pub(crate) use debug_assert_live_bounded;
pub(crate) use debug_assert_owned_slot;
pub(crate) use debug_assert_sentinel;
