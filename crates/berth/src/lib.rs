//! Berth - flat, allocation-flexible containers with stable handles.
//!
//! Three containers over one storage substrate:
//!
//! - [`FlatPq`]: an array-backed binary heap (min or max) with
//!   position-addressed erase/update, O(n) heapify, and in-place heapsort.
//! - [`HandleMap`]: a Robin Hood open-addressed hash map whose elements
//!   never move between payload slots - the [`Handle`] you get at insertion
//!   resolves in O(1) until removal, across any number of resizes.
//! - [`WavlMap`]: a rank-balanced (weak-AVL) ordered map with in-order
//!   iteration and half-open range queries.
//!
//! Every container runs on [`Buf`]: owned heap storage (growable or pinned)
//! or a caller-provided memory region (stack, static, or heap). Nothing in
//! the crate hashes or compares on its own - key projections, hash
//! functions, and comparators all come from the caller.
//!
//! The two keyed maps share the [`entry`] protocol: a lookup returns an
//! [`Entry`] that remembers enough to finish an insert, overwrite, or
//! removal without searching again.
//!
//! # Example
//!
//! ```
//! use berth::{FlatPq, HandleMap, HeapOrder};
//!
//! // A min-queue over plain integers.
//! let mut pq = FlatPq::new(HeapOrder::Min, |a: &u32, b: &u32| a.cmp(b));
//! pq.push(3).unwrap();
//! pq.push(1).unwrap();
//! pq.push(2).unwrap();
//! assert_eq!(pq.pop(), Some(1));
//!
//! // A handle map over (id, name) records keyed by id.
//! let mut map = HandleMap::with_capacity(
//!     8,
//!     |rec: &(u32, &str)| &rec.0,
//!     |id: &u32| u64::from(*id).wrapping_mul(0x9e37_79b9_7f4a_7c15),
//! );
//! let (handle, inserted) = map.try_insert((7, "seven")).unwrap();
//! assert!(inserted);
//! assert_eq!(map.get_handle(handle).map(|rec| rec.1), Some("seven"));
//! ```

mod buf;
pub mod entry;
mod error;
pub mod handle_map;
mod invariants;
pub mod pq;
pub mod wavl;

pub use buf::Buf;
pub use entry::Entry;
pub use error::Error;
pub use handle_map::{Handle, HandleMap};
pub use pq::{FlatPq, HeapOrder};
pub use wavl::WavlMap;
