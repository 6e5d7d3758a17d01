//! Rank-balanced ordered map: a WAVL tree over an index arena.
//!
//! Nodes live in a [`Buf`] arena addressed by `usize` links; slot 0 is the
//! sentinel, whose branches and parent point at itself. The sentinel stands
//! in for every missing child, and its rank is -1. Ranks are stored only as
//! a **parity bit** (rank mod 2). Parity is all the weak-AVL rules
//! need: a child whose parity equals its parent's differs in rank by an even
//! amount (2 in a valid tree), a differing parity means an odd difference
//! (1), and the fix-up loops know contextually which node might be the
//! out-of-range 0- or 3-child. The sentinel's parity of 1 makes the leaf
//! cases fall out of the same comparisons.
//!
//! Balance guarantees: every parent–child rank difference is 1 or 2, no
//! 0-children, at most two rotations per insertion or deletion, O(log n)
//! parity flips otherwise.
//!
//! Keys are projected out of the element by a caller-supplied function and
//! ordered by their `Ord` instance; the tree never compares elements itself.

use crate::buf::Buf;
use crate::entry::{self, Entry};
use crate::error::Error;
use crate::invariants::debug_assert_sentinel;
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::mem::MaybeUninit;

/// The sentinel index. Also the "no node" value for links, parents, and the
/// free-list terminator.
const NIL: usize = 0;

/// Arena node: two child links (0 = left, 1 = right), a parent link, the
/// rank parity bit, and the element (`None` for the sentinel and for freed
/// nodes on the free list).
pub struct Node<T> {
    links: [usize; 2],
    parent: usize,
    parity: bool,
    elem: Option<T>,
}

impl<T> Node<T> {
    fn sentinel() -> Self {
        Self {
            links: [NIL, NIL],
            parent: NIL,
            parity: true,
            elem: None,
        }
    }

    fn leaf(parent: usize, elem: T) -> Self {
        Self {
            links: [NIL, NIL],
            parent,
            parity: false,
            elem: Some(elem),
        }
    }
}

/// Ordered map keyed by a projection of the element.
pub struct WavlMap<'a, T, K, F> {
    nodes: Buf<'a, Node<T>>,
    root: usize,
    free: usize,
    len: usize,
    key_of: F,
    marker: PhantomData<K>,
}

impl<'a, T, K, F> WavlMap<'a, T, K, F>
where
    K: Ord,
    F: Fn(&T) -> &K,
{
    /// Creates an empty map with growable heap storage.
    pub fn new(key_of: F) -> Self {
        Self::with_capacity(0, key_of)
    }

    /// Creates an empty map with growable heap storage and room for
    /// `capacity` elements.
    pub fn with_capacity(capacity: usize, key_of: F) -> Self {
        let mut arena = Vec::with_capacity(capacity + 1);
        arena.push(Node::sentinel());
        Self {
            nodes: Buf::from_vec(arena),
            root: NIL,
            free: NIL,
            len: 0,
            key_of,
            marker: PhantomData,
        }
    }

    /// Creates an empty map in a caller-provided region. One slot is taken
    /// by the sentinel, so a region of length `n` holds `n - 1` elements;
    /// the map never grows.
    ///
    /// # Panics
    ///
    /// Panics if the region is empty.
    pub fn in_slice(region: &'a mut [MaybeUninit<Node<T>>], key_of: F) -> Self {
        assert!(
            !region.is_empty(),
            "arena region needs at least one slot for the sentinel"
        );
        let mut nodes = Buf::in_slice(region);
        nodes
            .push(Node::sentinel())
            .expect("a non-empty region holds the sentinel");
        Self {
            nodes,
            root: NIL,
            free: NIL,
            len: 0,
            key_of,
            marker: PhantomData,
        }
    }

    // ---------------------------------------------------------------------
    // STATUS
    // ---------------------------------------------------------------------

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the map holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // ---------------------------------------------------------------------
    // NODE PRIMITIVES
    // ---------------------------------------------------------------------

    #[inline]
    fn node(&self, i: usize) -> &Node<T> {
        &self.nodes.as_slice()[i]
    }

    #[inline]
    fn node_mut(&mut self, i: usize) -> &mut Node<T> {
        &mut self.nodes.as_mut_slice()[i]
    }

    #[inline]
    fn key(&self, i: usize) -> &K {
        (self.key_of)(
            self.node(i)
                .elem
                .as_ref()
                .expect("tree nodes hold an element"),
        )
    }

    #[inline]
    fn parity(&self, i: usize) -> bool {
        self.node(i).parity
    }

    /// Promote or demote by one rank: either way the parity flips.
    #[inline]
    fn flip(&mut self, i: usize) {
        let p = &mut self.node_mut(i).parity;
        *p = !*p;
    }

    /// Which side of `parent` the child `i` hangs on.
    #[inline]
    fn dir_of(&self, i: usize, parent: usize) -> usize {
        usize::from(self.node(parent).links[1] == i)
    }

    fn alloc_node(&mut self, parent: usize, elem: T) -> Result<usize, Error> {
        if self.free != NIL {
            let i = self.free;
            self.free = self.node(i).links[0];
            *self.node_mut(i) = Node::leaf(parent, elem);
            Ok(i)
        } else {
            self.nodes.push(Node::leaf(parent, elem))
        }
    }

    fn free_node(&mut self, i: usize) {
        let head = self.free;
        let n = self.node_mut(i);
        n.elem = None;
        n.parent = NIL;
        n.links = [head, NIL];
        self.free = i;
    }

    /// Rotation at `z` toward direction `d`: `z`'s child on the other side
    /// rises into `z`'s place and `z` becomes its `d`-child.
    fn rotate(&mut self, z: usize, d: usize) {
        let y = self.node(z).links[1 - d];
        let mid = self.node(y).links[d];
        let zp = self.node(z).parent;
        let zdir = if zp == NIL { 0 } else { self.dir_of(z, zp) };

        self.node_mut(z).links[1 - d] = mid;
        if mid != NIL {
            self.node_mut(mid).parent = z;
        }
        self.node_mut(y).links[d] = z;
        self.node_mut(z).parent = y;
        self.node_mut(y).parent = zp;
        if zp == NIL {
            self.root = y;
        } else {
            self.node_mut(zp).links[zdir] = y;
        }
    }

    // ---------------------------------------------------------------------
    // SEARCH
    // ---------------------------------------------------------------------

    /// BST descent. `Ok(node)` on a key match, otherwise the would-be
    /// parent and the direction the key would attach under.
    fn locate(&self, key: &K) -> Result<usize, (usize, usize)> {
        let mut parent = NIL;
        let mut dir = 0;
        let mut cur = self.root;
        while cur != NIL {
            match key.cmp(self.key(cur)) {
                Ordering::Equal => return Ok(cur),
                Ordering::Less => {
                    parent = cur;
                    dir = 0;
                    cur = self.node(cur).links[0];
                }
                Ordering::Greater => {
                    parent = cur;
                    dir = 1;
                    cur = self.node(cur).links[1];
                }
            }
        }
        Err((parent, dir))
    }

    /// Borrows the element stored under `key`.
    pub fn get(&self, key: &K) -> Option<&T> {
        self.locate(key)
            .ok()
            .and_then(|n| self.node(n).elem.as_ref())
    }

    /// Mutably borrows the element stored under `key`.
    ///
    /// Mutating the key through this reference corrupts the tree; use
    /// [`validate`](WavlMap::validate) to diagnose that after the fact.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut T> {
        match self.locate(key) {
            Ok(n) => self.node_mut(n).elem.as_mut(),
            Err(_) => None,
        }
    }

    /// Returns true if `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.locate(key).is_ok()
    }

    /// The element with the least key.
    pub fn first(&self) -> Option<&T> {
        if self.root == NIL {
            return None;
        }
        self.node(self.min_of(self.root)).elem.as_ref()
    }

    /// The element with the greatest key.
    pub fn last(&self) -> Option<&T> {
        if self.root == NIL {
            return None;
        }
        self.node(self.max_of(self.root)).elem.as_ref()
    }

    fn min_of(&self, mut i: usize) -> usize {
        while self.node(i).links[0] != NIL {
            i = self.node(i).links[0];
        }
        i
    }

    fn max_of(&self, mut i: usize) -> usize {
        while self.node(i).links[1] != NIL {
            i = self.node(i).links[1];
        }
        i
    }

    fn successor(&self, i: usize) -> usize {
        if self.node(i).links[1] != NIL {
            return self.min_of(self.node(i).links[1]);
        }
        let mut cur = i;
        let mut up = self.node(i).parent;
        while up != NIL && self.dir_of(cur, up) == 1 {
            cur = up;
            up = self.node(up).parent;
        }
        up
    }

    fn predecessor(&self, i: usize) -> usize {
        if self.node(i).links[0] != NIL {
            return self.max_of(self.node(i).links[0]);
        }
        let mut cur = i;
        let mut up = self.node(i).parent;
        while up != NIL && self.dir_of(cur, up) == 0 {
            cur = up;
            up = self.node(up).parent;
        }
        up
    }

    /// First node whose key is not less than `key` (NIL if none).
    fn lower_bound(&self, key: &K) -> usize {
        let mut best = NIL;
        let mut cur = self.root;
        while cur != NIL {
            if self.key(cur) < key {
                cur = self.node(cur).links[1];
            } else {
                best = cur;
                cur = self.node(cur).links[0];
            }
        }
        best
    }

    /// Last node whose key is not greater than `key` (NIL if none).
    fn floor(&self, key: &K) -> usize {
        let mut best = NIL;
        let mut cur = self.root;
        while cur != NIL {
            if self.key(cur) > key {
                cur = self.node(cur).links[0];
            } else {
                best = cur;
                cur = self.node(cur).links[1];
            }
        }
        best
    }

    // ---------------------------------------------------------------------
    // ENTRY & INSERTION
    // ---------------------------------------------------------------------

    /// Looks up `key` and returns an entry that can finish an insert,
    /// overwrite, or removal without descending again.
    pub fn entry(&mut self, key: &K) -> TreeEntry<'_, 'a, T, K, F> {
        match self.locate(key) {
            Ok(node) => Entry::Occupied(OccupiedEntry { map: self, node }),
            Err((parent, dir)) => Entry::Vacant(VacantEntry {
                map: self,
                parent,
                dir,
            }),
        }
    }

    /// Inserts `elem` unless its key is already present. Returns whether
    /// this call inserted it.
    pub fn try_insert(&mut self, elem: T) -> Result<bool, Error> {
        let key = (self.key_of)(&elem);
        match self.locate(key) {
            Ok(_) => Ok(false),
            Err((parent, dir)) => {
                self.attach(parent, dir, elem)?;
                Ok(true)
            }
        }
    }

    /// Inserts `elem`, overwriting any element with the same key. Returns
    /// the previous element, if any.
    pub fn insert_or_assign(&mut self, elem: T) -> Result<Option<T>, Error> {
        let key = (self.key_of)(&elem);
        match self.locate(key) {
            Ok(n) => Ok(self.node_mut(n).elem.replace(elem)),
            Err((parent, dir)) => {
                self.attach(parent, dir, elem)?;
                Ok(None)
            }
        }
    }

    /// Attaches a fresh rank-0 leaf under the recorded parent/direction and
    /// restores the rank rules.
    fn attach(&mut self, parent: usize, dir: usize, elem: T) -> Result<usize, Error> {
        let n = self.alloc_node(parent, elem)?;
        if parent == NIL {
            self.root = n;
        } else {
            self.node_mut(parent).links[dir] = n;
        }
        self.len += 1;
        self.fix_insert(n);
        debug_assert_sentinel!(self.node(NIL));
        Ok(n)
    }

    /// Insert fix-up. `x` starts as the fresh leaf; equal parity with the
    /// parent marks it as the 0-child the loop is chasing.
    fn fix_insert(&mut self, mut x: usize) {
        loop {
            let p = self.node(x).parent;
            if p == NIL || self.parity(x) != self.parity(p) {
                return; // x is the root or a 1-child
            }
            let d = self.dir_of(x, p);
            let sibling = self.node(p).links[1 - d];
            if self.parity(sibling) != self.parity(p) {
                // (0,1) parent: promote and keep climbing.
                self.flip(p);
                x = p;
                continue;
            }
            // (0,2) parent: one or two rotations finish the repair.
            let inner = self.node(x).links[1 - d];
            if self.parity(inner) == self.parity(x) {
                // Inner child is a 2-child: single rotation, x rises.
                self.rotate(p, 1 - d);
                self.flip(p); // demote the old parent
            } else {
                // Inner child is a 1-child: it rises above both.
                self.rotate(x, d);
                self.rotate(p, 1 - d);
                self.flip(inner); // promote the pivot
                self.flip(x); // demote the riser
                self.flip(p); // demote the old parent
            }
            return;
        }
    }

    // ---------------------------------------------------------------------
    // DELETION
    // ---------------------------------------------------------------------

    /// Removes the element stored under `key`.
    pub fn remove(&mut self, key: &K) -> Option<T> {
        match self.locate(key) {
            Ok(n) => Some(self.remove_node(n)),
            Err(_) => None,
        }
    }

    /// Removes and returns the element with the least key.
    pub fn pop_first(&mut self) -> Option<T> {
        if self.root == NIL {
            return None;
        }
        let n = self.min_of(self.root);
        Some(self.remove_node(n))
    }

    /// Removes and returns the element with the greatest key.
    pub fn pop_last(&mut self) -> Option<T> {
        if self.root == NIL {
            return None;
        }
        let n = self.max_of(self.root);
        Some(self.remove_node(n))
    }

    fn remove_node(&mut self, n: usize) -> T {
        // Binary node: the in-order successor's element moves down into n
        // and the successor (which has at most a right child) is spliced.
        let (splice_at, out) = if self.node(n).links[0] != NIL && self.node(n).links[1] != NIL {
            let succ = self.min_of(self.node(n).links[1]);
            let successor_elem = self.node_mut(succ).elem.take();
            let out = std::mem::replace(&mut self.node_mut(n).elem, successor_elem);
            (succ, out)
        } else {
            (n, self.node_mut(n).elem.take())
        };
        self.splice(splice_at);
        self.len -= 1;
        debug_assert_sentinel!(self.node(NIL));
        out.expect("removed node held an element")
    }

    /// Unlinks a node with at most one real child and repairs ranks.
    fn splice(&mut self, r: usize) {
        let left = self.node(r).links[0];
        let child = if left != NIL { left } else { self.node(r).links[1] };
        let p = self.node(r).parent;

        if p == NIL {
            self.root = child;
            if child != NIL {
                self.node_mut(child).parent = NIL;
            }
            self.free_node(r);
            return;
        }

        // Whether the replacement arrives as a 3-child: the removed node's
        // rank difference grows by one in the replacement.
        let was_two = self.parity(r) == self.parity(p);
        let d = self.dir_of(r, p);
        self.node_mut(p).links[d] = child;
        if child != NIL {
            self.node_mut(child).parent = p;
        }
        self.free_node(r);

        if self.node(p).links[0] == NIL && self.node(p).links[1] == NIL && self.parity(p) {
            // p lost its only child and sits at rank 1: a leaf must be rank
            // 0, so demote, which may leave p itself as a 3-child.
            let pp = self.node(p).parent;
            let p_was_two = pp != NIL && self.parity(p) == self.parity(pp);
            self.flip(p);
            if p_was_two {
                let pd = self.dir_of(p, pp);
                self.fix_delete(pp, pd);
            }
            return;
        }

        if was_two {
            self.fix_delete(p, d);
        }
    }

    /// Delete fix-up: the child of `p` on side `xd` (possibly the sentinel)
    /// is a 3-child.
    fn fix_delete(&mut self, mut p: usize, mut xd: usize) {
        loop {
            let yd = 1 - xd;
            let y = self.node(p).links[yd]; // sibling; a real node, since p has rank >= 2
            if self.parity(y) == self.parity(p) {
                // Sibling is a 2-child: demote p and maybe keep climbing.
                let pp = self.node(p).parent;
                let p_was_two = pp != NIL && self.parity(p) == self.parity(pp);
                self.flip(p);
                if pp == NIL || !p_was_two {
                    return;
                }
                xd = self.dir_of(p, pp);
                p = pp;
                continue;
            }
            // Sibling is a 1-child.
            let outer = self.node(y).links[yd];
            let inner = self.node(y).links[xd];
            let outer_two = self.parity(outer) == self.parity(y);
            let inner_two = self.parity(inner) == self.parity(y);
            if outer_two && inner_two {
                // (2,2) sibling: demote it together with p.
                let pp = self.node(p).parent;
                let p_was_two = pp != NIL && self.parity(p) == self.parity(pp);
                self.flip(y);
                self.flip(p);
                if pp == NIL || !p_was_two {
                    return;
                }
                xd = self.dir_of(p, pp);
                p = pp;
                continue;
            }
            if !outer_two {
                // Outer child is a 1-child: single rotation, y rises.
                self.rotate(p, xd);
                self.flip(y); // promote y
                self.flip(p); // demote p...
                if self.node(p).links[0] == NIL && self.node(p).links[1] == NIL {
                    self.flip(p); // ...twice when it became a leaf
                }
            } else {
                // Inner child is a 1-child: it rises above y and p. The
                // pivot gains two ranks and p loses two (parity unchanged);
                // y alone shifts by one.
                self.rotate(y, yd);
                self.rotate(p, xd);
                self.flip(y);
            }
            return;
        }
    }

    // ---------------------------------------------------------------------
    // ITERATION
    // ---------------------------------------------------------------------

    /// In-order iteration over every element.
    pub fn iter(&self) -> IterAsc<'_, 'a, T, K, F> {
        let cur = if self.root == NIL {
            NIL
        } else {
            self.min_of(self.root)
        };
        IterAsc {
            map: self,
            cur,
            end: NIL,
        }
    }

    /// In-order iteration from the greatest key downward.
    pub fn iter_rev(&self) -> IterDesc<'_, 'a, T, K, F> {
        let cur = if self.root == NIL {
            NIL
        } else {
            self.max_of(self.root)
        };
        IterDesc {
            map: self,
            cur,
            end: NIL,
        }
    }

    /// Ascending iteration over keys in `[lo, hi)`. Absent endpoints round
    /// up to the next present key; an inverted range is empty.
    pub fn equal_range(&self, lo: &K, hi: &K) -> IterAsc<'_, 'a, T, K, F> {
        if lo > hi {
            return IterAsc {
                map: self,
                cur: NIL,
                end: NIL,
            };
        }
        IterAsc {
            map: self,
            cur: self.lower_bound(lo),
            end: self.lower_bound(hi),
        }
    }

    /// Descending iteration from the greatest key `<= hi` down to, but not
    /// including, the greatest key `<= lo`. An inverted range is empty.
    pub fn equal_rrange(&self, hi: &K, lo: &K) -> IterDesc<'_, 'a, T, K, F> {
        if hi < lo {
            return IterDesc {
                map: self,
                cur: NIL,
                end: NIL,
            };
        }
        IterDesc {
            map: self,
            cur: self.floor(hi),
            end: self.floor(lo),
        }
    }

    // ---------------------------------------------------------------------
    // BULK OPERATIONS
    // ---------------------------------------------------------------------

    /// Drops every element and resets the arena. O(n) time, O(1) extra
    /// space; the sentinel stays in place.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.root = NIL;
        self.free = NIL;
        self.len = 0;
    }

    /// Full audit of the tree, O(n): binary-search-tree order, parent
    /// links, rank-rule conformance (differences of 1 or 2 only, leaves at
    /// rank 0), parity consistency, sentinel integrity, element count.
    pub fn validate(&self) -> bool {
        let s = self.node(NIL);
        if s.links != [NIL, NIL] || s.parent != NIL || !s.parity {
            return false;
        }
        if self.root == NIL {
            return self.len == 0;
        }
        if self.node(self.root).parent != NIL {
            return false;
        }
        let mut count = 0;
        self.check_subtree(self.root, None, None, &mut count).is_some() && count == self.len
    }

    /// Returns the subtree's rank, or `None` on any rule violation.
    fn check_subtree(
        &self,
        n: usize,
        lo: Option<&K>,
        hi: Option<&K>,
        count: &mut usize,
    ) -> Option<i64> {
        if n == NIL {
            return Some(-1);
        }
        *count += 1;
        let key = self.key(n);
        if let Some(lo) = lo {
            if key <= lo {
                return None;
            }
        }
        if let Some(hi) = hi {
            if key >= hi {
                return None;
            }
        }
        let left = self.node(n).links[0];
        let right = self.node(n).links[1];
        if left != NIL && self.node(left).parent != n {
            return None;
        }
        if right != NIL && self.node(right).parent != n {
            return None;
        }
        let lr = self.check_subtree(left, lo, Some(key), count)?;
        let rr = self.check_subtree(right, Some(key), hi, count)?;

        if left == NIL && right == NIL {
            // Leaves are rank 0, nothing else.
            return if self.parity(n) { None } else { Some(0) };
        }
        let parity = i64::from(self.parity(n));
        for candidate in [lr + 1, lr + 2] {
            let rdiff = candidate - rr;
            if (1..=2).contains(&rdiff) && candidate.rem_euclid(2) == parity {
                return Some(candidate);
            }
        }
        None
    }
}

/// Ascending in-order iterator (whole map or an `equal_range`).
pub struct IterAsc<'s, 'a, T, K, F> {
    map: &'s WavlMap<'a, T, K, F>,
    cur: usize,
    end: usize,
}

impl<'s, 'a, T, K, F> Iterator for IterAsc<'s, 'a, T, K, F>
where
    K: Ord,
    F: Fn(&T) -> &K,
{
    type Item = &'s T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == self.end || self.cur == NIL {
            return None;
        }
        let out = self.map.node(self.cur).elem.as_ref();
        self.cur = self.map.successor(self.cur);
        out
    }
}

/// Descending iterator (an `equal_rrange`).
pub struct IterDesc<'s, 'a, T, K, F> {
    map: &'s WavlMap<'a, T, K, F>,
    cur: usize,
    end: usize,
}

impl<'s, 'a, T, K, F> Iterator for IterDesc<'s, 'a, T, K, F>
where
    K: Ord,
    F: Fn(&T) -> &K,
{
    type Item = &'s T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == self.end || self.cur == NIL {
            return None;
        }
        let out = self.map.node(self.cur).elem.as_ref();
        self.cur = self.map.predecessor(self.cur);
        out
    }
}

/// Entry into a [`WavlMap`] lookup.
pub type TreeEntry<'m, 'a, T, K, F> =
    Entry<OccupiedEntry<'m, 'a, T, K, F>, VacantEntry<'m, 'a, T, K, F>>;

/// A present element, addressed by its node.
pub struct OccupiedEntry<'m, 'a, T, K, F> {
    map: &'m mut WavlMap<'a, T, K, F>,
    node: usize,
}

impl<'m, 'a, T, K, F> entry::Occupied<'m> for OccupiedEntry<'m, 'a, T, K, F>
where
    K: Ord,
    F: Fn(&T) -> &K,
{
    type Elem = T;

    fn get(&self) -> &T {
        self.map
            .node(self.node)
            .elem
            .as_ref()
            .expect("tree nodes hold an element")
    }

    fn get_mut(&mut self) -> &mut T {
        self.map
            .node_mut(self.node)
            .elem
            .as_mut()
            .expect("tree nodes hold an element")
    }

    fn into_mut(self) -> &'m mut T {
        self.map
            .node_mut(self.node)
            .elem
            .as_mut()
            .expect("tree nodes hold an element")
    }

    fn remove(self) -> T {
        self.map.remove_node(self.node)
    }
}

/// A remembered insertion point: the recorded parent and descent direction.
pub struct VacantEntry<'m, 'a, T, K, F> {
    map: &'m mut WavlMap<'a, T, K, F>,
    parent: usize,
    dir: usize,
}

impl<'m, 'a, T, K, F> entry::Vacant<'m> for VacantEntry<'m, 'a, T, K, F>
where
    K: Ord,
    F: Fn(&T) -> &K,
{
    type Elem = T;

    fn insert(self, elem: T) -> Result<&'m mut T, Error> {
        let map = self.map;
        let n = map.attach(self.parent, self.dir, elem)?;
        Ok(map
            .node_mut(n)
            .elem
            .as_mut()
            .expect("fresh node holds its element"))
    }
}
