//! The entry protocol shared by the keyed containers.
//!
//! A lookup on [`HandleMap`](crate::HandleMap) or [`WavlMap`](crate::WavlMap)
//! returns an [`Entry`]: either `Occupied` (the key is present) or `Vacant`
//! (it is not, and the entry remembers where it would go). Follow-up
//! operations finish the job without a second search: the hash map's vacant
//! entry carries the claimed probe slot and adjusted hash, the tree's carries
//! the recorded parent and descent direction.
//!
//! Each container defines its own concrete occupied/vacant types; the
//! [`Occupied`] and [`Vacant`] traits are the seam that lets the combinators
//! here work for both.
//!
//! Fallibility: a vacant insert can fail (fixed storage full, allocation
//! denied), so the inserting combinators return `Result`. A failed insert
//! leaves the container unchanged.

use crate::error::Error;

/// The result of a keyed lookup: found, or a remembered insertion point.
pub enum Entry<O, V> {
    /// The key is present.
    Occupied(O),
    /// The key is absent; inserting through this entry needs no re-search.
    Vacant(V),
}

/// View of a present element.
pub trait Occupied<'m>: Sized {
    /// The payload type.
    type Elem;

    /// Borrows the element.
    fn get(&self) -> &Self::Elem;

    /// Mutably borrows the element.
    ///
    /// Mutating the element's key through this reference corrupts the
    /// container; `validate()` exists to diagnose that after the fact.
    fn get_mut(&mut self) -> &mut Self::Elem;

    /// Converts the entry into a long-lived mutable borrow.
    fn into_mut(self) -> &'m mut Self::Elem;

    /// Removes the element from the container and returns it.
    fn remove(self) -> Self::Elem;
}

/// View of an absent element's insertion point.
pub trait Vacant<'m>: Sized {
    /// The payload type.
    type Elem;

    /// Inserts `elem` at the remembered position.
    fn insert(self, elem: Self::Elem) -> Result<&'m mut Self::Elem, Error>;
}

impl<O, V> Entry<O, V> {
    /// Returns true if the lookup found the key.
    pub fn is_occupied(&self) -> bool {
        matches!(self, Entry::Occupied(_))
    }

    /// Returns true if the lookup did not find the key.
    pub fn is_vacant(&self) -> bool {
        matches!(self, Entry::Vacant(_))
    }
}

impl<'m, O, V> Entry<O, V>
where
    O: Occupied<'m>,
    V: Vacant<'m, Elem = O::Elem>,
{
    /// Inserts `default` if the entry is vacant; either way, returns the
    /// live element.
    pub fn or_insert(self, default: O::Elem) -> Result<&'m mut O::Elem, Error> {
        match self {
            Entry::Occupied(occ) => Ok(occ.into_mut()),
            Entry::Vacant(vac) => vac.insert(default),
        }
    }

    /// Like [`or_insert`](Entry::or_insert), but builds the element only
    /// when it is actually needed.
    pub fn or_insert_with(self, make: impl FnOnce() -> O::Elem) -> Result<&'m mut O::Elem, Error> {
        match self {
            Entry::Occupied(occ) => Ok(occ.into_mut()),
            Entry::Vacant(vac) => vac.insert(make()),
        }
    }

    /// Inserts `elem`, overwriting (and dropping) the present element if the
    /// entry is occupied.
    pub fn insert(self, elem: O::Elem) -> Result<&'m mut O::Elem, Error> {
        match self {
            Entry::Occupied(mut occ) => {
                *occ.get_mut() = elem;
                Ok(occ.into_mut())
            }
            Entry::Vacant(vac) => vac.insert(elem),
        }
    }

    /// Runs `f` on the element if present, then hands the entry back for
    /// chaining.
    pub fn and_modify(mut self, f: impl FnOnce(&mut O::Elem)) -> Self {
        if let Entry::Occupied(occ) = &mut self {
            f(occ.get_mut());
        }
        self
    }

    /// Borrows the element if present.
    pub fn get(&self) -> Option<&O::Elem> {
        match self {
            Entry::Occupied(occ) => Some(occ.get()),
            Entry::Vacant(_) => None,
        }
    }

    /// Removes and returns the element if present; a vacant entry is a no-op.
    pub fn remove(self) -> Option<O::Elem> {
        match self {
            Entry::Occupied(occ) => Some(occ.remove()),
            Entry::Vacant(_) => None,
        }
    }
}
