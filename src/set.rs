//! Persistent hash set: a [`PMap`] whose values are `()`.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::evolver::{Evolver, Persistent};
use crate::iter::Keys;
use crate::map::PMap;
use crate::store::StoreConfig;

/// Persistent hash set with structural sharing.
///
/// Two sets are equal when they hold the same elements, whatever their
/// bucket layout or insertion history.
pub struct PSet<T> {
    map: PMap<T, ()>,
}

// ---------------------------------------------------------------------------
// Construction & accessors (no trait bounds)
// ---------------------------------------------------------------------------

impl<T> PSet<T> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self { map: PMap::new() }
    }

    /// Creates an empty set whose store follows `config`.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            map: PMap::with_config(config),
        }
    }

    /// Returns the number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the set contains no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the number of hash buckets in the backing store.
    #[must_use]
    pub const fn bucket_count(&self) -> usize {
        self.map.bucket_count()
    }

    /// Returns the current `AdHash` value of the backing store.
    #[must_use]
    pub const fn adhash(&self) -> u64 {
        self.map.adhash()
    }

    /// Returns `true` if both sets are the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.map.ptr_eq(&other.map)
    }

    /// Returns an iterator over the elements.
    ///
    /// Each call starts a fresh pass; the order is stable for one set value.
    #[must_use]
    pub fn iter(&self) -> Keys<'_, T, ()> {
        self.map.keys()
    }
}

// ---------------------------------------------------------------------------
// Read operations (T: Hash + Eq)
// ---------------------------------------------------------------------------

impl<T: Hash + Eq> PSet<T> {
    /// Returns `true` if the set contains `elem`.
    #[must_use]
    pub fn contains(&self, elem: &T) -> bool {
        self.map.contains_key(elem)
    }

    /// Returns `true` if every element of this set is in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|elem| other.contains(elem))
    }
}

// ---------------------------------------------------------------------------
// Write operations (T: Hash + Eq + Clone)
// ---------------------------------------------------------------------------

impl<T: Hash + Eq + Clone> PSet<T> {
    /// Returns a set that also contains `elem`. Adding a present element
    /// returns this set.
    #[must_use]
    pub fn add(&self, elem: T) -> Self {
        Self {
            map: self.map.insert(elem, ()),
        }
    }

    /// Returns a set without `elem`. Discarding a missing element returns
    /// this set.
    #[must_use]
    pub fn discard(&self, elem: &T) -> Self {
        Self {
            map: self.map.remove(elem),
        }
    }

    /// Returns a set with every element of `iter` added.
    #[must_use]
    pub fn update<I: IntoIterator<Item = T>>(&self, iter: I) -> Self {
        let mut evolver = self.evolver();
        evolver.update(iter);
        evolver.persistent()
    }

    /// Returns the union of both sets.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let (big, small) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        big.update(small.iter().cloned())
    }

    /// Returns the elements present in both sets.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut evolver = self.evolver();
        for elem in self.iter().filter(|elem| !other.contains(elem)) {
            evolver.discard(elem);
        }
        evolver.persistent()
    }

    /// Returns the elements of this set that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        let mut evolver = self.evolver();
        for elem in other.iter() {
            evolver.discard(elem);
        }
        evolver.persistent()
    }

    /// Creates an evolver for batching changes against this set.
    #[must_use]
    pub fn evolver(&self) -> Evolver<Self> {
        Evolver::new(self.clone())
    }

    /// Adds in place; returns `true` if the element was new.
    pub(crate) fn add_mut(&mut self, elem: T) -> bool {
        self.map.insert_mut(elem, ()).changed()
    }

    /// Removes in place; returns `true` if the element was present.
    pub(crate) fn discard_mut(&mut self, elem: &T) -> bool {
        self.map.remove_mut(elem).is_some()
    }
}

impl<T> Persistent for PSet<T> {
    fn ptr_eq(&self, other: &Self) -> bool {
        self.map.ptr_eq(&other.map)
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl<T> Clone for PSet<T> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<T> Default for PSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for PSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Hash + Eq> PartialEq for PSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<T: Hash + Eq> Eq for PSet<T> {}

impl<T> Hash for PSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.map.hash(state);
    }
}

impl<T: Hash + Eq + Clone> FromIterator<T> for PSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for elem in iter {
            set.add_mut(elem);
        }
        set
    }
}

impl<'a, T> IntoIterator for &'a PSet<T> {
    type Item = &'a T;
    type IntoIter = Keys<'a, T, ()>;

    fn into_iter(self) -> Keys<'a, T, ()> {
        self.iter()
    }
}
