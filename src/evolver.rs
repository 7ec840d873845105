//! Transient batch mutation of persistent collections.
//!
//! An [`Evolver`] starts as an alias of its origin's structure. The first
//! write to any node copies it ([`Arc::make_mut`](std::sync::Arc::make_mut)
//! sees the origin's reference); later writes to the same node happen in
//! place. A batch of N additions therefore costs N in-place inserts, not N
//! persistent values.
//!
//! An evolver is not `Sync`-safe in the sense of shared mutation: it is a
//! plain owned value and must stay with one owner from creation through
//! [`Evolver::persistent`]. The collections it produces can be shared freely.

use std::fmt;
use std::hash::Hash;

use tracing::trace;

use crate::error::IndexError;
use crate::map::PMap;
use crate::set::PSet;
use crate::vector::PVector;

/// A persistent collection an [`Evolver`] can be built over.
pub trait Persistent: Clone {
    /// Returns `true` if both values are the same object.
    fn ptr_eq(&self, other: &Self) -> bool;
}

/// Saved evolver state for rollback.
///
/// Created by [`Evolver::checkpoint`]. Holding a checkpoint keeps the
/// working structure shared, so later writes copy instead of mutating it.
pub struct EvolverCheckpoint<C> {
    working: C,
    dirty: bool,
}

impl<C: Clone> Clone for EvolverCheckpoint<C> {
    fn clone(&self) -> Self {
        Self {
            working: self.working.clone(),
            dirty: self.dirty,
        }
    }
}

impl<C> fmt::Debug for EvolverCheckpoint<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvolverCheckpoint")
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

/// Mutable working copy bound to one persistent origin.
pub struct Evolver<C> {
    origin: C,
    working: C,
    dirty: bool,
}

/// Evolver over a [`PSet`].
pub type SetEvolver<T> = Evolver<PSet<T>>;

/// Evolver over a [`PMap`].
pub type MapEvolver<K, V> = Evolver<PMap<K, V>>;

/// Evolver over a [`PVector`].
pub type VectorEvolver<T> = Evolver<PVector<T>>;

// ---------------------------------------------------------------------------
// Any persistent collection
// ---------------------------------------------------------------------------

impl<C: Persistent> Evolver<C> {
    pub(crate) fn new(origin: C) -> Self {
        Self {
            working: origin.clone(),
            origin,
            dirty: false,
        }
    }

    /// Returns `true` if a write changed the working copy since creation or
    /// the last commit.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the working copy as it stands.
    #[must_use]
    pub const fn working(&self) -> &C {
        &self.working
    }

    /// Saves the working copy for a later [`rollback`](Self::rollback).
    #[must_use]
    pub fn checkpoint(&self) -> EvolverCheckpoint<C> {
        EvolverCheckpoint {
            working: self.working.clone(),
            dirty: self.dirty,
        }
    }

    /// Restores the working copy to a previously saved checkpoint.
    pub fn rollback(&mut self, cp: EvolverCheckpoint<C>) {
        self.working = cp.working;
        self.dirty = cp.dirty;
    }
}

impl<C: Persistent + PartialEq> Evolver<C> {
    /// Finalizes the batch.
    ///
    /// Returns the origin itself when the working copy has the same contents,
    /// including batches that only re-added present elements or undid their
    /// own writes. Otherwise returns a new value, which becomes the origin
    /// for repeated calls and further writes.
    pub fn persistent(&mut self) -> C {
        if self.dirty && self.working != self.origin {
            self.origin = self.working.clone();
            trace!("evolver committed a new value");
        } else if self.dirty {
            self.working = self.origin.clone();
            trace!("evolver batch had no net change");
        }
        self.dirty = false;
        self.origin.clone()
    }
}

impl<C: Persistent> Clone for Evolver<C> {
    fn clone(&self) -> Self {
        Self {
            origin: self.origin.clone(),
            working: self.working.clone(),
            dirty: self.dirty,
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for Evolver<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evolver")
            .field("working", &self.working)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Sets
// ---------------------------------------------------------------------------

impl<T: Hash + Eq + Clone> Evolver<PSet<T>> {
    /// Adds `elem` to the working copy.
    pub fn add(&mut self, elem: T) -> &mut Self {
        if self.working.add_mut(elem) {
            self.dirty = true;
        }
        self
    }

    /// Adds every element of `iter`.
    pub fn update<I: IntoIterator<Item = T>>(&mut self, iter: I) -> &mut Self {
        for elem in iter {
            self.add(elem);
        }
        self
    }

    /// Removes `elem` if present.
    pub fn discard(&mut self, elem: &T) -> &mut Self {
        if self.working.discard_mut(elem) {
            self.dirty = true;
        }
        self
    }

    /// Returns `true` if the working copy contains `elem`.
    #[must_use]
    pub fn contains(&self, elem: &T) -> bool {
        self.working.contains(elem)
    }

    /// Returns the number of elements in the working copy.
    #[must_use]
    pub fn len(&self) -> usize {
        self.working.len()
    }

    /// Returns `true` if the working copy is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Maps
// ---------------------------------------------------------------------------

impl<K, V> Evolver<PMap<K, V>>
where
    K: Hash + Eq + Clone,
    V: Hash + PartialEq + Clone,
{
    /// Maps `key` to `value` in the working copy.
    pub fn set(&mut self, key: K, value: V) -> &mut Self {
        if self.working.insert_mut(key, value).changed() {
            self.dirty = true;
        }
        self
    }

    /// Applies [`set`](Self::set) for every pair of `iter`.
    pub fn update<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) -> &mut Self {
        for (key, value) in iter {
            self.set(key, value);
        }
        self
    }

    /// Removes `key` if present.
    pub fn remove(&mut self, key: &K) -> &mut Self {
        if self.working.remove_mut(key).is_some() {
            self.dirty = true;
        }
        self
    }

    /// Returns the value `key` maps to in the working copy.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.working.get(key)
    }

    /// Returns the number of entries in the working copy.
    #[must_use]
    pub fn len(&self) -> usize {
        self.working.len()
    }

    /// Returns `true` if the working copy is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Vectors
// ---------------------------------------------------------------------------

impl<T: PartialEq + Clone> Evolver<PVector<T>> {
    /// Appends `value` to the working copy.
    pub fn append(&mut self, value: T) -> &mut Self {
        self.working.push_back_mut(value);
        self.dirty = true;
        self
    }

    /// Appends every element of `iter`.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) -> &mut Self {
        for value in iter {
            self.append(value);
        }
        self
    }

    /// Replaces the element at `index`. Writing an equal value is not a
    /// change.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if `index` is out of range.
    pub fn set(&mut self, index: usize, value: T) -> Result<&mut Self, IndexError> {
        let len = self.working.len();
        let unchanged = match self.working.get(index) {
            None => return Err(IndexError { index, len }),
            Some(current) => *current == value,
        };
        if !unchanged {
            self.working.set_mut(index, value)?;
            self.dirty = true;
        }
        Ok(self)
    }

    /// Returns the element at `index` in the working copy.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.working.get(index)
    }

    /// Returns the number of elements in the working copy.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.working.len()
    }

    /// Returns `true` if the working copy is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.working.is_empty()
    }
}
