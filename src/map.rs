//! Persistent hash map over the bucketed store.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops;

use crate::evolver::{Evolver, Persistent};
use crate::iter::{Iter, Keys};
use crate::ops::insert::InsertOutcome;
use crate::store::{Store, StoreConfig};

/// Persistent hash map with structural sharing.
///
/// Every write returns a new map; the receiver is never modified.
pub struct PMap<K, V> {
    store: Store<K, V>,
}

// ---------------------------------------------------------------------------
// Construction & accessors (no trait bounds)
// ---------------------------------------------------------------------------

impl<K, V> PMap<K, V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Store::new(),
        }
    }

    /// Creates an empty map whose store follows `config`.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            store: Store::with_config(config),
        }
    }

    /// Returns the number of key-value pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns the current `AdHash` value of the backing store.
    #[must_use]
    pub const fn adhash(&self) -> u64 {
        self.store.adhash()
    }

    /// Returns the number of hash buckets in the backing store.
    #[must_use]
    pub const fn bucket_count(&self) -> usize {
        self.store.bucket_count()
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &Store<K, V> {
        &self.store
    }

    /// Returns `true` if both maps are the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.store.ptr_eq(&other.store)
    }

    /// Returns an iterator over `(&K, &V)` pairs.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.store.iter()
    }

    /// Returns an iterator over the keys.
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.store.iter())
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.store.iter().map(|(_, value)| value)
    }
}

// ---------------------------------------------------------------------------
// Read operations (K: Hash + Eq)
// ---------------------------------------------------------------------------

impl<K: Hash + Eq, V> PMap<K, V> {
    /// Returns a reference to the value associated with `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.store.get(key)
    }

    /// Returns `true` if the map contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.store.contains_key(key)
    }
}

// ---------------------------------------------------------------------------
// Write operations (K: Hash + Eq + Clone, V: Hash + PartialEq + Clone)
// ---------------------------------------------------------------------------

impl<K, V> PMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Hash + PartialEq + Clone,
{
    /// Returns a map with `key` mapped to `value`.
    ///
    /// Mapping a key to the value it already has returns this map.
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        Self {
            store: self.store.insert(key, value),
        }
    }

    /// Returns a map without `key`.
    #[must_use]
    pub fn remove(&self, key: &K) -> Self {
        Self {
            store: self.store.remove(key),
        }
    }

    /// Returns a map with every pair of `iter` inserted, later pairs winning.
    #[must_use]
    pub fn update<I: IntoIterator<Item = (K, V)>>(&self, iter: I) -> Self {
        let mut evolver = self.evolver();
        evolver.update(iter);
        evolver.persistent()
    }

    /// Creates an evolver for batching changes against this map.
    #[must_use]
    pub fn evolver(&self) -> Evolver<Self> {
        Evolver::new(self.clone())
    }

    pub(crate) fn insert_mut(&mut self, key: K, value: V) -> InsertOutcome<V> {
        self.store.insert_mut(key, value)
    }

    pub(crate) fn remove_mut(&mut self, key: &K) -> Option<V> {
        self.store.remove_mut(key)
    }
}

impl<K, V> Persistent for PMap<K, V> {
    fn ptr_eq(&self, other: &Self) -> bool {
        self.store.ptr_eq(&other.store)
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl<K, V> Clone for PMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<K, V> Default for PMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for PMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store
    }
}

impl<K: Hash + Eq, V: Eq> Eq for PMap<K, V> {}

impl<K, V> Hash for PMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.store.hash(state);
    }
}

impl<K, V> FromIterator<(K, V)> for PMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Hash + PartialEq + Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert_mut(key, value);
        }
        map
    }
}

impl<K: Hash + Eq, V> ops::Index<&K> for PMap<K, V> {
    type Output = V;

    fn index(&self, key: &K) -> &V {
        self.get(key).expect("key not found")
    }
}

impl<'a, K, V> IntoIterator for &'a PMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}
