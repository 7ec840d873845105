//! Bucketed persistent store backing sets and maps.
//!
//! Entries live in hash buckets held by a [`PVector`], so replacing one
//! bucket path-copies a handful of trie nodes and shares every other bucket
//! with the previous store. When the entry count exceeds
//! `load_factor × bucket_count` the whole store is rehashed into a larger,
//! freshly built bucket array. Removal never shrinks it.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adhash;
use crate::iter::Iter;
use crate::node::{Bucket, Entry};
use crate::ops::get::lookup;
use crate::ops::insert::{InsertOutcome, insert_into_bucket};
use crate::ops::remove::remove_from_bucket;
use crate::vector::PVector;

/// Default maximum ratio of entries to buckets.
pub const DEFAULT_LOAD_FACTOR: usize = 2;

/// Default multiplier applied to the bucket count on growth.
pub const DEFAULT_GROWTH_FACTOR: usize = 2;

/// Default bucket count of an empty store.
pub const DEFAULT_INITIAL_BUCKETS: usize = 8;

/// Largest accepted growth multiplier.
pub const MAX_GROWTH_FACTOR: usize = 64;

/// Largest accepted bucket count of an empty store.
pub const MAX_INITIAL_BUCKETS: usize = 1 << 16;

/// Bucket count past which a store stops growing.
pub const MAX_BUCKETS: usize = 1 << 30;

/// Sizing policy of a [`Store`].
///
/// Every store derived from a configured store keeps its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of entries per bucket, on average, before growing.
    pub load_factor: usize,
    /// Multiplier applied to the bucket count when growing.
    pub growth_factor: usize,
    /// Bucket count of an empty store.
    pub initial_buckets: usize,
}

impl StoreConfig {
    /// Returns a copy with every field clamped to a usable value.
    ///
    /// The load factor has no upper bound; a huge one only means the store
    /// never grows.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            load_factor: self.load_factor.max(1),
            growth_factor: self.growth_factor.clamp(2, MAX_GROWTH_FACTOR),
            initial_buckets: self.initial_buckets.clamp(1, MAX_INITIAL_BUCKETS),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            load_factor: DEFAULT_LOAD_FACTOR,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            initial_buckets: DEFAULT_INITIAL_BUCKETS,
        }
    }
}

/// Immutable hash-bucket store with structural sharing.
pub struct Store<K, V> {
    buckets: PVector<Bucket<K, V>>,
    size: usize,
    adhash: u64,
    config: StoreConfig,
}

// ---------------------------------------------------------------------------
// Construction & accessors (no trait bounds)
// ---------------------------------------------------------------------------

impl<K, V> Store<K, V> {
    /// Creates an empty store with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates an empty store with the given configuration.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        let config = config.normalized();
        Self {
            buckets: empty_buckets(config.initial_buckets),
            size: 0,
            adhash: 0,
            config,
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the store contains no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the current number of buckets.
    #[must_use]
    pub const fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the current `AdHash` value.
    ///
    /// Two stores with the same `AdHash` and the same length contain the
    /// same entries with overwhelming probability (2⁻⁶⁴ collision chance).
    #[must_use]
    pub const fn adhash(&self) -> u64 {
        self.adhash
    }

    /// Returns the sizing policy.
    #[must_use]
    pub const fn config(&self) -> StoreConfig {
        self.config
    }

    /// Returns `true` if both stores share the same bucket array.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.buckets.ptr_eq(&other.buckets)
    }

    /// Returns an iterator over `(&K, &V)` pairs.
    ///
    /// The order is stable for one store value and unrelated to insertion
    /// order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.buckets, self.size)
    }
}

fn empty_buckets<K, V>(count: usize) -> PVector<Bucket<K, V>> {
    let mut buckets = PVector::new();
    for _ in 0..count {
        buckets.push_back_mut(None);
    }
    buckets
}

#[allow(clippy::cast_possible_truncation)]
const fn bucket_index(hash: u64, bucket_count: usize) -> usize {
    (hash % bucket_count as u64) as usize
}

// ---------------------------------------------------------------------------
// Read operations (K: Hash + Eq)
// ---------------------------------------------------------------------------

impl<K: Hash + Eq, V> Store<K, V> {
    /// Returns a reference to the value associated with `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        let hash = adhash::hash_one(key);
        let bucket = self
            .buckets
            .get(bucket_index(hash, self.bucket_count()))?
            .as_ref()?;
        lookup(bucket, hash, key)
    }

    /// Returns `true` if the store contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }
}

// ---------------------------------------------------------------------------
// Write operations (K: Hash + Eq + Clone, V: Hash + PartialEq + Clone)
// ---------------------------------------------------------------------------

impl<K, V> Store<K, V>
where
    K: Hash + Eq + Clone,
    V: Hash + PartialEq + Clone,
{
    /// Returns a store with `key` mapped to `value`.
    ///
    /// If the key is already mapped to an equal value the returned store
    /// shares this store's bucket array.
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        let mut next = self.clone();
        next.insert_mut(key, value);
        next
    }

    /// Returns a store without `key`. Removing a missing key returns a store
    /// sharing this store's bucket array.
    #[must_use]
    pub fn remove(&self, key: &K) -> Self {
        let mut next = self.clone();
        next.remove_mut(key);
        next
    }

    /// Inserts in place, copying only the buckets and trie nodes still shared
    /// with other stores.
    pub(crate) fn insert_mut(&mut self, key: K, value: V) -> InsertOutcome<V> {
        if self.get(&key).is_some_and(|existing| *existing == value) {
            return InsertOutcome::Unchanged;
        }

        let hash = adhash::hash_one(&key);
        let contribution = adhash::entry_adhash(hash, adhash::hash_one(&value));
        let index = bucket_index(hash, self.bucket_count());
        let Some(bucket) = self.buckets.get_mut(index) else {
            return InsertOutcome::Unchanged;
        };

        let outcome = insert_into_bucket(bucket, Entry { hash, key, value });
        match &outcome {
            InsertOutcome::Inserted => {
                self.size += 1;
                self.adhash = self.adhash.wrapping_add(contribution);
                if self.size > self.config.load_factor.saturating_mul(self.bucket_count()) {
                    self.grow();
                }
            }
            InsertOutcome::Replaced(old) => {
                let old_contribution = adhash::entry_adhash(hash, adhash::hash_one(old));
                self.adhash = self
                    .adhash
                    .wrapping_sub(old_contribution)
                    .wrapping_add(contribution);
            }
            InsertOutcome::Unchanged => {}
        }
        outcome
    }

    /// Removes in place. Returns the removed value, or `None` if the key was
    /// absent, in which case nothing is copied.
    pub(crate) fn remove_mut(&mut self, key: &K) -> Option<V> {
        if !self.contains_key(key) {
            return None;
        }

        let hash = adhash::hash_one(key);
        let index = bucket_index(hash, self.bucket_count());
        let removed = remove_from_bucket(self.buckets.get_mut(index)?, hash, key)?;
        self.size -= 1;
        self.adhash = self.adhash.wrapping_sub(adhash::entry_adhash(
            removed.hash,
            adhash::hash_one(&removed.value),
        ));
        Some(removed.value)
    }

    /// Rehashes every entry into a new bucket array `growth_factor` times
    /// larger, capped at [`MAX_BUCKETS`]. Nothing of the old array is reused.
    fn grow(&mut self) {
        let from = self.bucket_count();
        let to = from.saturating_mul(self.config.growth_factor).min(MAX_BUCKETS);
        if to <= from {
            return;
        }

        let mut fresh: Vec<Vec<Entry<K, V>>> = (0..to).map(|_| Vec::new()).collect();
        for bucket in self.buckets.iter().flatten() {
            for entry in bucket.iter() {
                fresh[bucket_index(entry.hash, to)].push(entry.clone());
            }
        }

        self.buckets = fresh
            .into_iter()
            .map(|entries| (!entries.is_empty()).then(|| Arc::new(entries)))
            .collect();

        debug!(from, to, entries = self.size, "rehashed bucket store");
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl<K, V> Clone for Store<K, V> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            size: self.size,
            adhash: self.adhash,
            config: self.config,
        }
    }
}

impl<K, V> Default for Store<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for Store<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("len", &self.size)
            .field("buckets", &self.bucket_count())
            .field("adhash", &format_args!("{:#018x}", self.adhash))
            .finish_non_exhaustive()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for Store<K, V> {
    fn eq(&self, other: &Self) -> bool {
        if self.size != other.size || self.adhash != other.adhash {
            return false;
        }
        self.ptr_eq(other)
            || self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|v| v == value))
    }
}

impl<K: Hash + Eq, V: Eq> Eq for Store<K, V> {}

impl<K, V> Hash for Store<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.size);
        state.write_u64(self.adhash);
    }
}
