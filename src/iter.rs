//! Iterator types for stores, maps, sets and vectors.

use std::slice;

use crate::node::{self, Bucket, Entry};
use crate::vector::PVector;

/// Iterator over references to key-value pairs in a [`Store`](crate::store::Store).
///
/// Walks the bucket array front to back, so every call to `iter` on the
/// same store yields the same order.
pub struct Iter<'a, K, V> {
    buckets: VectorIter<'a, Bucket<K, V>>,
    current: slice::Iter<'a, Entry<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    /// Creates an iterator over the entries of `buckets`, which hold `len`
    /// entries in total.
    pub fn new(buckets: &'a PVector<Bucket<K, V>>, len: usize) -> Self {
        Self {
            buckets: buckets.iter(),
            current: slice::Iter::default(),
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.next() {
                self.remaining -= 1;
                return Some((&entry.key, &entry.value));
            }
            if let Some(entries) = self.buckets.next()? {
                self.current = entries.iter();
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over the keys of a [`PMap`](crate::PMap) or the elements of a
/// [`PSet`](crate::PSet).
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) const fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// Iterator over references to the elements of a [`PVector`].
///
/// Holds on to the current 32-element leaf so that each step is O(1)
/// and only every 32nd step descends the trie.
pub struct VectorIter<'a, T> {
    vector: &'a PVector<T>,
    chunk: &'a [T],
    index: usize,
}

impl<'a, T> VectorIter<'a, T> {
    pub(crate) const fn new(vector: &'a PVector<T>) -> Self {
        Self {
            vector,
            chunk: &[],
            index: 0,
        }
    }
}

impl<'a, T> Iterator for VectorIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.vector.len() {
            return None;
        }
        let slot = self.index & node::SLOT_MASK;
        if slot == 0 {
            self.chunk = self.vector.chunk_for(self.index);
        }
        self.index += 1;
        self.chunk.get(slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vector.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for VectorIter<'_, T> {}
