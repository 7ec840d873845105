//! Lookup operation: linear scan of a single bucket.

use crate::node::Entry;

/// Returns the position of `key` within `entries`.
///
/// The stored hash is compared first so that most mismatches never reach
/// the key's `Eq` impl.
pub fn position<K: Eq, V>(entries: &[Entry<K, V>], hash: u64, key: &K) -> Option<usize> {
    entries
        .iter()
        .position(|entry| entry.hash == hash && entry.key == *key)
}

/// Searches for `key` in a bucket's entries.
///
/// Returns a reference to the value if found.
pub fn lookup<'a, K: Eq, V>(entries: &'a [Entry<K, V>], hash: u64, key: &K) -> Option<&'a V> {
    position(entries, hash, key).map(|pos| &entries[pos].value)
}
