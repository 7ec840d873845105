//! Removal operation: copy-on-write delete from a single bucket.

use std::sync::Arc;

use crate::node::{Bucket, Entry};
use crate::ops::get::position;

/// Removes `key` from `bucket`, returning the removed entry.
///
/// A bucket left without entries collapses back to `None`. Entry order
/// inside the bucket is not preserved.
pub fn remove_from_bucket<K, V>(bucket: &mut Bucket<K, V>, hash: u64, key: &K) -> Option<Entry<K, V>>
where
    K: Eq + Clone,
    V: Clone,
{
    let entries = bucket.as_mut()?;
    let pos = position(entries, hash, key)?;
    let removed = Arc::make_mut(entries).swap_remove(pos);
    if entries.is_empty() {
        *bucket = None;
    }
    Some(removed)
}
