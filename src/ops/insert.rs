//! Insertion operation: copy-on-write update of a single bucket.

use std::mem;
use std::sync::Arc;

use crate::node::{Bucket, Entry};
use crate::ops::get::position;

/// Outcome of inserting into a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome<V> {
    /// The key was new.
    Inserted,
    /// The key existed with a different value, which is returned.
    Replaced(V),
    /// The key existed with an equal value; nothing was written.
    Unchanged,
}

impl<V> InsertOutcome<V> {
    /// Returns `true` unless the insert was a no-op.
    #[must_use]
    pub const fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Inserts `entry` into `bucket`.
///
/// The entry vector is unshared via [`Arc::make_mut`] only when a write
/// actually happens.
pub fn insert_into_bucket<K, V>(bucket: &mut Bucket<K, V>, entry: Entry<K, V>) -> InsertOutcome<V>
where
    K: Eq + Clone,
    V: PartialEq + Clone,
{
    let entries = match bucket {
        Some(entries) => entries,
        None => {
            *bucket = Some(Arc::new(vec![entry]));
            return InsertOutcome::Inserted;
        }
    };

    match position(entries, entry.hash, &entry.key) {
        Some(pos) if entries[pos].value == entry.value => InsertOutcome::Unchanged,
        Some(pos) => {
            let slot = &mut Arc::make_mut(entries)[pos];
            InsertOutcome::Replaced(mem::replace(&mut slot.value, entry.value))
        }
        None => {
            Arc::make_mut(entries).push(entry);
            InsertOutcome::Inserted
        }
    }
}
