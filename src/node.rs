//! Storage node types: bucket entries and persistent-vector trie nodes.

use std::fmt;
use std::sync::Arc;

/// Bits per trie level (5 → 32-way branching).
pub const BITS_PER_LEVEL: u32 = 5;

/// Number of slots in a trie node.
pub const BRANCH_FACTOR: usize = 1 << BITS_PER_LEVEL;

/// Mask selecting the slot of an index within its leaf.
pub const SLOT_MASK: usize = BRANCH_FACTOR - 1;

/// Bucket entry storing a key-value pair with its precomputed hash.
///
/// The hash is kept so that rehashing into a larger bucket array never
/// calls back into the key's `Hash` impl.
#[derive(Clone)]
pub struct Entry<K, V> {
    /// Precomputed 64-bit hash of the key.
    pub hash: u64,
    /// The key.
    pub key: K,
    /// The value.
    pub value: V,
}

/// A hash bucket. `None` for an empty slot, otherwise a shared, non-empty
/// run of entries that copy-on-write replaces as a whole.
pub type Bucket<K, V> = Option<Arc<Vec<Entry<K, V>>>>;

/// Persistent-vector trie node.
///
/// Leaves sit at level 0 and hold up to [`BRANCH_FACTOR`] elements; every
/// branch above them holds up to [`BRANCH_FACTOR`] shared children.
#[derive(Clone)]
pub enum Node<T> {
    /// Interior node.
    Branch(Vec<Arc<Self>>),
    /// Level-0 node holding elements.
    Leaf(Vec<T>),
}

/// Extracts the 5-bit slot of `index` at the given bit-shift depth.
#[inline]
#[must_use]
pub const fn fragment(index: usize, shift: u32) -> usize {
    (index >> shift) & SLOT_MASK
}

impl<K, V> fmt::Debug for Entry<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("hash", &format_args!("{:#018x}", self.hash))
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}

impl<T> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch(children) => f
                .debug_struct("Branch")
                .field("children", &children.len())
                .finish(),
            Self::Leaf(items) => f.debug_struct("Leaf").field("items", &items.len()).finish(),
        }
    }
}
