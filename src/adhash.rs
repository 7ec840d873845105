//! `AdHash`: incremental structural hashing.
//!
//! A bucket store keeps `φ(S) = Σ f(k, v)` over all of its entries using
//! wrapping arithmetic, so the value is independent of bucket layout and
//! insertion history. Two mixing seeds prevent degeneration when
//! `hash(v) = 0` (every set entry has the unit value).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// First mixing seed (golden ratio constant).
const SEED_1: u64 = 0x9E37_79B9_7F4A_7C15;

/// Second mixing seed (large prime).
const SEED_2: u64 = 0x517C_C1B7_2722_0A95;

/// Computes the 64-bit hash of a value.
///
/// `DefaultHasher::new()` uses fixed keys, so the result for a given value
/// never changes while the process runs.
#[must_use]
pub fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Computes the `AdHash` contribution of a single entry.
///
/// `f(k, v) = key_hash · SEED₁ ⊕ value_hash · SEED₂`
#[must_use]
pub const fn entry_adhash(key_hash: u64, value_hash: u64) -> u64 {
    key_hash.wrapping_mul(SEED_1) ^ value_hash.wrapping_mul(SEED_2)
}

/// Combines element hashes so that their order does not matter.
#[must_use]
pub fn unordered<I: IntoIterator<Item = u64>>(hashes: I) -> u64 {
    hashes
        .into_iter()
        .fold(0, |acc, h| acc.wrapping_add(entry_adhash(h, 0)))
}
