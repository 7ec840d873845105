use crate::adhash::{entry_adhash, hash_one, unordered};
use crate::{PMap, PSet};

/// φ(∅) = 0.
#[test]
fn empty_adhash_is_zero() {
    let map: PMap<String, String> = PMap::new();
    assert_eq!(map.adhash(), 0);
}

/// φ(S ∪ {e}) = φ(S) + f(e).
#[test]
fn incremental_insert() {
    let m0 = PMap::new();
    let m1 = m0.insert("a", 1);
    let expected = m0
        .adhash()
        .wrapping_add(entry_adhash(hash_one(&"a"), hash_one(&1)));
    assert_eq!(m1.adhash(), expected);

    let m2 = m1.insert("b", 2);
    let expected2 = m1
        .adhash()
        .wrapping_add(entry_adhash(hash_one(&"b"), hash_one(&2)));
    assert_eq!(m2.adhash(), expected2);
}

/// Overwrite swaps the old contribution for the new one.
#[test]
fn overwrite_replaces_contribution() {
    let map = PMap::new().insert("k", 1).insert("k", 2);
    assert_eq!(map.adhash(), entry_adhash(hash_one(&"k"), hash_one(&2)));
}

/// Insert + remove roundtrip: φ returns to 0.
#[test]
fn roundtrip_to_zero() {
    let map = PMap::new().insert(1, 100).insert(2, 200).insert(3, 300);
    let map = map.remove(&1).remove(&2).remove(&3);
    assert!(map.is_empty());
    assert_eq!(map.adhash(), 0);
}

/// Insertion order does not affect φ.
#[test]
fn order_independent() {
    let forward: PMap<i32, i32> = (0..100).map(|i| (i, i * 2)).collect();
    let backward: PMap<i32, i32> = (0..100).rev().map(|i| (i, i * 2)).collect();
    assert_eq!(forward.adhash(), backward.adhash());
}

/// Rehashing into a larger bucket array keeps φ.
#[test]
fn growth_preserves_adhash() {
    let map: PMap<u64, u64> = (0..1000).map(|i| (i, i)).collect();
    let expected = (0_u64..1000).fold(0_u64, |acc, i| {
        acc.wrapping_add(entry_adhash(hash_one(&i), hash_one(&i)))
    });
    assert!(map.bucket_count() > 8);
    assert_eq!(map.adhash(), expected);
}

/// Set elements with the unit value still contribute distinct hashes.
#[test]
fn set_elements_do_not_cancel() {
    let set: PSet<i32> = [1, 2].into_iter().collect();
    assert_ne!(set.adhash(), 0);
    assert_ne!(set.adhash(), PSet::new().add(1).adhash());
}

/// The unordered combination ignores order and is zero when empty.
#[test]
fn unordered_ignores_order() {
    assert_eq!(unordered([1, 2, 3]), unordered([3, 1, 2]));
    assert_ne!(unordered([1, 2, 3]), unordered([1, 2, 4]));
    assert_eq!(unordered(std::iter::empty()), 0);
}

/// `hash_one` gives the same hash for equal values.
#[test]
fn hash_one_is_deterministic() {
    assert_eq!(hash_one("abc"), hash_one("abc"));
    assert_eq!(hash_one(&42_u64), hash_one(&42_u64));
}
