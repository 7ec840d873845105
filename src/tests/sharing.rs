//! Structural sharing: which writes copy entries and which share them.
//!
//! Values are `Arc`s so that `strong_count` shows how many stores hold a
//! copy of each entry.

use std::sync::Arc;

use crate::PMap;

fn tracked(n: usize) -> (Vec<Arc<usize>>, PMap<usize, Arc<usize>>) {
    let values: Vec<Arc<usize>> = (0..n).map(Arc::new).collect();
    let map = values
        .iter()
        .enumerate()
        .map(|(i, v)| (i, Arc::clone(v)))
        .collect();
    (values, map)
}

fn copied(values: &[Arc<usize>]) -> usize {
    values.iter().filter(|v| Arc::strong_count(v) > 2).count()
}

/// Cloning shares everything.
#[test]
fn clone_copies_nothing() {
    let (values, map) = tracked(100);
    let clone = map.clone();
    assert_eq!(copied(&values), 0);
    assert!(clone.ptr_eq(&map));
}

/// An insert copies only the entries of the bucket it touches.
#[test]
fn insert_copies_one_bucket() {
    let (values, map) = tracked(100);
    let next = map.insert(1_000, Arc::new(0));
    assert_eq!(next.len(), 101);
    assert!(copied(&values) < 10);
}

/// A remove copies only the entries left in its bucket.
#[test]
fn remove_copies_one_bucket() {
    let (values, map) = tracked(100);
    let next = map.remove(&7);
    assert_eq!(next.len(), 99);
    assert!(copied(&values) < 10);
}

/// A rehash copies every entry into the new bucket array.
#[test]
fn growth_copies_every_entry() {
    let (values, map) = tracked(128);
    assert_eq!(map.bucket_count(), 64);
    let grown = map.insert(1_000, Arc::new(0));
    assert_eq!(grown.bucket_count(), 128);
    assert_eq!(copied(&values), 128);
}

/// Dropping the last map releases every entry.
#[test]
fn last_reference_releases() {
    let (values, map) = tracked(50);
    let derived = map.insert(999, Arc::new(0));
    drop(map);
    drop(derived);
    assert!(values.iter().all(|v| Arc::strong_count(v) == 1));
}

/// A batch through an evolver copies each touched bucket once and shares
/// the rest.
#[test]
fn evolver_batch_shares_untouched() {
    let (values, map) = tracked(100);
    let mut evolver = map.evolver();
    evolver.set(5, Arc::new(50)).set(6, Arc::new(60));
    let next = evolver.persistent();
    assert_eq!(next.get(&5).map(|v| **v), Some(50));
    assert!(copied(&values) < 20);
    assert_eq!(map.get(&5).map(|v| **v), Some(5));
}
