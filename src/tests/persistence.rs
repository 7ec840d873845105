use std::thread;

use crate::{PMap, PSet, PVector};

/// An insert leaves the original map untouched.
#[test]
fn insert_keeps_original() {
    let original: PMap<i32, i32> = (0..100).map(|i| (i, i)).collect();
    let snapshot: Vec<(i32, i32)> = original.iter().map(|(k, v)| (*k, *v)).collect();

    let updated = original.insert(1000, 1000).insert(5, -5);

    let after: Vec<(i32, i32)> = original.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(snapshot, after);
    assert_eq!(original.get(&5), Some(&5));
    assert_eq!(updated.get(&5), Some(&-5));
    assert_eq!(updated.len(), 101);
}

/// A remove leaves the original set untouched.
#[test]
fn remove_keeps_original() {
    let original: PSet<i32> = (0..20).collect();
    let smaller = original.discard(&3).discard(&4);
    assert_eq!(original.len(), 20);
    assert!(original.contains(&3));
    assert_eq!(smaller.len(), 18);
}

/// A rehash builds new buckets; older values keep their own.
#[test]
fn growth_keeps_original() {
    let small: PSet<u32> = (0..16).collect();
    let buckets = small.bucket_count();
    let grown = small.update(16..1000);
    assert!(grown.bucket_count() > buckets);
    assert_eq!(small.bucket_count(), buckets);
    assert_eq!(small.len(), 16);
    assert!((0..16).all(|i| small.contains(&i)));
    assert!(!small.contains(&500));
}

/// Vector writes leave earlier versions untouched.
#[test]
fn vector_versions_independent() {
    let v1: PVector<i32> = (0..100).collect();
    let v2 = v1.push_back(100);
    let v3 = match v1.set(50, -1) {
        Ok(v) => v,
        Err(e) => panic!("{e}"),
    };

    assert_eq!(v1.len(), 100);
    assert_eq!(v1.get(50), Some(&50));
    assert_eq!(v2.len(), 101);
    assert_eq!(v2.get(50), Some(&50));
    assert_eq!(v3.get(50), Some(&-1));
}

/// Many versions derived from one base all stay valid.
#[test]
fn version_chain() {
    let mut versions = vec![PMap::new()];
    for i in 0..50 {
        let next = versions[versions.len() - 1].insert(i, i * 2);
        versions.push(next);
    }
    for (n, version) in versions.iter().enumerate() {
        assert_eq!(version.len(), n);
    }
}

/// Readers on other threads see a stable value while new versions are made.
#[test]
fn concurrent_readers() {
    let base: PMap<u64, u64> = (0..1000).map(|i| (i, i)).collect();
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let map = base.clone();
            thread::spawn(move || {
                let local = map.insert(10_000 + t, t);
                (0..1000).all(|i| map.get(&i) == Some(&i)) && local.len() == 1001
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap_or(false));
    }
    assert_eq!(base.len(), 1000);
}
