use crate::PMap;

#[test]
fn empty_map() {
    let map: PMap<String, i32> = PMap::new();
    assert_eq!(map.len(), 0);
    assert!(map.is_empty());
    assert_eq!(map.adhash(), 0);
}

#[test]
fn insert_one() {
    let empty = PMap::new();
    let map = empty.insert("hello", 42);
    assert_eq!(map.len(), 1);
    assert!(!map.is_empty());
    assert!(empty.is_empty());
}

#[test]
fn insert_and_get() {
    let map = PMap::new().insert("key", 100);
    assert_eq!(map.get(&"key"), Some(&100));
}

#[test]
fn get_missing_key() {
    let map = PMap::new().insert("a", 1);
    assert_eq!(map.get(&"b"), None);
}

#[test]
fn insert_multiple() {
    let mut map = PMap::new();
    for i in 0..10 {
        map = map.insert(i, i * 10);
    }
    assert_eq!(map.len(), 10);
    for i in 0..10 {
        assert_eq!(map.get(&i), Some(&(i * 10)));
    }
}

#[test]
fn overwrite_value() {
    let map = PMap::new().insert("k", 1);
    let updated = map.insert("k", 2);
    assert_eq!(updated.len(), 1);
    assert_eq!(updated.get(&"k"), Some(&2));
    assert_eq!(map.get(&"k"), Some(&1));
}

#[test]
fn insert_equal_value_shares() {
    let map = PMap::new().insert("k", 1);
    assert!(map.insert("k", 1).ptr_eq(&map));
}

#[test]
fn remove_existing() {
    let map = PMap::new().insert(1, "a").insert(2, "b");
    let removed = map.remove(&1);
    assert_eq!(removed.len(), 1);
    assert!(!removed.contains_key(&1));
    assert!(removed.contains_key(&2));
}

#[test]
fn remove_missing_shares() {
    let map = PMap::new().insert(1, "a");
    assert!(map.remove(&2).ptr_eq(&map));
}

#[test]
fn contains_key() {
    let map = PMap::new().insert(42, "val");
    assert!(map.contains_key(&42));
    assert!(!map.contains_key(&43));
}

#[test]
fn keys_and_values() {
    let map: PMap<i32, i32> = (0..5).map(|i| (i, i * i)).collect();
    let mut keys: Vec<i32> = map.keys().copied().collect();
    keys.sort_unstable();
    assert_eq!(keys, vec![0, 1, 2, 3, 4]);

    let mut values: Vec<i32> = map.values().copied().collect();
    values.sort_unstable();
    assert_eq!(values, vec![0, 1, 4, 9, 16]);
}

#[test]
fn update_later_pairs_win() {
    let map = PMap::new().update([("a", 1), ("b", 2), ("a", 3)]);
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&"a"), Some(&3));
}

#[test]
fn iter_len_matches() {
    let map: PMap<u32, u32> = (0..300).map(|i| (i, i)).collect();
    let iter = map.iter();
    assert_eq!(iter.len(), 300);
    assert_eq!(iter.count(), 300);
}
