use std::sync::{Arc, Weak};

use crate::{PSet, SetClass, Value};

/// Checked instances can be held through weak handles.
#[test]
fn checked_instance_weak_handle() {
    let set = Arc::new(
        SetClass::builder("Anything")
            .build()
            .create([Value::from(1)])
            .unwrap(),
    );
    let weak: Weak<_> = Arc::downgrade(&set);
    assert_eq!(weak.upgrade().map(|s| s.len()), Some(1));

    drop(set);
    assert!(weak.upgrade().is_none());
}

/// A weak handle to a persistent set dies with its last strong owner.
#[test]
fn persistent_set_weak_handle() {
    let set = Arc::new(PSet::new().add(1));
    let weak = Arc::downgrade(&set);
    let derived = set.add(2);
    assert!(weak.upgrade().is_some_and(|s| s.contains(&1)));

    drop(set);
    assert!(weak.upgrade().is_none());
    assert_eq!(derived.len(), 2);
}
