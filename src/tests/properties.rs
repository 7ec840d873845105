//! Randomized properties of the persistent collections and the checked
//! layer.

use proptest::prelude::*;

use crate::{CheckedError, Invariant, PMap, PSet, PVector, SetClass, Value, ValueKind};

fn naturals() -> SetClass {
    SetClass::builder("Naturals")
        .element_type(ValueKind::Int)
        .invariant(Invariant::require("Negative value", |v| {
            v.as_int().is_some_and(|i| i >= 0)
        }))
        .build()
}

proptest! {
    /// An evolver batch equals the same additions applied one at a time.
    #[test]
    fn evolver_batch_matches_sequential(items in prop::collection::vec(any::<i16>(), 0..2_000)) {
        let mut sequential = PSet::new();
        for &item in &items {
            sequential = sequential.add(item);
        }
        let batched = PSet::new().update(items.iter().copied());
        prop_assert_eq!(&batched, &sequential);
        prop_assert_eq!(batched.adhash(), sequential.adhash());
    }

    /// `len(add(e))` is `len` or `len + 1`, and `e` is always present.
    #[test]
    fn add_semantics(
        base in prop::collection::hash_set(any::<u8>(), 0..100),
        elem in any::<u8>(),
    ) {
        let set: PSet<u8> = base.iter().copied().collect();
        let added = set.add(elem);
        prop_assert!(added.contains(&elem));
        let expected = if base.contains(&elem) { set.len() } else { set.len() + 1 };
        prop_assert_eq!(added.len(), expected);
    }

    /// Writes never change the value they were made from.
    #[test]
    fn writes_preserve_original(
        base in prop::collection::vec((any::<u16>(), any::<u16>()), 0..300),
        writes in prop::collection::vec((any::<u16>(), any::<u16>()), 0..50),
        removals in prop::collection::vec(any::<u16>(), 0..50),
    ) {
        let original: PMap<u16, u16> = base.iter().copied().collect();
        let snapshot: Vec<(u16, u16)> = original.iter().map(|(k, v)| (*k, *v)).collect();

        let mut derived = original.clone();
        for &(k, v) in &writes {
            derived = derived.insert(k, v);
        }
        for k in &removals {
            derived = derived.remove(k);
        }

        let after: Vec<(u16, u16)> = original.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(snapshot, after);
    }

    /// Re-adding any subset of a set through an evolver returns the set.
    #[test]
    fn subset_update_is_identity(
        base in prop::collection::vec(any::<i32>(), 1..300),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..100),
    ) {
        let set: PSet<i32> = base.iter().copied().collect();
        let subset = picks.iter().map(|pick| *pick.get(&base));
        prop_assert!(set.update(subset).ptr_eq(&set));
    }

    /// Map contents match a std reference model.
    #[test]
    fn map_matches_model(ops in prop::collection::vec((any::<bool>(), 0_u8..64, any::<u8>()), 0..400)) {
        let mut model = std::collections::HashMap::new();
        let mut map = PMap::new();
        let mut peak = 0;
        for (insert, k, v) in ops {
            if insert {
                model.insert(k, v);
                map = map.insert(k, v);
            } else {
                model.remove(&k);
                map = map.remove(&k);
            }
            peak = peak.max(map.len());
        }
        prop_assert_eq!(map.len(), model.len());
        for (k, v) in &model {
            prop_assert_eq!(map.get(k), Some(v));
        }
        prop_assert!(map.bucket_count() <= peak.max(8));
    }

    /// A vector keeps its elements in order at any length.
    #[test]
    fn vector_matches_vec(items in prop::collection::vec(any::<u32>(), 0..3_000)) {
        let vector: PVector<u32> = items.iter().copied().collect();
        prop_assert_eq!(vector.len(), items.len());
        prop_assert!(vector.iter().eq(items.iter()));
    }

    /// A checked set accepts exactly the batches with no negative element.
    #[test]
    fn naturals_accept_iff_non_negative(items in prop::collection::vec(-20_i64..100, 0..50)) {
        let result = naturals().create(items.iter().copied().map(Value::from));
        let negatives: std::collections::BTreeSet<i64> =
            items.iter().copied().filter(|i| *i < 0).collect();
        match result {
            Ok(set) => {
                prop_assert!(negatives.is_empty());
                prop_assert!(set.len() <= items.len());
            }
            Err(CheckedError::Invariant(e)) => {
                prop_assert_eq!(e.messages.len(), negatives.len());
            }
            Err(other) => prop_assert!(false, "unexpected error {}", other),
        }
    }
}
