use std::collections::HashSet;

use crate::{
    CheckedError, CheckedType, Invariant, MapClass, PairInvariant, SetClass, TypeSpec, Value,
    ValueKind, VectorClass,
};

fn naturals() -> SetClass {
    SetClass::builder("Naturals")
        .element_type(ValueKind::Int)
        .invariant(Invariant::require("Negative value", |v| {
            v.as_int().is_some_and(|i| i >= 0)
        }))
        .build()
}

fn ints(items: &[i64]) -> Vec<Value> {
    items.iter().copied().map(Value::from).collect()
}

fn invariant_messages<T>(result: Result<T, CheckedError>) -> Vec<String> {
    match result {
        Err(CheckedError::Invariant(e)) => e.messages,
        Err(other) => panic!("expected an invariant error, got {other}"),
        Ok(_) => panic!("expected an invariant error, got a value"),
    }
}

// ---------------------------------------------------------------------------
// Sets
// ---------------------------------------------------------------------------

/// `[1, -1]` fails with exactly one message.
#[test]
fn negative_element_rejected() {
    let messages = invariant_messages(naturals().create(ints(&[1, -1])));
    assert_eq!(messages, vec!["Negative value".to_owned()]);
}

/// `[1, 2.0]` fails the type check.
#[test]
fn float_element_rejected() {
    let err = match naturals().create([Value::from(1), Value::from(2.0)]) {
        Err(CheckedError::ValueType(err)) => err,
        other => panic!("expected a type error, got {other:?}"),
    };
    assert_eq!(err.class, "Naturals");
    assert_eq!(err.value, Value::Float(2.0));
    assert_eq!(err.actual, ValueKind::Float);
    assert_eq!(err.expected, vec!["int".to_owned()]);
}

/// `[1, 2, 3, 3]` holds three elements and serializes to `{1, 2, 3}`.
#[test]
fn duplicates_collapse() {
    let set = naturals().create(ints(&[1, 2, 3, 3])).unwrap();
    assert_eq!(set.len(), 3);
    assert_eq!(set.serialize(None), Value::set([1, 2, 3]));
}

/// Types are checked before any invariant runs.
#[test]
fn type_check_precedes_invariants() {
    let result = naturals().create([Value::from(-1), Value::from("x")]);
    assert!(matches!(result, Err(CheckedError::ValueType(_))));
}

/// Every invariant runs on every new element; failures come in element
/// order, then declaration order.
#[test]
fn all_failures_collected() {
    let evens = naturals()
        .subclass("EvenNaturals")
        .invariant(Invariant::require("Odd value", |v| {
            v.as_int().is_some_and(|i| i % 2 == 0)
        }))
        .build();

    let messages = invariant_messages(evens.construct(ints(&[2, -1, 3])));
    assert_eq!(messages, vec!["Negative value", "Odd value", "Odd value"]);
}

/// A custom invariant reports its own message.
#[test]
fn custom_invariant_message() {
    let bounded = SetClass::builder("Bounded")
        .invariant(Invariant::new(|v| match v.as_int() {
            Some(i) if i > 100 => Err(format!("{i} is above 100")),
            _ => Ok(()),
        }))
        .build();
    let messages = invariant_messages(bounded.construct(ints(&[5, 101])));
    assert_eq!(messages, vec!["101 is above 100"]);
}

/// A rejected add leaves the original instance as it was.
#[test]
fn rejected_add_is_atomic() {
    let set = naturals().create(ints(&[1, 2])).unwrap();
    assert!(set.add(Value::from(-5)).is_err());
    assert!(set.update(ints(&[3, -3])).is_err());
    assert_eq!(set.len(), 2);
    assert!(!set.contains(&Value::from(3)));
}

/// `add` and `discard` return new instances and leave the original alone.
#[test]
fn add_and_discard() {
    let set = naturals().create(ints(&[1])).unwrap();
    let bigger = set.add(Value::from(2)).unwrap();
    assert_eq!(bigger.len(), 2);
    assert_eq!(set.len(), 1);

    let smaller = bigger.discard(&Value::from(1));
    assert_eq!(smaller, naturals().create(ints(&[2])).unwrap());
    assert!(smaller.discard(&Value::from(9)).ptr_eq(&smaller));
}

/// Adding present elements returns the same instance.
#[test]
fn add_present_returns_self() {
    let set = naturals().create(ints(&[1, 2, 3])).unwrap();
    assert!(set.add(Value::from(2)).unwrap().ptr_eq(&set));
    assert!(set.update(ints(&[3, 1, 1])).unwrap().ptr_eq(&set));
}

/// A batch with no net change commits to the origin instance.
#[test]
fn evolver_identity() {
    let set = naturals().create(ints(&[1, 2, 3])).unwrap();
    assert!(set.evolver().persistent().unwrap().ptr_eq(&set));

    let mut evolver = set.evolver();
    evolver.update(ints(&[1, 2])).unwrap();
    assert!(evolver.persistent().unwrap().ptr_eq(&set));
}

/// The evolver rejects a wrong type at once and keeps its contents.
#[test]
fn evolver_type_error_is_immediate() {
    let set = naturals().empty();
    let mut evolver = set.evolver();
    evolver.add(Value::from(1)).unwrap();
    assert!(matches!(
        evolver.add(Value::from("one")),
        Err(CheckedError::ValueType(_))
    ));
    assert_eq!(evolver.len(), 1);
    assert_eq!(evolver.persistent().unwrap().len(), 1);
}

/// A failed commit can be repaired and retried.
#[test]
fn evolver_recovers_after_invariant_error() {
    let set = naturals().create(ints(&[1])).unwrap();
    let mut evolver = set.evolver();
    evolver.add(Value::from(-1)).unwrap();
    assert!(evolver.persistent().is_err());
    assert_eq!(set.len(), 1);

    evolver.discard(&Value::from(-1));
    assert!(evolver.persistent().unwrap().ptr_eq(&set));
}

/// `Display` wraps the elements in the class name.
#[test]
fn display_uses_class_name() {
    let one = naturals().create(ints(&[1])).unwrap();
    assert_eq!(one.to_string(), "Naturals([1])");

    let set = naturals().create(ints(&[1, 2, 3])).unwrap();
    let listed: Vec<String> = set.iter().map(ToString::to_string).collect();
    assert_eq!(set.to_string(), format!("Naturals([{}])", listed.join(", ")));
    assert_eq!(naturals().empty().to_string(), "Naturals([])");
}

/// Instances with the same contents are equal and hash alike.
#[test]
fn equality_by_contents() {
    let a = naturals().create(ints(&[1, 2])).unwrap();
    let b = naturals().create(ints(&[2, 1])).unwrap();
    assert_eq!(a, b);

    let mut seen = HashSet::new();
    seen.insert(Value::from(a));
    assert!(!seen.insert(Value::from(b)));
}

/// A subclass instance equals a parent instance with the same elements;
/// the class stays visible through `class()` and `is_instance`.
#[test]
fn equality_ignores_class() {
    let string_naturals = naturals().subclass("StringNaturals").build();
    let parent = naturals().create(ints(&[1, 2])).unwrap();
    let child = string_naturals.create(ints(&[1, 2])).unwrap();
    assert_eq!(parent, child);
    assert_eq!(Value::from(parent.clone()), Value::from(child.clone()));

    assert_ne!(parent.class(), child.class());
    assert!(!string_naturals.is_instance(&Value::from(parent)));
    assert!(naturals().is_instance(&Value::from(child)));

    let other = SetClass::builder("Other").build();
    let c = other.create(ints(&[1, 2])).unwrap();
    let d = other.create(ints(&[1, 3])).unwrap();
    assert_eq!(Value::from(c), Value::from(naturals().create(ints(&[1, 2])).unwrap()));
    assert_ne!(Value::from(d), Value::from(naturals().create(ints(&[1, 2])).unwrap()));
}

/// A checked instance equals the plain persistent collection of its kind
/// with the same contents, and hashes the same.
#[test]
fn equality_with_persistent_collections() {
    let set = naturals().create(ints(&[1, 2])).unwrap();
    let plain = Value::PSet(ints(&[1, 2]).into_iter().collect());
    assert_eq!(Value::from(set.clone()), plain);
    assert_eq!(plain, Value::from(set.clone()));
    assert_ne!(Value::from(set.clone()), Value::PSet(ints(&[1]).into_iter().collect()));
    assert_ne!(Value::from(set.clone()), Value::PVector(ints(&[1, 2]).into_iter().collect()));

    let mut seen = HashSet::new();
    seen.insert(plain);
    assert!(!seen.insert(Value::from(set)));

    let vector = VectorClass::builder("Ints")
        .element_type(ValueKind::Int)
        .build()
        .create(ints(&[3, 4]))
        .unwrap();
    assert_eq!(
        Value::from(vector),
        Value::PVector(ints(&[3, 4]).into_iter().collect())
    );

    let map = MapClass::builder("Scores")
        .build()
        .create([(Value::from("a"), Value::from(1))])
        .unwrap();
    assert_eq!(
        Value::from(map),
        Value::PMap([(Value::from("a"), Value::from(1))].into_iter().collect())
    );
}

/// A class without declared types accepts any element.
#[test]
fn unconstrained_class_accepts_anything() {
    let anything = SetClass::builder("Anything").build();
    assert!(anything.schema().element().is_any());
    let set = anything
        .create([Value::None, Value::from("a"), Value::from(1.5)])
        .unwrap();
    assert_eq!(set.len(), 3);
}

/// A multi-type class accepts each type and names them all on rejection.
#[test]
fn one_of_several_types() {
    let numbers = SetClass::builder("Numbers")
        .element_types(TypeSpec::one_of([ValueKind::Int, ValueKind::Float]))
        .build();
    assert!(numbers.create([Value::from(1), Value::from(2.5)]).is_ok());

    let err = numbers.create([Value::from("x")]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Numbers: \"x\" has type str, expected one of [int, float]"
    );
}

// ---------------------------------------------------------------------------
// Subclasses & nesting
// ---------------------------------------------------------------------------

/// A subclass inherits types and invariants and adds its own.
#[test]
fn subclass_inherits() {
    let small = naturals()
        .subclass("SmallNaturals")
        .invariant(Invariant::require("Too big", |v| {
            v.as_int().is_some_and(|i| i < 10)
        }))
        .build();

    assert_eq!(invariant_messages(small.create(ints(&[11]))), vec!["Too big"]);
    assert_eq!(
        invariant_messages(small.create(ints(&[-1]))),
        vec!["Negative value"]
    );
    assert!(matches!(
        small.create([Value::from(0.5)]),
        Err(CheckedError::ValueType(_))
    ));

    let instance = Value::from(small.create(ints(&[1])).unwrap());
    assert!(small.is_instance(&instance));
    assert!(naturals().is_instance(&instance));
    assert!(!naturals().subclass("Sibling").build().is_instance(&instance));
}

/// Declaring types on a subclass replaces the inherited ones.
#[test]
fn subclass_types_override() {
    let ints_only = SetClass::builder("Ints").element_type(ValueKind::Int).build();
    let texts = ints_only
        .subclass("Texts")
        .element_type(ValueKind::Str)
        .element_type(ValueKind::Bool)
        .build();

    assert!(texts.create([Value::from("a"), Value::from(true)]).is_ok());
    assert!(matches!(
        texts.create([Value::from(1)]),
        Err(CheckedError::ValueType(_))
    ));
    assert!(ints_only.create([Value::from(1)]).is_ok());

    let scores = MapClass::builder("Scores")
        .key_type(ValueKind::Str)
        .value_type(ValueKind::Int)
        .build();
    let ratios = scores.subclass("Ratios").value_type(ValueKind::Float).build();
    assert!(ratios.create([(Value::from("a"), Value::from(0.5))]).is_ok());
    assert!(matches!(
        ratios.create([(Value::from("a"), Value::from(1))]),
        Err(CheckedError::ValueType(_))
    ));
    assert!(matches!(
        ratios.create([(Value::from(1), Value::from(0.5))]),
        Err(CheckedError::ValueType(_))
    ));
}

/// `create` turns plain collections into the declared element class.
#[test]
fn nested_classes_coerce() {
    let groups = VectorClass::builder("Groups")
        .element_type(naturals())
        .build();

    let vector = groups
        .create([Value::list([1, 2]), Value::list([3, 3])])
        .unwrap();
    assert_eq!(vector.len(), 2);
    let first = vector.get(0).and_then(Value::as_checked).unwrap();
    assert_eq!(first.class_name(), "Naturals");
    assert_eq!(first.len(), 2);

    assert!(matches!(
        groups.create([Value::list([1, -2])]),
        Err(CheckedError::Invariant(_))
    ));
    assert!(matches!(
        groups.create([Value::from(7)]),
        Err(CheckedError::ValueType(_))
    ));
    assert!(matches!(
        groups.construct([Value::list([1])]),
        Err(CheckedError::ValueType(_))
    ));
}

/// Instances already of the class are passed through by `create_from`.
#[test]
fn create_from_instance_is_identity() {
    let set = naturals().create(ints(&[4])).unwrap();
    let again = naturals().create_from(&Value::from(set.clone())).unwrap();
    assert!(again.ptr_eq(&set));

    assert!(matches!(
        naturals().create_from(&Value::from(4)),
        Err(CheckedError::ValueType(_))
    ));
}

// ---------------------------------------------------------------------------
// Vectors
// ---------------------------------------------------------------------------

fn names() -> VectorClass {
    VectorClass::builder("Names")
        .element_type(ValueKind::Str)
        .invariant(Invariant::require("Empty name", |v| {
            v.as_str().is_some_and(|s| !s.is_empty())
        }))
        .build()
}

/// `append` and `set` on a checked vector return new instances.
#[test]
fn vector_append_and_set() {
    let vector = names().create(["ann", "bob"].map(Value::from)).unwrap();
    let longer = vector.append(Value::from("cy")).unwrap();
    assert_eq!(longer.len(), 3);
    assert_eq!(longer.get(2), Some(&Value::from("cy")));

    let renamed = longer.set(0, Value::from("al")).unwrap();
    assert_eq!(renamed.get(0), Some(&Value::from("al")));
    assert_eq!(longer.get(0), Some(&Value::from("ann")));

    assert_eq!(renamed.to_string(), r#"Names(["al", "bob", "cy"])"#);
}

/// Wrong types, failing invariants and bad indices leave the vector as it was.
#[test]
fn vector_rejections() {
    let vector = names().create(["ann"].map(Value::from)).unwrap();
    assert!(matches!(
        vector.append(Value::from(1)),
        Err(CheckedError::ValueType(_))
    ));
    assert_eq!(invariant_messages(vector.set(0, Value::from(""))), vec!["Empty name"]);
    assert!(matches!(
        vector.set(5, Value::from("x")),
        Err(CheckedError::Index(e)) if e.index == 5 && e.len == 1
    ));
    assert_eq!(vector.len(), 1);
}

/// Setting an element to its current value keeps the instance.
#[test]
fn vector_equal_set_is_identity() {
    let vector = names().create(["ann", "bob"].map(Value::from)).unwrap();
    assert!(vector.set(1, Value::from("bob")).unwrap().ptr_eq(&vector));
    assert!(vector.extend([]).unwrap().ptr_eq(&vector));
}

/// Only written positions are re-validated, in index order.
#[test]
fn vector_failures_in_index_order() {
    let vector = names().create(["a", "b", "c"].map(Value::from)).unwrap();
    let mut evolver = vector.evolver();
    evolver.set(2, Value::from("")).unwrap();
    evolver.set(0, Value::from("")).unwrap();
    evolver.append(Value::from("")).unwrap();
    assert_eq!(
        invariant_messages(evolver.persistent()),
        vec!["Empty name", "Empty name", "Empty name"]
    );
}

// ---------------------------------------------------------------------------
// Maps
// ---------------------------------------------------------------------------

fn ages() -> MapClass {
    MapClass::builder("Ages")
        .key_type(ValueKind::Str)
        .value_type(ValueKind::Int)
        .invariant(PairInvariant::require("Negative age", |_, age| {
            age.as_int().is_some_and(|i| i >= 0)
        }))
        .build()
}

/// `set` and `remove` on a checked map return new instances.
#[test]
fn map_set_and_remove() {
    let map = ages()
        .create([(Value::from("ann"), Value::from(31))])
        .unwrap();
    let more = map.set(Value::from("bob"), Value::from(40)).unwrap();
    assert_eq!(more.len(), 2);
    assert_eq!(more.get(&Value::from("bob")), Some(&Value::from(40)));

    let fewer = more.remove(&Value::from("ann"));
    assert_eq!(fewer.len(), 1);
    assert!(!fewer.contains_key(&Value::from("ann")));
    assert!(fewer.remove(&Value::from("zed")).ptr_eq(&fewer));
    assert_eq!(map.to_string(), r#"Ages({"ann": 31})"#);
}

/// Keys and values are type-checked separately and invariants see both.
#[test]
fn map_rejections() {
    let map = ages().empty();
    assert!(matches!(
        map.set(Value::from(1), Value::from(1)),
        Err(CheckedError::ValueType(e)) if e.actual == ValueKind::Int
    ));
    assert!(matches!(
        map.set(Value::from("a"), Value::from("old")),
        Err(CheckedError::ValueType(e)) if e.actual == ValueKind::Str
    ));
    assert_eq!(
        invariant_messages(map.update([
            (Value::from("a"), Value::from(-1)),
            (Value::from("b"), Value::from(2)),
        ])),
        vec!["Negative age"]
    );
    assert!(map.is_empty());
}

/// Overwriting a bad value before commit clears the failure.
#[test]
fn map_overwrite_within_batch() {
    let map = ages().empty();
    let mut evolver = map.evolver();
    evolver
        .set(Value::from("a"), Value::from(-1))
        .unwrap()
        .set(Value::from("a"), Value::from(1))
        .unwrap();
    let committed = evolver.persistent().unwrap();
    assert_eq!(committed.get(&Value::from("a")), Some(&Value::from(1)));
}

/// `create_from` accepts a dict and rejects a list.
#[test]
fn map_create_from_dict() {
    let dict = Value::dict([("x", 1), ("y", 2)]);
    let map = ages().create_from(&dict).unwrap();
    assert_eq!(map.len(), 2);
    assert!(matches!(
        ages().create_from(&Value::list([1])),
        Err(CheckedError::ValueType(_))
    ));
}
