use crate::{
    Checked, CheckedError, CheckedType, ClassRegistry, Invariant, MapClass, Pickled, Reduced,
    ReducedArgs, SetClass, Value, ValueKind, VectorClass,
};

fn naturals() -> SetClass {
    SetClass::builder("Naturals")
        .element_type(ValueKind::Int)
        .invariant(Invariant::require("Negative value", |v| {
            v.as_int().is_some_and(|i| i >= 0)
        }))
        .build()
}

fn registry() -> ClassRegistry {
    let mut registry = ClassRegistry::new();
    registry
        .register(naturals())
        .register(VectorClass::builder("Groups").element_type(naturals()).build())
        .register(MapClass::builder("Scores").value_type(ValueKind::Int).build());
    registry
}

/// Reducing a set gives its class name and its elements.
#[test]
fn reduce_names_class_and_items() {
    let set = naturals().create([5].map(Value::from)).unwrap();
    let reduced = set.reduce();
    assert_eq!(reduced.class, "Naturals");
    assert_eq!(reduced.args, ReducedArgs::Items(vec![Value::from(5)]));
}

/// Reconstructing from reduced arguments gives an equal instance.
#[test]
fn reconstruct_round_trips() {
    let registry = registry();
    let set = naturals().create([1, 2, 3].map(Value::from)).unwrap();
    let rebuilt = registry.reconstruct(&set.reduce()).unwrap();
    assert_eq!(rebuilt, Checked::from(set));
    assert_eq!(rebuilt.class_name(), "Naturals");
}

/// Classes declared at runtime round-trip once registered.
#[test]
fn dynamic_subclass_round_trips() {
    let small = naturals()
        .subclass("SmallNaturals")
        .invariant(Invariant::require("Too big", |v| {
            v.as_int().is_some_and(|i| i < 10)
        }))
        .build();
    let mut registry = registry();
    registry.register(small.clone());

    let set = small.create([1, 9].map(Value::from)).unwrap();
    let rebuilt = registry.reconstruct(&set.reduce()).unwrap();
    assert_eq!(rebuilt.class_name(), "SmallNaturals");
    assert_eq!(rebuilt, Checked::from(set));
}

/// An unregistered class name cannot be reconstructed.
#[test]
fn unknown_class() {
    let reduced = Reduced {
        class: "Missing".to_owned(),
        args: ReducedArgs::Items(Vec::new()),
    };
    assert_eq!(
        registry().reconstruct(&reduced),
        Err(CheckedError::UnknownClass("Missing".to_owned()))
    );
}

/// Items cannot rebuild a map class.
#[test]
fn argument_kind_mismatch() {
    let reduced = Reduced {
        class: "Scores".to_owned(),
        args: ReducedArgs::Items(vec![Value::from(1)]),
    };
    assert_eq!(
        registry().reconstruct(&reduced),
        Err(CheckedError::ArgumentKind {
            class: "Scores".to_owned(),
            found: "items",
        })
    );
}

/// Reconstruction validates like any other construction.
#[test]
fn reconstruct_validates() {
    let reduced = Reduced {
        class: "Naturals".to_owned(),
        args: ReducedArgs::Items(vec![Value::from(-4)]),
    };
    assert!(matches!(
        registry().reconstruct(&reduced),
        Err(CheckedError::Invariant(_))
    ));
}

/// Nested values survive a trip through JSON.
#[test]
fn pickled_json_round_trip() {
    let registry = registry();
    let Some(crate::AnyClass::Vector(groups)) = registry.get("Groups").cloned() else {
        panic!("Groups is registered");
    };
    let Some(crate::AnyClass::Map(scores)) = registry.get("Scores").cloned() else {
        panic!("Scores is registered");
    };

    let value = Value::List(vec![
        Value::from(groups.create([Value::list([1, 2]), Value::list([3])]).unwrap()),
        Value::from(scores.create([(Value::from("a"), Value::from(1))]).unwrap()),
        Value::dict([(Value::None, Value::from(1.5))]),
        Value::from(true),
    ]);

    let json = serde_json::to_string(&Pickled::dump(&value)).unwrap();
    let pickled: Pickled = serde_json::from_str(&json).unwrap();
    assert_eq!(registry.load(&pickled).unwrap(), value);
}

/// Loading a nested object of an unknown class fails.
#[test]
fn load_unknown_class_fails() {
    let pickled = Pickled::Object {
        class: "Nope".to_owned(),
        args: crate::pickle::PickledArgs::Items(Vec::new()),
    };
    assert!(matches!(
        ClassRegistry::new().load(&pickled),
        Err(CheckedError::UnknownClass(_))
    ));
}
