//! Checked collections: persistent sets, vectors and maps whose classes
//! declare accepted element types, invariants and a serializer.
//!
//! A class is an immutable schema built once with a builder and shared by
//! every instance. Every write funnels through a checked evolver, which
//! type-checks each element as it arrives and runs the invariants over the
//! elements that actually entered the collection before committing. A
//! rejected write leaves every existing instance as it was.
//!
//! ```
//! use checked_collections::{CheckedError, Invariant, SetClass, Value, ValueKind};
//!
//! let naturals = SetClass::builder("Naturals")
//!     .element_type(ValueKind::Int)
//!     .invariant(Invariant::require("Negative value", |v| {
//!         v.as_int().is_some_and(|i| i >= 0)
//!     }))
//!     .build();
//!
//! let set = naturals.create([1, 2, 3, 3].map(Value::from)).unwrap();
//! assert_eq!(set.len(), 3);
//! assert!(matches!(
//!     naturals.create([1, -1].map(Value::from)),
//!     Err(CheckedError::Invariant(_))
//! ));
//! ```

mod map;
mod schema;
mod set;
mod vector;

use std::fmt;

pub use map::{CheckedMap, CheckedMapEvolver, MapClass};
pub use schema::{
    ClassBuilder, ElementSchema, ElementType, Invariant, MapClassBuilder, MapSchema,
    PairInvariant, PairSerializer, Serializer, TypeSpec,
};
pub use set::{CheckedSet, CheckedSetEvolver, SetClass};
pub use vector::{CheckedVector, CheckedVectorEvolver, VectorClass};

use crate::error::Result;
use crate::pickle::Reduced;
use crate::value::Value;

/// Capability shared by every checked instance.
pub trait CheckedType {
    /// Returns the name of the instance's class.
    fn class_name(&self) -> &str;

    /// Converts the instance to the plain collection of the same shape,
    /// serializing each element with the class serializer or the default
    /// rule.
    fn serialize(&self, format: Option<&str>) -> Value;

    /// Returns the class name and constructor arguments that rebuild an
    /// equal instance.
    fn reduce(&self) -> Reduced;
}

/// Default element serialization: checked instances recurse with the same
/// format, anything else is used unchanged.
#[must_use]
pub fn serialize_value(value: &Value, format: Option<&str>) -> Value {
    match value {
        Value::Checked(checked) => checked.serialize(format),
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Instances
// ---------------------------------------------------------------------------

/// Any checked instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Checked {
    /// A checked set.
    Set(CheckedSet),
    /// A checked vector.
    Vector(CheckedVector),
    /// A checked map.
    Map(CheckedMap),
}

impl Checked {
    /// Returns the instance's class.
    #[must_use]
    pub fn class(&self) -> AnyClass {
        match self {
            Self::Set(s) => AnyClass::Set(s.class().clone()),
            Self::Vector(v) => AnyClass::Vector(v.class().clone()),
            Self::Map(m) => AnyClass::Map(m.class().clone()),
        }
    }

    /// Returns the number of elements or entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Set(s) => s.len(),
            Self::Vector(v) => v.len(),
            Self::Map(m) => m.len(),
        }
    }

    /// Returns `true` if the instance is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if both are the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Set(a), Self::Set(b)) => a.ptr_eq(b),
            (Self::Vector(a), Self::Vector(b)) => a.ptr_eq(b),
            (Self::Map(a), Self::Map(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl CheckedType for Checked {
    fn class_name(&self) -> &str {
        match self {
            Self::Set(s) => s.class_name(),
            Self::Vector(v) => v.class_name(),
            Self::Map(m) => m.class_name(),
        }
    }

    fn serialize(&self, format: Option<&str>) -> Value {
        match self {
            Self::Set(s) => s.serialize(format),
            Self::Vector(v) => v.serialize(format),
            Self::Map(m) => m.serialize(format),
        }
    }

    fn reduce(&self) -> Reduced {
        match self {
            Self::Set(s) => s.reduce(),
            Self::Vector(v) => v.reduce(),
            Self::Map(m) => m.reduce(),
        }
    }
}

impl fmt::Display for Checked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set(s) => fmt::Display::fmt(s, f),
            Self::Vector(v) => fmt::Display::fmt(v, f),
            Self::Map(m) => fmt::Display::fmt(m, f),
        }
    }
}

impl From<CheckedSet> for Checked {
    fn from(s: CheckedSet) -> Self {
        Self::Set(s)
    }
}

impl From<CheckedVector> for Checked {
    fn from(v: CheckedVector) -> Self {
        Self::Vector(v)
    }
}

impl From<CheckedMap> for Checked {
    fn from(m: CheckedMap) -> Self {
        Self::Map(m)
    }
}

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

/// Any checked class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnyClass {
    /// A checked set class.
    Set(SetClass),
    /// A checked vector class.
    Vector(VectorClass),
    /// A checked map class.
    Map(MapClass),
}

impl AnyClass {
    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Set(c) => c.name(),
            Self::Vector(c) => c.name(),
            Self::Map(c) => c.name(),
        }
    }

    /// Returns `true` if `value` is an instance of this class or of a
    /// subclass.
    #[must_use]
    pub fn is_instance(&self, value: &Value) -> bool {
        match self {
            Self::Set(c) => c.is_instance(value),
            Self::Vector(c) => c.is_instance(value),
            Self::Map(c) => c.is_instance(value),
        }
    }

    /// Builds an instance from any collection of matching shape, coercing
    /// nested plain collections.
    ///
    /// # Errors
    ///
    /// Fails like the class's `create_from`.
    pub fn create_from(&self, source: &Value) -> Result<Checked> {
        match self {
            Self::Set(c) => c.create_from(source).map(Checked::Set),
            Self::Vector(c) => c.create_from(source).map(Checked::Vector),
            Self::Map(c) => c.create_from(source).map(Checked::Map),
        }
    }
}

impl From<SetClass> for AnyClass {
    fn from(class: SetClass) -> Self {
        Self::Set(class)
    }
}

impl From<VectorClass> for AnyClass {
    fn from(class: VectorClass) -> Self {
        Self::Vector(class)
    }
}

impl From<MapClass> for AnyClass {
    fn from(class: MapClass) -> Self {
        Self::Map(class)
    }
}
