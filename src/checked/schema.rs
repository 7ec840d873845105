//! Class schemas: accepted element types, invariants and serializers.
//!
//! A schema is an immutable value built once per class and shared by every
//! instance of that class.

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::sync::Arc;

use tracing::debug;

use crate::checked::{AnyClass, MapClass, SetClass, VectorClass};
use crate::error::{Result, ValueTypeError};
use crate::value::{Value, ValueKind};

// ---------------------------------------------------------------------------
// Element types
// ---------------------------------------------------------------------------

/// One accepted element type.
#[derive(Debug, Clone)]
pub enum ElementType {
    /// Any value of this runtime type. Checked instances satisfy the kind
    /// of their persistent collection.
    Kind(ValueKind),
    /// Instances of this checked class or its subclasses.
    Class(AnyClass),
}

impl ElementType {
    /// Returns `true` if `value` is of this type.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Kind(kind) => value.kind() == *kind,
            Self::Class(class) => class.is_instance(value),
        }
    }

    /// Returns the type name used in messages.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Kind(kind) => kind.name().to_owned(),
            Self::Class(class) => class.name().to_owned(),
        }
    }
}

impl From<ValueKind> for ElementType {
    fn from(kind: ValueKind) -> Self {
        Self::Kind(kind)
    }
}

impl From<AnyClass> for ElementType {
    fn from(class: AnyClass) -> Self {
        Self::Class(class)
    }
}

impl From<SetClass> for ElementType {
    fn from(class: SetClass) -> Self {
        Self::Class(AnyClass::Set(class))
    }
}

impl From<VectorClass> for ElementType {
    fn from(class: VectorClass) -> Self {
        Self::Class(AnyClass::Vector(class))
    }
}

impl From<MapClass> for ElementType {
    fn from(class: MapClass) -> Self {
        Self::Class(AnyClass::Map(class))
    }
}

/// The set of types an element may have. Empty accepts anything.
#[derive(Debug, Clone, Default)]
pub struct TypeSpec {
    types: Vec<ElementType>,
}

impl TypeSpec {
    /// Accepts every value.
    #[must_use]
    pub const fn any() -> Self {
        Self { types: Vec::new() }
    }

    /// Accepts exactly one type.
    #[must_use]
    pub fn of(ty: impl Into<ElementType>) -> Self {
        Self {
            types: vec![ty.into()],
        }
    }

    /// Accepts any of the given types.
    #[must_use]
    pub fn one_of<I, T>(types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ElementType>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if no constraint is declared.
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.types.is_empty()
    }

    /// Returns the declared types.
    #[must_use]
    pub fn types(&self) -> &[ElementType] {
        &self.types
    }

    /// Returns `true` if `value` satisfies the constraint.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        self.is_any() || self.types.iter().any(|ty| ty.accepts(value))
    }

    /// Returns the names of the accepted types.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.types.iter().map(ElementType::name).collect()
    }

    fn push(&mut self, ty: ElementType) {
        self.types.push(ty);
    }

    fn checked_class(&self) -> Option<&AnyClass> {
        self.types.iter().find_map(|ty| match ty {
            ElementType::Class(class) => Some(class),
            ElementType::Kind(_) => None,
        })
    }

    /// Checks `value` on behalf of the class named `class`.
    pub(crate) fn check(&self, class: &str, value: &Value) -> Result<(), ValueTypeError> {
        if self.accepts(value) {
            return Ok(());
        }
        debug!(class, value = %value, "rejected element type");
        Err(ValueTypeError {
            class: class.to_owned(),
            value: value.clone(),
            actual: value.kind(),
            expected: self.names(),
        })
    }

    /// Turns a plain collection into an instance of the first declared
    /// checked class, if the value is not already acceptable.
    ///
    /// Values that are neither acceptable nor collections pass through
    /// unchanged and fail the type check later.
    pub(crate) fn coerce(&self, value: Value) -> Result<Value> {
        if self.accepts(&value) {
            return Ok(value);
        }
        match self.checked_class() {
            Some(class) if value.elements().is_some() || value.pairs().is_some() => {
                class.create_from(&value).map(Value::Checked)
            }
            _ => Ok(value),
        }
    }
}

// ---------------------------------------------------------------------------
// Invariants & serializers
// ---------------------------------------------------------------------------

type ElementCheck = dyn Fn(&Value) -> Result<(), String> + Send + Sync;
type PairCheck = dyn Fn(&Value, &Value) -> Result<(), String> + Send + Sync;
type ElementSerialize = dyn Fn(Option<&str>, &Value) -> Value + Send + Sync;
type PairSerialize = dyn Fn(Option<&str>, &Value, &Value) -> (Value, Value) + Send + Sync;

/// Predicate every element of a set or vector must satisfy.
#[derive(Clone)]
pub struct Invariant(Arc<ElementCheck>);

impl Invariant {
    /// Wraps a check returning the failure message on error.
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    /// Fails with `message` whenever `predicate` returns `false`.
    pub fn require<F>(message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let message = message.into();
        Self::new(move |value| {
            if predicate(value) {
                Ok(())
            } else {
                Err(message.clone())
            }
        })
    }

    /// Runs the check.
    ///
    /// # Errors
    ///
    /// Returns the failure message if `value` violates the invariant.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        (self.0)(value)
    }
}

impl fmt::Debug for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invariant").finish_non_exhaustive()
    }
}

/// Predicate every `(key, value)` pair of a map must satisfy.
#[derive(Clone)]
pub struct PairInvariant(Arc<PairCheck>);

impl PairInvariant {
    /// Wraps a check returning the failure message on error.
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<(), String> + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    /// Fails with `message` whenever `predicate` returns `false`.
    pub fn require<F>(message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        let message = message.into();
        Self::new(move |key, value| {
            if predicate(key, value) {
                Ok(())
            } else {
                Err(message.clone())
            }
        })
    }

    /// Runs the check.
    ///
    /// # Errors
    ///
    /// Returns the failure message if the pair violates the invariant.
    pub fn check(&self, key: &Value, value: &Value) -> Result<(), String> {
        (self.0)(key, value)
    }
}

impl fmt::Debug for PairInvariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairInvariant").finish_non_exhaustive()
    }
}

/// Replaces the default per-element serialization of a set or vector.
#[derive(Clone)]
pub struct Serializer(Arc<ElementSerialize>);

impl Serializer {
    /// Wraps a `(format, element) -> serialized` function.
    pub fn new<F>(serialize: F) -> Self
    where
        F: Fn(Option<&str>, &Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(serialize))
    }

    /// Serializes one element.
    #[must_use]
    pub fn call(&self, format: Option<&str>, value: &Value) -> Value {
        (self.0)(format, value)
    }
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer").finish_non_exhaustive()
    }
}

/// Replaces the default per-entry serialization of a map.
#[derive(Clone)]
pub struct PairSerializer(Arc<PairSerialize>);

impl PairSerializer {
    /// Wraps a `(format, key, value) -> (key, value)` function.
    pub fn new<F>(serialize: F) -> Self
    where
        F: Fn(Option<&str>, &Value, &Value) -> (Value, Value) + Send + Sync + 'static,
    {
        Self(Arc::new(serialize))
    }

    /// Serializes one entry.
    #[must_use]
    pub fn call(&self, format: Option<&str>, key: &Value, value: &Value) -> (Value, Value) {
        (self.0)(format, key, value)
    }
}

impl fmt::Debug for PairSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairSerializer").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

/// Schema of a checked set or vector class.
#[derive(Debug, Clone)]
pub struct ElementSchema {
    name: String,
    ancestors: Vec<String>,
    element: TypeSpec,
    invariants: Vec<Invariant>,
    serializer: Option<Serializer>,
}

impl ElementSchema {
    fn named(name: String) -> Self {
        Self {
            name,
            ancestors: Vec::new(),
            element: TypeSpec::any(),
            invariants: Vec::new(),
            serializer: None,
        }
    }

    fn derived(&self, name: String) -> Self {
        let mut schema = self.clone();
        schema.ancestors.push(std::mem::replace(&mut schema.name, name));
        schema
    }

    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if this schema is `name` or was derived from it.
    #[must_use]
    pub fn is_a(&self, name: &str) -> bool {
        self.name == name || self.ancestors.iter().any(|a| a == name)
    }

    /// Returns the accepted element types.
    #[must_use]
    pub const fn element(&self) -> &TypeSpec {
        &self.element
    }

    /// Returns the declared invariants, in declaration order.
    #[must_use]
    pub fn invariants(&self) -> &[Invariant] {
        &self.invariants
    }

    /// Returns the custom serializer, if any.
    #[must_use]
    pub const fn serializer(&self) -> Option<&Serializer> {
        self.serializer.as_ref()
    }

    /// Serializes one element: the custom serializer if declared, the
    /// default rule otherwise.
    pub(crate) fn serialize_element(&self, format: Option<&str>, value: &Value) -> Value {
        match &self.serializer {
            Some(serializer) => serializer.call(format, value),
            None => super::serialize_value(value, format),
        }
    }

    /// Runs every invariant on every value, collecting all failures.
    pub(crate) fn invariant_failures<'a, I>(&self, values: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        values
            .into_iter()
            .flat_map(|value| self.invariants.iter().map(move |inv| inv.check(value)))
            .filter_map(Result::err)
            .collect()
    }
}

/// Schema of a checked map class.
#[derive(Debug, Clone)]
pub struct MapSchema {
    name: String,
    ancestors: Vec<String>,
    key: TypeSpec,
    value: TypeSpec,
    invariants: Vec<PairInvariant>,
    serializer: Option<PairSerializer>,
}

impl MapSchema {
    fn named(name: String) -> Self {
        Self {
            name,
            ancestors: Vec::new(),
            key: TypeSpec::any(),
            value: TypeSpec::any(),
            invariants: Vec::new(),
            serializer: None,
        }
    }

    fn derived(&self, name: String) -> Self {
        let mut schema = self.clone();
        schema.ancestors.push(std::mem::replace(&mut schema.name, name));
        schema
    }

    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if this schema is `name` or was derived from it.
    #[must_use]
    pub fn is_a(&self, name: &str) -> bool {
        self.name == name || self.ancestors.iter().any(|a| a == name)
    }

    /// Returns the accepted key types.
    #[must_use]
    pub const fn key(&self) -> &TypeSpec {
        &self.key
    }

    /// Returns the accepted value types.
    #[must_use]
    pub const fn value(&self) -> &TypeSpec {
        &self.value
    }

    /// Returns the declared invariants, in declaration order.
    #[must_use]
    pub fn invariants(&self) -> &[PairInvariant] {
        &self.invariants
    }

    /// Returns the custom serializer, if any.
    #[must_use]
    pub const fn serializer(&self) -> Option<&PairSerializer> {
        self.serializer.as_ref()
    }

    pub(crate) fn serialize_entry(
        &self,
        format: Option<&str>,
        key: &Value,
        value: &Value,
    ) -> (Value, Value) {
        match &self.serializer {
            Some(serializer) => serializer.call(format, key, value),
            None => (
                super::serialize_value(key, format),
                super::serialize_value(value, format),
            ),
        }
    }

    pub(crate) fn invariant_failures<'a, I>(&self, pairs: I) -> Vec<String>
    where
        I: IntoIterator<Item = (&'a Value, &'a Value)>,
    {
        pairs
            .into_iter()
            .flat_map(|(key, value)| {
                self.invariants
                    .iter()
                    .map(move |inv| inv.check(key, value))
            })
            .filter_map(Result::err)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Declares a checked set or vector class.
///
/// Obtained from [`SetClass::builder`], [`VectorClass::builder`] or the
/// `subclass` method of an existing class, which starts from the parent's
/// types, invariants and serializer. Declaring a type on a subclass
/// replaces the inherited types; invariants always accumulate.
#[must_use]
pub struct ClassBuilder<C> {
    schema: ElementSchema,
    inherited_types: bool,
    class: PhantomData<fn() -> C>,
}

impl<C> ClassBuilder<C> {
    pub(crate) fn new(name: String) -> Self {
        Self {
            schema: ElementSchema::named(name),
            inherited_types: false,
            class: PhantomData,
        }
    }

    pub(crate) fn derived(parent: &ElementSchema, name: String) -> Self {
        Self {
            schema: parent.derived(name),
            inherited_types: true,
            class: PhantomData,
        }
    }

    /// Adds an accepted element type. The first call on a subclass
    /// builder drops the types inherited from the parent.
    pub fn element_type(mut self, ty: impl Into<ElementType>) -> Self {
        if mem::take(&mut self.inherited_types) {
            self.schema.element = TypeSpec::any();
        }
        self.schema.element.push(ty.into());
        self
    }

    /// Replaces the accepted element types.
    pub fn element_types(mut self, spec: TypeSpec) -> Self {
        self.inherited_types = false;
        self.schema.element = spec;
        self
    }

    /// Adds an invariant, checked after those already declared.
    pub fn invariant(mut self, invariant: Invariant) -> Self {
        self.schema.invariants.push(invariant);
        self
    }

    /// Sets the custom serializer.
    pub fn serializer(mut self, serializer: Serializer) -> Self {
        self.schema.serializer = Some(serializer);
        self
    }

    pub(crate) fn into_schema(self) -> Arc<ElementSchema> {
        Arc::new(self.schema)
    }
}

impl<C> fmt::Debug for ClassBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassBuilder")
            .field("schema", &self.schema)
            .field("inherited_types", &self.inherited_types)
            .finish()
    }
}

/// Declares a checked map class.
#[must_use]
#[derive(Debug)]
pub struct MapClassBuilder {
    schema: MapSchema,
    inherited_key: bool,
    inherited_value: bool,
}

impl MapClassBuilder {
    pub(crate) fn new(name: String) -> Self {
        Self {
            schema: MapSchema::named(name),
            inherited_key: false,
            inherited_value: false,
        }
    }

    pub(crate) fn derived(parent: &MapSchema, name: String) -> Self {
        Self {
            schema: parent.derived(name),
            inherited_key: true,
            inherited_value: true,
        }
    }

    /// Adds an accepted key type. The first call on a subclass builder
    /// drops the inherited key types.
    pub fn key_type(mut self, ty: impl Into<ElementType>) -> Self {
        if mem::take(&mut self.inherited_key) {
            self.schema.key = TypeSpec::any();
        }
        self.schema.key.push(ty.into());
        self
    }

    /// Adds an accepted value type. The first call on a subclass builder
    /// drops the inherited value types.
    pub fn value_type(mut self, ty: impl Into<ElementType>) -> Self {
        if mem::take(&mut self.inherited_value) {
            self.schema.value = TypeSpec::any();
        }
        self.schema.value.push(ty.into());
        self
    }

    /// Adds an invariant, checked after those already declared.
    pub fn invariant(mut self, invariant: PairInvariant) -> Self {
        self.schema.invariants.push(invariant);
        self
    }

    /// Sets the custom serializer.
    pub fn serializer(mut self, serializer: PairSerializer) -> Self {
        self.schema.serializer = Some(serializer);
        self
    }

    /// Finishes the declaration.
    pub fn build(self) -> MapClass {
        MapClass::from_schema(Arc::new(self.schema))
    }
}
