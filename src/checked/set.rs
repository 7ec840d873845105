//! Checked sets.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::debug;

use super::schema::{ClassBuilder, ElementSchema};
use super::{Checked, CheckedType};
use crate::error::{InvariantError, Result, ValueTypeError};
use crate::evolver::SetEvolver;
use crate::iter::Keys;
use crate::pickle::{Reduced, ReducedArgs};
use crate::set::PSet;
use crate::value::{self, Value};

/// A checked set class.
///
/// Cheap to clone; clones share one schema. Two classes are the same class
/// when their names match.
#[derive(Clone)]
pub struct SetClass {
    schema: Arc<ElementSchema>,
}

impl ClassBuilder<SetClass> {
    /// Finishes the declaration.
    #[must_use]
    pub fn build(self) -> SetClass {
        SetClass {
            schema: self.into_schema(),
        }
    }
}

impl SetClass {
    /// Starts declaring a class named `name` that accepts any element.
    pub fn builder(name: impl Into<String>) -> ClassBuilder<Self> {
        ClassBuilder::new(name.into())
    }

    /// Starts declaring a subclass that inherits this class's element
    /// types, invariants and serializer.
    pub fn subclass(&self, name: impl Into<String>) -> ClassBuilder<Self> {
        ClassBuilder::derived(&self.schema, name.into())
    }

    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Returns the class schema.
    #[must_use]
    pub fn schema(&self) -> &ElementSchema {
        &self.schema
    }

    /// Returns the empty instance.
    #[must_use]
    pub fn empty(&self) -> CheckedSet {
        CheckedSet::from_parts(self.clone(), PSet::new())
    }

    /// Builds an instance holding `items`, validating every element.
    ///
    /// # Errors
    ///
    /// Returns [`CheckedError::ValueType`](crate::CheckedError::ValueType)
    /// for the first element of a rejected type, otherwise
    /// [`CheckedError::Invariant`](crate::CheckedError::Invariant) with every
    /// invariant failure.
    pub fn construct<I: IntoIterator<Item = Value>>(&self, items: I) -> Result<CheckedSet> {
        let mut evolver = self.empty().evolver();
        evolver.update(items)?;
        evolver.persistent()
    }

    /// Like [`construct`](Self::construct), but first turns plain
    /// collections into instances of the declared element class.
    ///
    /// # Errors
    ///
    /// Fails like [`construct`](Self::construct), or with the nested class's
    /// error.
    pub fn create<I: IntoIterator<Item = Value>>(&self, items: I) -> Result<CheckedSet> {
        let element = self.schema.element();
        let items = items
            .into_iter()
            .map(|item| element.coerce(item))
            .collect::<Result<Vec<_>>>()?;
        self.construct(items)
    }

    /// Builds an instance from any sequence or set value. Instances of this
    /// class are returned as they are.
    ///
    /// # Errors
    ///
    /// Returns [`CheckedError::ValueType`](crate::CheckedError::ValueType)
    /// if `source` holds no elements to iterate, otherwise fails like
    /// [`create`](Self::create).
    pub fn create_from(&self, source: &Value) -> Result<CheckedSet> {
        if let Value::Checked(Checked::Set(set)) = source
            && set.class().schema().is_a(self.name())
        {
            return Ok(set.clone());
        }
        match source.elements() {
            Some(items) => self.create(items.cloned()),
            None => Err(ValueTypeError {
                class: self.name().to_owned(),
                value: source.clone(),
                actual: source.kind(),
                expected: vec!["set".to_owned(), "list".to_owned()],
            }
            .into()),
        }
    }

    /// Returns `true` if `value` is an instance of this class or of a
    /// subclass.
    #[must_use]
    pub fn is_instance(&self, value: &Value) -> bool {
        matches!(value, Value::Checked(Checked::Set(set)) if set.class().schema().is_a(self.name()))
    }
}

impl PartialEq for SetClass {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for SetClass {}

impl Hash for SetClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Debug for SetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetClass")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Instances
// ---------------------------------------------------------------------------

struct SetInstance {
    class: SetClass,
    set: PSet<Value>,
}

/// An instance of a [`SetClass`].
#[derive(Clone)]
pub struct CheckedSet {
    inner: Arc<SetInstance>,
}

impl CheckedSet {
    fn from_parts(class: SetClass, set: PSet<Value>) -> Self {
        Self {
            inner: Arc::new(SetInstance { class, set }),
        }
    }

    /// Returns the instance's class.
    #[must_use]
    pub fn class(&self) -> &SetClass {
        &self.inner.class
    }

    /// Returns the underlying persistent set.
    #[must_use]
    pub fn as_pset(&self) -> &PSet<Value> {
        &self.inner.set
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.set.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.set.is_empty()
    }

    /// Returns `true` if the set contains `elem`.
    #[must_use]
    pub fn contains(&self, elem: &Value) -> bool {
        self.inner.set.contains(elem)
    }

    /// Returns an iterator over the elements.
    #[must_use]
    pub fn iter(&self) -> Keys<'_, Value, ()> {
        self.inner.set.iter()
    }

    /// Returns `true` if both are the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns an instance that also contains `elem`.
    ///
    /// # Errors
    ///
    /// Fails like [`SetClass::construct`]; `self` is unaffected.
    pub fn add(&self, elem: Value) -> Result<Self> {
        let mut evolver = self.evolver();
        evolver.add(elem)?;
        evolver.persistent()
    }

    /// Returns an instance with every element of `items` added.
    ///
    /// # Errors
    ///
    /// Fails like [`SetClass::construct`]; `self` is unaffected.
    pub fn update<I: IntoIterator<Item = Value>>(&self, items: I) -> Result<Self> {
        let mut evolver = self.evolver();
        evolver.update(items)?;
        evolver.persistent()
    }

    /// Returns an instance without `elem`. Removal never fails validation.
    #[must_use]
    pub fn discard(&self, elem: &Value) -> Self {
        let set = self.inner.set.discard(elem);
        if set.ptr_eq(&self.inner.set) {
            self.clone()
        } else {
            Self::from_parts(self.class().clone(), set)
        }
    }

    /// Creates a validating evolver against this instance.
    #[must_use]
    pub fn evolver(&self) -> CheckedSetEvolver {
        CheckedSetEvolver {
            evolver: self.inner.set.evolver(),
            origin: self.clone(),
            pending: Vec::new(),
        }
    }
}

impl CheckedType for CheckedSet {
    fn class_name(&self) -> &str {
        self.class().name()
    }

    fn serialize(&self, format: Option<&str>) -> Value {
        let schema = self.class().schema();
        Value::Set(
            self.iter()
                .map(|elem| schema.serialize_element(format, elem))
                .collect(),
        )
    }

    fn reduce(&self) -> Reduced {
        Reduced {
            class: self.class_name().to_owned(),
            args: ReducedArgs::Items(self.iter().cloned().collect()),
        }
    }
}

impl PartialEq for CheckedSet {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.inner.set == other.inner.set
    }
}

impl Eq for CheckedSet {}

impl Hash for CheckedSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.set.hash(state);
    }
}

impl fmt::Debug for CheckedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckedSet")
            .field("class", &self.class_name())
            .field("elements", &self.inner.set)
            .finish()
    }
}

impl fmt::Display for CheckedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}([", self.class_name())?;
        value::write_joined(f, self.iter())?;
        f.write_str("])")
    }
}

impl<'a> IntoIterator for &'a CheckedSet {
    type Item = &'a Value;
    type IntoIter = Keys<'a, Value, ()>;

    fn into_iter(self) -> Keys<'a, Value, ()> {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Evolver
// ---------------------------------------------------------------------------

/// Validating evolver over a [`CheckedSet`].
///
/// Element types are checked as elements arrive; invariants run when the
/// batch is committed, over the elements that are new to the set.
pub struct CheckedSetEvolver {
    origin: CheckedSet,
    evolver: SetEvolver<Value>,
    pending: Vec<Value>,
}

impl CheckedSetEvolver {
    /// Adds `elem` to the working copy.
    ///
    /// # Errors
    ///
    /// Returns [`CheckedError::ValueType`](crate::CheckedError::ValueType)
    /// if the class does not accept the element's type; nothing is added.
    pub fn add(&mut self, elem: Value) -> Result<&mut Self> {
        let schema = self.origin.class().schema();
        schema.element().check(schema.name(), &elem)?;
        if !self.evolver.contains(&elem) {
            self.pending.push(elem.clone());
            self.evolver.add(elem);
        }
        Ok(self)
    }

    /// Adds every element of `items`, stopping at the first rejected type.
    ///
    /// # Errors
    ///
    /// Fails like [`add`](Self::add).
    pub fn update<I: IntoIterator<Item = Value>>(&mut self, items: I) -> Result<&mut Self> {
        for elem in items {
            self.add(elem)?;
        }
        Ok(self)
    }

    /// Removes `elem` if present.
    pub fn discard(&mut self, elem: &Value) -> &mut Self {
        self.evolver.discard(elem);
        self
    }

    /// Returns `true` if the working copy contains `elem`.
    #[must_use]
    pub fn contains(&self, elem: &Value) -> bool {
        self.evolver.contains(elem)
    }

    /// Returns the number of elements in the working copy.
    #[must_use]
    pub fn len(&self) -> usize {
        self.evolver.len()
    }

    /// Returns `true` if the working copy is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.evolver.is_empty()
    }

    /// Returns `true` if the working copy changed since the last commit.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.evolver.is_dirty()
    }

    /// Validates and commits the batch.
    ///
    /// Returns the origin instance itself when the contents did not change.
    ///
    /// # Errors
    ///
    /// Returns [`CheckedError::Invariant`](crate::CheckedError::Invariant)
    /// listing every failure; the evolver keeps its working copy and the
    /// origin is unaffected.
    pub fn persistent(&mut self) -> Result<CheckedSet> {
        let schema = self.origin.class().schema();
        let mut seen = HashSet::new();
        let added = self
            .pending
            .iter()
            .filter(|elem| self.evolver.contains(elem) && seen.insert(*elem));
        let messages = schema.invariant_failures(added);
        if !messages.is_empty() {
            debug!(
                class = schema.name(),
                failures = messages.len(),
                "rejected checked set update"
            );
            return Err(InvariantError {
                class: schema.name().to_owned(),
                messages,
            }
            .into());
        }

        self.pending.clear();
        let set = self.evolver.persistent();
        if !set.ptr_eq(self.origin.as_pset()) {
            self.origin = CheckedSet::from_parts(self.origin.class().clone(), set);
        }
        Ok(self.origin.clone())
    }
}

impl fmt::Debug for CheckedSetEvolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckedSetEvolver")
            .field("class", &self.origin.class_name())
            .field("pending", &self.pending.len())
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}
