//! Checked vectors.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::debug;

use super::schema::{ClassBuilder, ElementSchema};
use super::{Checked, CheckedType};
use crate::error::{InvariantError, Result, ValueTypeError};
use crate::evolver::VectorEvolver;
use crate::iter::VectorIter;
use crate::pickle::{Reduced, ReducedArgs};
use crate::value::{self, Value};
use crate::vector::PVector;

/// A checked vector class.
#[derive(Clone)]
pub struct VectorClass {
    schema: Arc<ElementSchema>,
}

impl ClassBuilder<VectorClass> {
    /// Finishes the declaration.
    #[must_use]
    pub fn build(self) -> VectorClass {
        VectorClass {
            schema: self.into_schema(),
        }
    }
}

impl VectorClass {
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
    pub fn empty(&self) -> CheckedVector {
        CheckedVector::from_parts(self.clone(), PVector::new())
    }

    /// Builds an instance holding `items` in order, validating every
    /// element.
    ///
    /// # Errors
    ///
    /// Returns [`CheckedError::ValueType`](crate::CheckedError::ValueType)
    /// for the first element of a rejected type, otherwise
    /// [`CheckedError::Invariant`](crate::CheckedError::Invariant) with every
    /// invariant failure.
    pub fn construct<I: IntoIterator<Item = Value>>(&self, items: I) -> Result<CheckedVector> {
        let mut evolver = self.empty().evolver();
        evolver.extend(items)?;
        evolver.persistent()
    }

    /// Like [`construct`](Self::construct), but first turns plain
    /// collections into instances of the declared element class.
    ///
    /// # Errors
    ///
    /// Fails like [`construct`](Self::construct), or with the nested class's
    /// error.
    pub fn create<I: IntoIterator<Item = Value>>(&self, items: I) -> Result<CheckedVector> {
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
    pub fn create_from(&self, source: &Value) -> Result<CheckedVector> {
        if let Value::Checked(Checked::Vector(vector)) = source
            && vector.class().schema().is_a(self.name())
        {
            return Ok(vector.clone());
        }
        match source.elements() {
            Some(items) => self.create(items.cloned()),
            None => Err(ValueTypeError {
                class: self.name().to_owned(),
                value: source.clone(),
                actual: source.kind(),
                expected: vec!["list".to_owned(), "pvector".to_owned()],
            }
            .into()),
        }
    }

    /// Returns `true` if `value` is an instance of this class or of a
    /// subclass.
    #[must_use]
    pub fn is_instance(&self, value: &Value) -> bool {
        matches!(value, Value::Checked(Checked::Vector(v)) if v.class().schema().is_a(self.name()))
    }
}

impl PartialEq for VectorClass {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for VectorClass {}

impl Hash for VectorClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Debug for VectorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorClass")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Instances
// ---------------------------------------------------------------------------

struct VectorInstance {
    class: VectorClass,
    vector: PVector<Value>,
}

/// An instance of a [`VectorClass`].
#[derive(Clone)]
pub struct CheckedVector {
    inner: Arc<VectorInstance>,
}

impl CheckedVector {
    fn from_parts(class: VectorClass, vector: PVector<Value>) -> Self {
        Self {
            inner: Arc::new(VectorInstance { class, vector }),
        }
    }

    /// Returns the instance's class.
    #[must_use]
    pub fn class(&self) -> &VectorClass {
        &self.inner.class
    }

    /// Returns the underlying persistent vector.
    #[must_use]
    pub fn as_pvector(&self) -> &PVector<Value> {
        &self.inner.vector
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.vector.len()
    }

    /// Returns `true` if the vector is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.vector.is_empty()
    }

    /// Returns the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.inner.vector.get(index)
    }

    /// Returns an iterator over the elements, front to back.
    #[must_use]
    pub fn iter(&self) -> VectorIter<'_, Value> {
        self.inner.vector.iter()
    }

    /// Returns `true` if both are the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns an instance with `value` appended.
    ///
    /// # Errors
    ///
    /// Fails like [`VectorClass::construct`]; `self` is unaffected.
    pub fn append(&self, value: Value) -> Result<Self> {
        let mut evolver = self.evolver();
        evolver.append(value)?;
        evolver.persistent()
    }

    /// Returns an instance with every element of `items` appended.
    ///
    /// # Errors
    ///
    /// Fails like [`VectorClass::construct`]; `self` is unaffected.
    pub fn extend<I: IntoIterator<Item = Value>>(&self, items: I) -> Result<Self> {
        let mut evolver = self.evolver();
        evolver.extend(items)?;
        evolver.persistent()
    }

    /// Returns an instance with the element at `index` replaced.
    ///
    /// # Errors
    ///
    /// Returns [`CheckedError::Index`](crate::CheckedError::Index) if
    /// `index` is out of range, otherwise fails like
    /// [`VectorClass::construct`].
    pub fn set(&self, index: usize, value: Value) -> Result<Self> {
        let mut evolver = self.evolver();
        evolver.set(index, value)?;
        evolver.persistent()
    }

    /// Creates a validating evolver against this instance.
    #[must_use]
    pub fn evolver(&self) -> CheckedVectorEvolver {
        CheckedVectorEvolver {
            evolver: self.inner.vector.evolver(),
            origin: self.clone(),
            pending: BTreeSet::new(),
        }
    }
}

impl CheckedType for CheckedVector {
    fn class_name(&self) -> &str {
        self.class().name()
    }

    fn serialize(&self, format: Option<&str>) -> Value {
        let schema = self.class().schema();
        Value::List(
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

impl PartialEq for CheckedVector {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.inner.vector == other.inner.vector
    }
}

impl Eq for CheckedVector {}

impl Hash for CheckedVector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.vector.hash(state);
    }
}

impl fmt::Debug for CheckedVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckedVector")
            .field("class", &self.class_name())
            .field("elements", &self.inner.vector)
            .finish()
    }
}

impl fmt::Display for CheckedVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}([", self.class_name())?;
        value::write_joined(f, self.iter())?;
        f.write_str("])")
    }
}

impl<'a> IntoIterator for &'a CheckedVector {
    type Item = &'a Value;
    type IntoIter = VectorIter<'a, Value>;

    fn into_iter(self) -> VectorIter<'a, Value> {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Evolver
// ---------------------------------------------------------------------------

/// Validating evolver over a [`CheckedVector`].
///
/// Positions written during the batch are re-validated at commit, in index
/// order.
pub struct CheckedVectorEvolver {
    origin: CheckedVector,
    evolver: VectorEvolver<Value>,
    pending: BTreeSet<usize>,
}

impl CheckedVectorEvolver {
    fn check_type(&self, value: &Value) -> Result<()> {
        let schema = self.origin.class().schema();
        schema.element().check(schema.name(), value)?;
        Ok(())
    }

    /// Appends `value` to the working copy.
    ///
    /// # Errors
    ///
    /// Returns [`CheckedError::ValueType`](crate::CheckedError::ValueType)
    /// if the class does not accept the value's type.
    pub fn append(&mut self, value: Value) -> Result<&mut Self> {
        self.check_type(&value)?;
        self.pending.insert(self.evolver.len());
        self.evolver.append(value);
        Ok(self)
    }

    /// Appends every element of `items`, stopping at the first rejected
    /// type.
    ///
    /// # Errors
    ///
    /// Fails like [`append`](Self::append).
    pub fn extend<I: IntoIterator<Item = Value>>(&mut self, items: I) -> Result<&mut Self> {
        for value in items {
            self.append(value)?;
        }
        Ok(self)
    }

    /// Replaces the element at `index` in the working copy.
    ///
    /// # Errors
    ///
    /// Returns [`CheckedError::ValueType`](crate::CheckedError::ValueType)
    /// for a rejected type or [`CheckedError::Index`](crate::CheckedError::Index)
    /// for a missing position.
    pub fn set(&mut self, index: usize, value: Value) -> Result<&mut Self> {
        self.check_type(&value)?;
        let unchanged = self.evolver.get(index) == Some(&value);
        self.evolver.set(index, value)?;
        if !unchanged {
            self.pending.insert(index);
        }
        Ok(self)
    }

    /// Returns the element at `index` in the working copy.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.evolver.get(index)
    }

    /// Returns the number of elements in the working copy.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.evolver.len()
    }

    /// Returns `true` if the working copy is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
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
    /// listing every failure; the origin is unaffected.
    pub fn persistent(&mut self) -> Result<CheckedVector> {
        let schema = self.origin.class().schema();
        let written = self
            .pending
            .iter()
            .filter_map(|&index| self.evolver.get(index));
        let messages = schema.invariant_failures(written);
        if !messages.is_empty() {
            debug!(
                class = schema.name(),
                failures = messages.len(),
                "rejected checked vector update"
            );
            return Err(InvariantError {
                class: schema.name().to_owned(),
                messages,
            }
            .into());
        }

        self.pending.clear();
        let vector = self.evolver.persistent();
        if !vector.ptr_eq(self.origin.as_pvector()) {
            self.origin = CheckedVector::from_parts(self.origin.class().clone(), vector);
        }
        Ok(self.origin.clone())
    }
}

impl fmt::Debug for CheckedVectorEvolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckedVectorEvolver")
            .field("class", &self.origin.class_name())
            .field("pending", &self.pending.len())
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}
