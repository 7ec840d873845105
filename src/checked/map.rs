//! Checked maps.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::debug;

use super::schema::{MapClassBuilder, MapSchema, TypeSpec};
use super::{Checked, CheckedType};
use crate::error::{InvariantError, Result, ValueTypeError};
use crate::evolver::MapEvolver;
use crate::iter::Iter;
use crate::map::PMap;
use crate::pickle::{Reduced, ReducedArgs};
use crate::value::{self, Value};

/// A checked map class.
#[derive(Clone)]
pub struct MapClass {
    schema: Arc<MapSchema>,
}

impl MapClass {
    pub(crate) const fn from_schema(schema: Arc<MapSchema>) -> Self {
        Self { schema }
    }

    /// Starts declaring a class named `name` that accepts any key and value.
    pub fn builder(name: impl Into<String>) -> MapClassBuilder {
        MapClassBuilder::new(name.into())
    }

    /// Starts declaring a subclass that inherits this class's key and value
    /// types, invariants and serializer.
    pub fn subclass(&self, name: impl Into<String>) -> MapClassBuilder {
        MapClassBuilder::derived(&self.schema, name.into())
    }

    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Returns the class schema.
    #[must_use]
    pub fn schema(&self) -> &MapSchema {
        &self.schema
    }

    /// Returns the empty instance.
    #[must_use]
    pub fn empty(&self) -> CheckedMap {
        CheckedMap::from_parts(self.clone(), PMap::new())
    }

    /// Builds an instance holding `pairs`, later pairs winning, validating
    /// every key and value.
    ///
    /// # Errors
    ///
    /// Returns [`CheckedError::ValueType`](crate::CheckedError::ValueType)
    /// for the first key or value of a rejected type, otherwise
    /// [`CheckedError::Invariant`](crate::CheckedError::Invariant) with every
    /// invariant failure.
    pub fn construct<I>(&self, pairs: I) -> Result<CheckedMap>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let mut evolver = self.empty().evolver();
        evolver.update(pairs)?;
        evolver.persistent()
    }

    /// Like [`construct`](Self::construct), but first turns plain
    /// collections into instances of the declared key and value classes.
    ///
    /// # Errors
    ///
    /// Fails like [`construct`](Self::construct), or with a nested class's
    /// error.
    pub fn create<I>(&self, pairs: I) -> Result<CheckedMap>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let (keys, values) = (self.schema.key(), self.schema.value());
        let pairs = pairs
            .into_iter()
            .map(|(key, value)| Ok((keys.coerce(key)?, values.coerce(value)?)))
            .collect::<Result<Vec<_>>>()?;
        self.construct(pairs)
    }

    /// Builds an instance from any mapping value. Instances of this class
    /// are returned as they are.
    ///
    /// # Errors
    ///
    /// Returns [`CheckedError::ValueType`](crate::CheckedError::ValueType)
    /// if `source` is not a mapping, otherwise fails like
    /// [`create`](Self::create).
    pub fn create_from(&self, source: &Value) -> Result<CheckedMap> {
        if let Value::Checked(Checked::Map(map)) = source
            && map.class().schema().is_a(self.name())
        {
            return Ok(map.clone());
        }
        match source.pairs() {
            Some(pairs) => self.create(pairs.map(|(k, v)| (k.clone(), v.clone()))),
            None => Err(ValueTypeError {
                class: self.name().to_owned(),
                value: source.clone(),
                actual: source.kind(),
                expected: vec!["dict".to_owned(), "pmap".to_owned()],
            }
            .into()),
        }
    }

    /// Returns `true` if `value` is an instance of this class or of a
    /// subclass.
    #[must_use]
    pub fn is_instance(&self, value: &Value) -> bool {
        matches!(value, Value::Checked(Checked::Map(m)) if m.class().schema().is_a(self.name()))
    }
}

impl PartialEq for MapClass {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for MapClass {}

impl Hash for MapClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Debug for MapClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapClass")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Instances
// ---------------------------------------------------------------------------

struct MapInstance {
    class: MapClass,
    map: PMap<Value, Value>,
}

/// An instance of a [`MapClass`].
#[derive(Clone)]
pub struct CheckedMap {
    inner: Arc<MapInstance>,
}

impl CheckedMap {
    fn from_parts(class: MapClass, map: PMap<Value, Value>) -> Self {
        Self {
            inner: Arc::new(MapInstance { class, map }),
        }
    }

    /// Returns the instance's class.
    #[must_use]
    pub fn class(&self) -> &MapClass {
        &self.inner.class
    }

    /// Returns the underlying persistent map.
    #[must_use]
    pub fn as_pmap(&self) -> &PMap<Value, Value> {
        &self.inner.map
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.map.len()
    }

    /// Returns `true` if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.map.is_empty()
    }

    /// Returns the value `key` maps to.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.inner.map.get(key)
    }

    /// Returns `true` if the map contains `key`.
    #[must_use]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.inner.map.contains_key(key)
    }

    /// Returns an iterator over `(&key, &value)` pairs.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, Value, Value> {
        self.inner.map.iter()
    }

    /// Returns `true` if both are the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns an instance with `key` mapped to `value`.
    ///
    /// # Errors
    ///
    /// Fails like [`MapClass::construct`]; `self` is unaffected.
    pub fn set(&self, key: Value, value: Value) -> Result<Self> {
        let mut evolver = self.evolver();
        evolver.set(key, value)?;
        evolver.persistent()
    }

    /// Returns an instance with every pair of `pairs` set.
    ///
    /// # Errors
    ///
    /// Fails like [`MapClass::construct`]; `self` is unaffected.
    pub fn update<I>(&self, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let mut evolver = self.evolver();
        evolver.update(pairs)?;
        evolver.persistent()
    }

    /// Returns an instance without `key`. Removal never fails validation.
    #[must_use]
    pub fn remove(&self, key: &Value) -> Self {
        let map = self.inner.map.remove(key);
        if map.ptr_eq(&self.inner.map) {
            self.clone()
        } else {
            Self::from_parts(self.class().clone(), map)
        }
    }

    /// Creates a validating evolver against this instance.
    #[must_use]
    pub fn evolver(&self) -> CheckedMapEvolver {
        CheckedMapEvolver {
            evolver: self.inner.map.evolver(),
            origin: self.clone(),
            pending: Vec::new(),
        }
    }
}

impl CheckedType for CheckedMap {
    fn class_name(&self) -> &str {
        self.class().name()
    }

    fn serialize(&self, format: Option<&str>) -> Value {
        let schema = self.class().schema();
        Value::Dict(
            self.iter()
                .map(|(key, value)| schema.serialize_entry(format, key, value))
                .collect(),
        )
    }

    fn reduce(&self) -> Reduced {
        Reduced {
            class: self.class_name().to_owned(),
            args: ReducedArgs::Pairs(
                self.iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for CheckedMap {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.inner.map == other.inner.map
    }
}

impl Eq for CheckedMap {}

impl Hash for CheckedMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.map.hash(state);
    }
}

impl fmt::Debug for CheckedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckedMap")
            .field("class", &self.class_name())
            .field("entries", &self.inner.map)
            .finish()
    }
}

impl fmt::Display for CheckedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({{", self.class_name())?;
        value::write_pairs(f, self.iter())?;
        f.write_str("})")
    }
}

impl<'a> IntoIterator for &'a CheckedMap {
    type Item = (&'a Value, &'a Value);
    type IntoIter = Iter<'a, Value, Value>;

    fn into_iter(self) -> Iter<'a, Value, Value> {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Evolver
// ---------------------------------------------------------------------------

/// Validating evolver over a [`CheckedMap`].
///
/// Keys whose value was set during the batch are re-validated at commit.
pub struct CheckedMapEvolver {
    origin: CheckedMap,
    evolver: MapEvolver<Value, Value>,
    pending: Vec<Value>,
}

impl CheckedMapEvolver {
    fn check(&self, spec: &TypeSpec, value: &Value) -> Result<()> {
        spec.check(self.origin.class_name(), value)?;
        Ok(())
    }

    /// Maps `key` to `value` in the working copy.
    ///
    /// # Errors
    ///
    /// Returns [`CheckedError::ValueType`](crate::CheckedError::ValueType)
    /// if the class does not accept the key's or the value's type.
    pub fn set(&mut self, key: Value, value: Value) -> Result<&mut Self> {
        let schema = self.origin.class().schema();
        self.check(schema.key(), &key)?;
        self.check(schema.value(), &value)?;
        if self.evolver.get(&key) != Some(&value) {
            self.pending.push(key.clone());
            self.evolver.set(key, value);
        }
        Ok(self)
    }

    /// Applies [`set`](Self::set) for every pair, stopping at the first
    /// rejected type.
    ///
    /// # Errors
    ///
    /// Fails like [`set`](Self::set).
    pub fn update<I>(&mut self, pairs: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        for (key, value) in pairs {
            self.set(key, value)?;
        }
        Ok(self)
    }

    /// Removes `key` if present.
    pub fn remove(&mut self, key: &Value) -> &mut Self {
        self.evolver.remove(key);
        self
    }

    /// Returns the value `key` maps to in the working copy.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.evolver.get(key)
    }

    /// Returns the number of entries in the working copy.
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
    /// listing every failure; the origin is unaffected.
    pub fn persistent(&mut self) -> Result<CheckedMap> {
        let schema = self.origin.class().schema();
        let mut seen = HashSet::new();
        let written = self.pending.iter().filter_map(|key| {
            let value = self.evolver.get(key)?;
            seen.insert(key).then_some((key, value))
        });
        let messages = schema.invariant_failures(written);
        if !messages.is_empty() {
            debug!(
                class = schema.name(),
                failures = messages.len(),
                "rejected checked map update"
            );
            return Err(InvariantError {
                class: schema.name().to_owned(),
                messages,
            }
            .into());
        }

        self.pending.clear();
        let map = self.evolver.persistent();
        if !map.ptr_eq(self.origin.as_pmap()) {
            self.origin = CheckedMap::from_parts(self.origin.class().clone(), map);
        }
        Ok(self.origin.clone())
    }
}

impl fmt::Debug for CheckedMapEvolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckedMapEvolver")
            .field("class", &self.origin.class_name())
            .field("pending", &self.pending.len())
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}
