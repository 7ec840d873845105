//! Reduce / reconstruct support for checked instances.
//!
//! [`CheckedType::reduce`](crate::CheckedType::reduce) turns an instance
//! into its class name and constructor arguments. A [`ClassRegistry`]
//! holding the classes in play rebuilds an equal instance from them,
//! re-running validation.
//!
//! [`Pickled`] is a serde-friendly tree form of any [`Value`], with checked
//! instances stored by class name, so whole values can travel through any
//! serde format and be loaded back against a registry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::checked::{AnyClass, Checked, CheckedType};
use crate::error::{CheckedError, Result};
use crate::value::Value;

/// Constructor arguments of a reduced instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReducedArgs {
    /// Elements of a set or vector, in iteration order.
    Items(Vec<Value>),
    /// Entries of a map.
    Pairs(Vec<(Value, Value)>),
}

impl ReducedArgs {
    /// Returns the argument shape name used in messages.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Items(_) => "items",
            Self::Pairs(_) => "pairs",
        }
    }
}

/// A checked instance reduced to its class name and constructor arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduced {
    /// Name of the instance's class.
    pub class: String,
    /// Arguments for the class's primary constructor.
    pub args: ReducedArgs,
}

/// Classes known to reconstruction, by name.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, AnyClass>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `class`, replacing any class of the same name.
    pub fn register(&mut self, class: impl Into<AnyClass>) -> &mut Self {
        let class = class.into();
        debug!(class = class.name(), "registered checked class");
        self.classes.insert(class.name().to_owned(), class);
        self
    }

    /// Returns the class registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AnyClass> {
        self.classes.get(name)
    }

    /// Returns the number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no class is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Rebuilds an instance through its class's validating constructor.
    ///
    /// # Errors
    ///
    /// Returns [`CheckedError::UnknownClass`] for an unregistered class,
    /// [`CheckedError::ArgumentKind`] if the arguments do not fit the
    /// class's kind, or any validation error of the constructor.
    pub fn reconstruct(&self, reduced: &Reduced) -> Result<Checked> {
        let Some(class) = self.get(&reduced.class) else {
            debug!(class = %reduced.class, "reconstruction of unknown class");
            return Err(CheckedError::UnknownClass(reduced.class.clone()));
        };
        match (class, &reduced.args) {
            (AnyClass::Set(c), ReducedArgs::Items(items)) => {
                c.construct(items.iter().cloned()).map(Checked::Set)
            }
            (AnyClass::Vector(c), ReducedArgs::Items(items)) => {
                c.construct(items.iter().cloned()).map(Checked::Vector)
            }
            (AnyClass::Map(c), ReducedArgs::Pairs(pairs)) => {
                c.construct(pairs.iter().cloned()).map(Checked::Map)
            }
            (class, args) => {
                debug!(
                    class = class.name(),
                    found = args.shape(),
                    "reconstruction arguments do not fit class"
                );
                Err(CheckedError::ArgumentKind {
                    class: class.name().to_owned(),
                    found: args.shape(),
                })
            }
        }
    }

    /// Rebuilds a value from its pickled form.
    ///
    /// # Errors
    ///
    /// Fails like [`reconstruct`](Self::reconstruct) for any nested object.
    pub fn load(&self, pickled: &Pickled) -> Result<Value> {
        Ok(match pickled {
            Pickled::None => Value::None,
            Pickled::Bool(b) => Value::Bool(*b),
            Pickled::Int(i) => Value::Int(*i),
            Pickled::Float(x) => Value::Float(*x),
            Pickled::Str(s) => Value::Str(s.as_str().into()),
            Pickled::List(items) => Value::List(self.load_all(items)?),
            Pickled::Set(items) => Value::Set(self.load_all(items)?.into_iter().collect()),
            Pickled::Dict(pairs) => Value::Dict(self.load_pairs(pairs)?.into_iter().collect()),
            Pickled::PVector(items) => Value::PVector(self.load_all(items)?.into_iter().collect()),
            Pickled::PSet(items) => Value::PSet(self.load_all(items)?.into_iter().collect()),
            Pickled::PMap(pairs) => Value::PMap(self.load_pairs(pairs)?.into_iter().collect()),
            Pickled::Object { class, args } => {
                let args = match args {
                    PickledArgs::Items(items) => ReducedArgs::Items(self.load_all(items)?),
                    PickledArgs::Pairs(pairs) => ReducedArgs::Pairs(self.load_pairs(pairs)?),
                };
                let reduced = Reduced {
                    class: class.clone(),
                    args,
                };
                Value::Checked(self.reconstruct(&reduced)?)
            }
        })
    }

    fn load_all(&self, items: &[Pickled]) -> Result<Vec<Value>> {
        items.iter().map(|item| self.load(item)).collect()
    }

    fn load_pairs(&self, pairs: &[(Pickled, Pickled)]) -> Result<Vec<(Value, Value)>> {
        pairs
            .iter()
            .map(|(key, value)| Ok((self.load(key)?, self.load(value)?)))
            .collect()
    }
}

/// Tree form of a [`Value`] that any serde format can carry.
///
/// Unordered collections are stored as sequences in iteration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pickled {
    /// [`Value::None`].
    None,
    /// [`Value::Bool`].
    Bool(bool),
    /// [`Value::Int`].
    Int(i64),
    /// [`Value::Float`].
    Float(f64),
    /// [`Value::Str`].
    Str(String),
    /// [`Value::List`].
    List(Vec<Self>),
    /// [`Value::Set`].
    Set(Vec<Self>),
    /// [`Value::Dict`].
    Dict(Vec<(Self, Self)>),
    /// [`Value::PVector`].
    PVector(Vec<Self>),
    /// [`Value::PSet`].
    PSet(Vec<Self>),
    /// [`Value::PMap`].
    PMap(Vec<(Self, Self)>),
    /// A checked instance, by class name and constructor arguments.
    Object {
        /// Name of the instance's class.
        class: String,
        /// Constructor arguments.
        args: PickledArgs,
    },
}

/// Constructor arguments of a [`Pickled::Object`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickledArgs {
    /// Elements of a set or vector.
    Items(Vec<Pickled>),
    /// Entries of a map.
    Pairs(Vec<(Pickled, Pickled)>),
}

impl Pickled {
    /// Converts `value` to its tree form.
    #[must_use]
    pub fn dump(value: &Value) -> Self {
        match value {
            Value::None => Self::None,
            Value::Bool(b) => Self::Bool(*b),
            Value::Int(i) => Self::Int(*i),
            Value::Float(x) => Self::Float(*x),
            Value::Str(s) => Self::Str(s.as_ref().to_owned()),
            Value::List(items) => Self::List(dump_all(items)),
            Value::Set(items) => Self::Set(dump_all(items)),
            Value::Dict(pairs) => Self::Dict(dump_pairs(pairs)),
            Value::PVector(items) => Self::PVector(dump_all(items)),
            Value::PSet(items) => Self::PSet(dump_all(items)),
            Value::PMap(pairs) => Self::PMap(dump_pairs(pairs)),
            Value::Checked(checked) => {
                let reduced = checked.reduce();
                let args = match &reduced.args {
                    ReducedArgs::Items(items) => PickledArgs::Items(dump_all(items)),
                    ReducedArgs::Pairs(pairs) => {
                        PickledArgs::Pairs(dump_pairs(pairs.iter().map(|(k, v)| (k, v))))
                    }
                };
                Self::Object {
                    class: reduced.class,
                    args,
                }
            }
        }
    }
}

fn dump_all<'a, I>(items: I) -> Vec<Pickled>
where
    I: IntoIterator<Item = &'a Value>,
{
    items.into_iter().map(Pickled::dump).collect()
}

fn dump_pairs<'a, I>(pairs: I) -> Vec<(Pickled, Pickled)>
where
    I: IntoIterator<Item = (&'a Value, &'a Value)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (Pickled::dump(key), Pickled::dump(value)))
        .collect()
}
