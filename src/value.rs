//! Dynamic values validated by checked collections.
//!
//! Checked classes constrain runtime types, so their elements are
//! [`Value`]s rather than a static Rust type.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::adhash;
use crate::checked::{Checked, CheckedMap, CheckedSet, CheckedVector};
use crate::map::PMap;
use crate::set::PSet;
use crate::vector::PVector;

/// A dynamically typed element.
///
/// Equality and hashing are structural. Floats compare by bit pattern so
/// that `Eq` and `Hash` stay consistent. A checked instance equals the
/// persistent collection of its kind with the same contents, whatever its
/// class.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absent value.
    None,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// An immutable string.
    Str(Arc<str>),
    /// A plain mutable sequence.
    List(Vec<Self>),
    /// A plain mutable set.
    Set(HashSet<Self>),
    /// A plain mutable mapping.
    Dict(HashMap<Self, Self>),
    /// A persistent vector.
    PVector(PVector<Self>),
    /// A persistent set.
    PSet(PSet<Self>),
    /// A persistent map.
    PMap(PMap<Self, Self>),
    /// An instance of a checked class.
    Checked(Checked),
}

/// Runtime type of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`Value::None`].
    None,
    /// [`Value::Bool`].
    Bool,
    /// [`Value::Int`].
    Int,
    /// [`Value::Float`].
    Float,
    /// [`Value::Str`].
    Str,
    /// [`Value::List`].
    List,
    /// [`Value::Set`].
    Set,
    /// [`Value::Dict`].
    Dict,
    /// [`Value::PVector`], or any checked vector.
    PVector,
    /// [`Value::PSet`], or any checked set.
    PSet,
    /// [`Value::PMap`], or any checked map.
    PMap,
}

impl ValueKind {
    /// Returns the type name used in messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::List => "list",
            Self::Set => "set",
            Self::Dict => "dict",
            Self::PVector => "pvector",
            Self::PSet => "pset",
            Self::PMap => "pmap",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// Returns the runtime type. Checked instances report the persistent
    /// kind they are built on.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::None => ValueKind::None,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Str(_) => ValueKind::Str,
            Self::List(_) => ValueKind::List,
            Self::Set(_) => ValueKind::Set,
            Self::Dict(_) => ValueKind::Dict,
            Self::PVector(_) | Self::Checked(Checked::Vector(_)) => ValueKind::PVector,
            Self::PSet(_) | Self::Checked(Checked::Set(_)) => ValueKind::PSet,
            Self::PMap(_) | Self::Checked(Checked::Map(_)) => ValueKind::PMap,
        }
    }

    /// Builds a plain list.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Self>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a plain set.
    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Self>,
    {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    /// Builds a plain mapping.
    pub fn dict<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Self>,
        V: Into<Self>,
    {
        Self::Dict(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns the integer, if this is one.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float, if this is one.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Returns the string, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Returns the checked instance, if this is one.
    #[must_use]
    pub const fn as_checked(&self) -> Option<&Checked> {
        match self {
            Self::Checked(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the elements of a sequence or set, whether plain, persistent
    /// or checked. Mappings and scalars return `None`.
    #[must_use]
    pub fn elements(&self) -> Option<Box<dyn Iterator<Item = &Self> + '_>> {
        match self {
            Self::List(items) => Some(Box::new(items.iter())),
            Self::Set(items) => Some(Box::new(items.iter())),
            Self::PVector(items) => Some(Box::new(items.iter())),
            Self::PSet(items) => Some(Box::new(items.iter())),
            Self::Checked(Checked::Vector(v)) => Some(Box::new(v.iter())),
            Self::Checked(Checked::Set(s)) => Some(Box::new(s.iter())),
            _ => None,
        }
    }

    /// Returns the pairs of a mapping, whether plain, persistent or checked.
    #[must_use]
    pub fn pairs(&self) -> Option<Box<dyn Iterator<Item = (&Self, &Self)> + '_>> {
        match self {
            Self::Dict(entries) => Some(Box::new(entries.iter())),
            Self::PMap(entries) => Some(Box::new(entries.iter())),
            Self::Checked(Checked::Map(m)) => Some(Box::new(m.iter())),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Equality & hashing
// ---------------------------------------------------------------------------

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Dict(a), Self::Dict(b)) => a == b,
            (Self::PVector(a), Self::PVector(b)) => a == b,
            (Self::PSet(a), Self::PSet(b)) => a == b,
            (Self::PMap(a), Self::PMap(b)) => a == b,
            (Self::Checked(a), Self::Checked(b)) => a == b,
            (Self::Checked(checked), plain) | (plain, Self::Checked(checked)) => {
                match (checked, plain) {
                    (Checked::Set(set), Self::PSet(p)) => set.as_pset() == p,
                    (Checked::Vector(vector), Self::PVector(p)) => vector.as_pvector() == p,
                    (Checked::Map(map), Self::PMap(p)) => map.as_pmap() == p,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Self::None => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(x) => x.to_bits().hash(state),
            Self::Str(s) => s.hash(state),
            Self::List(items) => items.hash(state),
            Self::Set(items) => {
                state.write_usize(items.len());
                state.write_u64(adhash::unordered(items.iter().map(adhash::hash_one)));
            }
            Self::Dict(entries) => {
                state.write_usize(entries.len());
                state.write_u64(adhash::unordered(entries.iter().map(|(k, v)| {
                    adhash::entry_adhash(adhash::hash_one(k), adhash::hash_one(v))
                })));
            }
            Self::PVector(items) => items.hash(state),
            Self::PSet(items) => items.hash(state),
            Self::PMap(entries) => entries.hash(state),
            Self::Checked(Checked::Vector(vector)) => vector.as_pvector().hash(state),
            Self::Checked(Checked::Set(set)) => set.as_pset().hash(state),
            Self::Checked(Checked::Map(map)) => map.as_pmap().hash(state),
        }
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Writes `items` separated by `, `.
pub(crate) fn write_joined<'a, I>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator<Item = &'a Value>,
{
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Writes `key: value` pairs separated by `, `.
pub(crate) fn write_pairs<'a, I>(f: &mut fmt::Formatter<'_>, pairs: I) -> fmt::Result
where
    I: IntoIterator<Item = (&'a Value, &'a Value)>,
{
    for (i, (key, value)) in pairs.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{key}: {value}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            Self::Set(items) => {
                f.write_str("{")?;
                write_joined(f, items)?;
                f.write_str("}")
            }
            Self::Dict(entries) => {
                f.write_str("{")?;
                write_pairs(f, entries)?;
                f.write_str("}")
            }
            Self::PVector(items) => {
                f.write_str("pvector([")?;
                write_joined(f, items)?;
                f.write_str("])")
            }
            Self::PSet(items) => {
                f.write_str("pset([")?;
                write_joined(f, items)?;
                f.write_str("])")
            }
            Self::PMap(entries) => {
                f.write_str("pmap({")?;
                write_pairs(f, entries)?;
                f.write_str("})")
            }
            Self::Checked(c) => write!(f, "{c}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s.into())
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}

impl From<PVector<Self>> for Value {
    fn from(items: PVector<Self>) -> Self {
        Self::PVector(items)
    }
}

impl From<PSet<Self>> for Value {
    fn from(items: PSet<Self>) -> Self {
        Self::PSet(items)
    }
}

impl From<PMap<Self, Self>> for Value {
    fn from(entries: PMap<Self, Self>) -> Self {
        Self::PMap(entries)
    }
}

impl From<Checked> for Value {
    fn from(c: Checked) -> Self {
        Self::Checked(c)
    }
}

impl From<CheckedSet> for Value {
    fn from(s: CheckedSet) -> Self {
        Self::Checked(Checked::Set(s))
    }
}

impl From<CheckedVector> for Value {
    fn from(v: CheckedVector) -> Self {
        Self::Checked(Checked::Vector(v))
    }
}

impl From<CheckedMap> for Value {
    fn from(m: CheckedMap) -> Self {
        Self::Checked(Checked::Map(m))
    }
}
