//! Persistent collections with structural sharing, and a checked layer that
//! validates their elements.
//!
//! [`PSet`] and [`PMap`] sit on a bucketed hash [`Store`](store::Store)
//! whose buckets live in a [`PVector`]. Every write returns a new value
//! that shares all untouched buckets with the old one. An [`Evolver`]
//! batches writes into a private working copy and hands back the original
//! object when the batch made no net change.
//!
//! Checked classes ([`SetClass`], [`VectorClass`], [`MapClass`]) attach
//! accepted element types, invariants and a serializer to a collection kind.
//! Their instances serialize recursively to plain collections and reduce to
//! constructor arguments that a [`ClassRegistry`] can rebuild.
//!
//! # Key properties
//!
//! - **Persistence**: old values stay valid and unchanged after every write
//! - **O(1) structural inequality**: via incrementally maintained `AdHash`
//! - **COW structural sharing**: cheap clone, copy-on-write per node
//! - **Identity on no-op batches**: `evolver().persistent()` returns `self`
//! - **Zero `unsafe`**: enforced by `#![forbid(unsafe_code)]`
//!
//! # References
//!
//! - Bagwell, 2000: "Fast and Space Efficient Trie Searches"
//! - Bellare & Micciancio, 1997: "A New Paradigm for Collision-Free
//!   Hashing: Incrementality at Reduced Cost"

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod adhash;
pub mod checked;
pub mod error;
pub mod iter;
pub mod node;
pub mod pickle;
pub mod store;
pub mod value;

mod evolver;
mod map;
mod ops;
mod set;
mod vector;

#[cfg(test)]
mod tests;

pub use checked::{
    AnyClass, Checked, CheckedMap, CheckedMapEvolver, CheckedSet, CheckedSetEvolver,
    CheckedType, CheckedVector, CheckedVectorEvolver, ElementType, Invariant, MapClass,
    PairInvariant, PairSerializer, Serializer, SetClass, TypeSpec, VectorClass,
};
pub use error::{CheckedError, IndexError, InvariantError, Result, ValueTypeError};
pub use evolver::{
    Evolver, EvolverCheckpoint, MapEvolver, Persistent, SetEvolver, VectorEvolver,
};
pub use map::PMap;
pub use pickle::{ClassRegistry, Pickled, Reduced, ReducedArgs};
pub use set::PSet;
pub use store::StoreConfig;
pub use value::{Value, ValueKind};
pub use vector::PVector;
