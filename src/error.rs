//! Error types surfaced by checked collections.
//!
//! Structural operations on the persistent collections never fail; the only
//! exception is an out-of-range vector write. Everything else comes from
//! the checked layer and leaves every existing collection untouched.

use thiserror::Error;

use crate::value::{Value, ValueKind};

/// Convenience alias used throughout the checked layer.
pub type Result<T, E = CheckedError> = std::result::Result<T, E>;

/// Any failure of a checked operation.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum CheckedError {
    /// An element's runtime type is not accepted by the class.
    #[error(transparent)]
    ValueType(#[from] ValueTypeError),

    /// One or more invariants rejected the candidate elements.
    #[error(transparent)]
    Invariant(#[from] InvariantError),

    /// A vector write targeted a missing position.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Reconstruction named a class the registry does not know.
    #[error("no checked class named `{0}` is registered")]
    UnknownClass(String),

    /// Reconstruction arguments have the wrong shape for the class.
    #[error("class `{class}` cannot be rebuilt from {found}")]
    ArgumentKind {
        /// Name of the class being rebuilt.
        class: String,
        /// Shape of the arguments that were supplied.
        found: &'static str,
    },
}

/// An element failed the class's type constraint.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{class}: {value} has type {actual}, expected one of [{}]", .expected.join(", "))]
pub struct ValueTypeError {
    /// Name of the checked class doing the validation.
    pub class: String,
    /// The rejected value.
    pub value: Value,
    /// Runtime type of the rejected value.
    pub actual: ValueKind,
    /// Names of the accepted types.
    pub expected: Vec<String>,
}

/// Invariants rejected the candidate collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{class}: invariant violated: {}", .messages.join("; "))]
pub struct InvariantError {
    /// Name of the checked class doing the validation.
    pub class: String,
    /// Every failure message, in element order then declaration order.
    pub messages: Vec<String>,
}

/// A vector position outside `0..len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("index {index} out of range for vector of length {len}")]
pub struct IndexError {
    /// The requested position.
    pub index: usize,
    /// Length of the vector at the time of the request.
    pub len: usize,
}
