//! Bucket-level primitives used by the store.

pub mod get;
pub mod insert;
pub mod remove;
