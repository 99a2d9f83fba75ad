//! # Grove Wire
//!
//! The wire-level data model exchanged with a remote entity store:
//! hierarchical [`Key`]s, schema-less [`Entity`] records, and the
//! closed set of [`Value`] variants a property may carry.
//!
//! This crate owns only the shape of the data. How an [`Entity`]
//! reaches the store (transport, authentication, query framing) is
//! a concern of external collaborators; they produce and consume
//! sequences of `Entity` values keyed by `Key`.

mod entity;
mod error;
mod key;

pub use entity::{Entity, Meaning, Property, Value, MAX_INDEXED_PROPERTIES};
pub use error::{WireError, WireResult};
pub use key::{Key, KeyId, PathElement, Reference};
