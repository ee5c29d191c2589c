//! Types and traits that are used across multiple protocols of this crate.
//!
//! Types specific to a single protocol can be found in that protocol's module, e.g.,
//! [`crate::collect_tx::messages`].

pub mod crypto_primitives;

pub mod data_types;

pub mod roster;

pub mod tree;
