/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types that store the identities of the nodes taking part in a protocol run.

use std::{collections::HashSet, slice};

use super::{
    crypto_primitives::{CryptoHasher, Digest, VerifyingKey},
    data_types::CryptoHash,
};

/// The identity of a single node: its public key and the network address it can be reached at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerIdentity {
    public: VerifyingKey,
    address: String,
}

impl ServerIdentity {
    /// Create a new `ServerIdentity`.
    pub fn new(public: VerifyingKey, address: impl Into<String>) -> Self {
        Self {
            public,
            address: address.into(),
        }
    }

    /// Get the public key of this node.
    pub fn public(&self) -> &VerifyingKey {
        &self.public
    }

    /// Get the network address of this node.
    pub fn address(&self) -> &str {
        &self.address
    }
}

/// Ordered set of node identities.
///
/// ## Ordering of identities
///
/// Unlike a set sorted by public key, a `Roster` keeps its identities in **insertion order**. This order
/// defines the shape of every [`Tree`](super::tree::Tree) built over the roster (the first identity
/// becomes the root), and the position of each node's slot in a
/// [`CollectiveSignature`](crate::cosi::CollectiveSignature).
///
/// A roster is immutable once built, and is never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Roster {
    list: Vec<ServerIdentity>,
}

impl Roster {
    /// Build a roster from `identities`, keeping their order.
    ///
    /// Fails if `identities` is empty or contains the same public key twice.
    pub fn new(identities: Vec<ServerIdentity>) -> Result<Roster, RosterError> {
        if identities.is_empty() {
            return Err(RosterError::Empty);
        }

        let mut seen = HashSet::new();
        for identity in &identities {
            if !seen.insert(identity.public) {
                return Err(RosterError::DuplicateIdentity {
                    public: identity.public,
                });
            }
        }

        Ok(Roster { list: identities })
    }

    /// Get an iterator through the identities, in roster order.
    pub fn identities(&self) -> slice::Iter<ServerIdentity> {
        self.list.iter()
    }

    /// Get the first identity, which is the root of every tree built over the roster.
    pub fn leader(&self) -> &ServerIdentity {
        &self.list[0]
    }

    /// Get the identity at position `index`, if any.
    pub fn get(&self, index: usize) -> Option<&ServerIdentity> {
        self.list.get(index)
    }

    /// Get the public keys of every identity, in roster order.
    pub fn publics(&self) -> Vec<VerifyingKey> {
        self.list.iter().map(|identity| identity.public).collect()
    }

    /// Get the position of `public` in the roster, if it is in the roster.
    pub fn position(&self, public: &VerifyingKey) -> Option<usize> {
        self.list
            .iter()
            .position(|identity| identity.public == *public)
    }

    /// Check whether the roster contains `public`.
    pub fn contains(&self, public: &VerifyingKey) -> bool {
        self.position(public).is_some()
    }

    /// Get the number of identities in the roster.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Always `false`: rosters cannot be empty. Provided for API symmetry with [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// SHA256 hash over the ordered identities (public key followed by address, for each identity).
    pub fn id(&self) -> CryptoHash {
        let mut hasher = CryptoHasher::new();
        for identity in &self.list {
            hasher.update(identity.public.to_bytes());
            hasher.update((identity.address.len() as u64).to_le_bytes());
            hasher.update(identity.address.as_bytes());
        }
        CryptoHash::new(hasher.finalize().into())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RosterError {
    Empty,
    DuplicateIdentity { public: VerifyingKey },
}
