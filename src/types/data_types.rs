/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types that exist only to store bytes or small integers, and do not have any major "active" behavior.

use std::fmt::{self, Debug, Display, Formatter};

use borsh::{BorshDeserialize, BorshSerialize};

/// 32-byte cryptographic hash.
///
/// Within this crate, `CryptoHash`-es identify three things:
/// 1. Chains (skipchains) that a collection run targets.
/// 2. The latest block known to the leader when it starts a collection run.
/// 3. [`Tree`](super::tree::Tree)s, whose ID is always a SHA256 hash over the ordered roster.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, BorshDeserialize, BorshSerialize)]
pub struct CryptoHash([u8; 32]);

impl CryptoHash {
    /// Create a new `CryptoHash` wrapping `bytes`.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the inner `[u8; 32]` value of this `CryptoHash`.
    pub const fn bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl Display for CryptoHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Debug for CryptoHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Ed25519 digital signature.
///
/// These are produced using the [`ed25519_dalek`] crate, whose main definitions are re-exported from
/// the [`crypto_primitives`](super::crypto_primitives) module.
#[derive(Clone, Copy, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct SignatureBytes([u8; 64]);

impl SignatureBytes {
    /// Create a new `SignatureBytes` wrapping `bytes`.
    pub fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get the inner `[u8; 64]` value of this `SignatureBytes`.
    pub const fn bytes(&self) -> [u8; 64] {
        self.0
    }
}

impl Debug for SignatureBytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Protocol version reported by a node.
///
/// Versions gate behavior differences between nodes running different releases. Version 0 predates
/// transaction-count bounding: a request declaring version 0 carries no meaningful maximum, and a
/// response declaring version 0 is never dropped for being too large.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize,
)]
pub struct ProtocolVersion(u32);

impl ProtocolVersion {
    /// The version that predates transaction-count bounding.
    pub const UNBOUNDED: ProtocolVersion = ProtocolVersion(0);

    /// Create a new `ProtocolVersion` wrapping `int`.
    pub const fn new(int: u32) -> Self {
        Self(int)
    }

    /// Get the inner `u32` value of this `ProtocolVersion`.
    pub const fn int(&self) -> u32 {
        self.0
    }

    /// Whether nodes on this version understand the maximum transaction count of a request.
    pub const fn supports_tx_bound(&self) -> bool {
        self.0 > 0
    }
}

impl Display for ProtocolVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// An opaque, client-submitted transaction waiting to be included in a block.
#[derive(Clone, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub struct ClientTransaction(Vec<u8>);

impl ClientTransaction {
    /// Create a new `ClientTransaction` wrapping `bytes`.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get a reference to the bytes of this transaction.
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}
