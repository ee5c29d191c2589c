/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The contract of the single-round collective-signing primitive.
//!
//! A single collective-signing round takes a message and a tree, and (asynchronously) produces a
//! [`CollectiveSignature`] over the message from the live signers of the tree. Signers that fail to
//! respond degrade the signature (their slot stays empty) but do not abort the round.
//!
//! This crate does not implement the round itself: it is supplied by the host as an implementation of
//! [`CollectiveSigning`]. What this module does define is the shape of a round's inputs and output, and
//! how an output is [verified](CollectiveSignature::verify) against a [`ThresholdPolicy`].

use std::sync::{mpsc::Receiver, Arc};

use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    quorum::ThresholdPolicy,
    types::{
        crypto_primitives::{Signature, Verifier, VerifyingKey},
        data_types::SignatureBytes,
        tree::Tree,
    },
};

/// The phase of the two-phase protocol that a collective-signing round belongs to.
///
/// Hosts typically run a different verification function on the signers in each phase: in `Prepare`,
/// signers check that the proposal is valid; in `Commit`, signers acknowledge that a quorum has seen it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub enum Phase {
    Prepare,
    Commit,
}

/// Everything a collective-signing round needs to start.
#[derive(Clone)]
pub struct CosiRound {
    /// Which phase this round belongs to.
    pub phase: Phase,

    /// The bytes every signer signs.
    pub message: Vec<u8>,

    /// Auxiliary bytes that signers may use to verify `message`. Never signed.
    pub data: Vec<u8>,

    /// The tree of signers.
    pub tree: Arc<Tree>,

    /// Number of subtrees the round may split the tree into, each managed by one sub-leader. A hint for
    /// fan-out scalability only: 0 means "do not split".
    pub subtrees: usize,
}

/// A pluggable single-round collective-signing primitive.
pub trait CollectiveSigning: Send {
    /// Start a round over `round.message` across `round.tree`.
    ///
    /// On success, returns the receiving end of a channel on which the round's signature will be
    /// delivered exactly once. Returns an error if the round could not be initialized or started.
    fn run(&mut self, round: CosiRound) -> Result<Receiver<CollectiveSignature>, CosiError>;
}

/// Error when a collective-signing round could not be initialized or started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CosiError {
    /// The round could not be instantiated, e.g., because its protocol is not available on the host.
    Init(String),

    /// The round was instantiated but could not be started.
    Start(String),
}

/// Aggregated signature over one message, with one slot per node of the tree it was collected over.
///
/// The slot at position `i` holds the signature of the node at position `i` of the tree's
/// [roster](crate::types::roster::Roster), or `None` if that node did not contribute.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CollectiveSignature(Vec<Option<SignatureBytes>>);

impl CollectiveSignature {
    /// Create a new `CollectiveSignature` initially containing `len` empty slots.
    pub fn new(len: usize) -> Self {
        Self(vec![None; len])
    }

    /// Put `signature` into the slot at `pos`. Returns `false` (and does nothing) if `pos` is out of range.
    pub fn set(&mut self, pos: usize, signature: Option<SignatureBytes>) -> bool {
        match self.0.get_mut(pos) {
            Some(slot) => {
                *slot = signature;
                true
            }
            None => false,
        }
    }

    /// Get the slot at `pos`, if `pos` is in range.
    pub fn get(&self, pos: usize) -> Option<&Option<SignatureBytes>> {
        self.0.get(pos)
    }

    /// Number of slots, which equals the size of the tree the signature was collected over.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of non-empty slots.
    pub fn participants(&self) -> usize {
        self.0.iter().filter(|slot| slot.is_some()).count()
    }

    /// Checks that every contribution in the signature is a correct signature of `message` by the
    /// corresponding key in `publics`, and that the contributions satisfy `policy`.
    ///
    /// Returns the number of valid contributions.
    pub fn verify(
        &self,
        publics: &[VerifyingKey],
        message: &[u8],
        policy: &ThresholdPolicy,
    ) -> Result<usize, VerifyError> {
        if self.0.len() != publics.len() {
            return Err(VerifyError::LengthMismatch {
                expected: publics.len(),
                actual: self.0.len(),
            });
        }

        let mut signers = 0;
        for (position, (slot, public)) in self.0.iter().zip(publics).enumerate() {
            if let Some(signature) = slot {
                let signature = Signature::from_bytes(&signature.bytes());
                if public.verify(message, &signature).is_err() {
                    return Err(VerifyError::InvalidSignature { position });
                }
                signers += 1;
            }
        }

        if policy.check(signers) {
            Ok(signers)
        } else {
            Err(VerifyError::BelowThreshold {
                signers,
                threshold: policy.threshold(),
            })
        }
    }
}

/// Reasons for rejecting a [`CollectiveSignature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The signature does not have exactly one slot per public key.
    LengthMismatch { expected: usize, actual: usize },

    /// The contribution at `position` is not a correct signature of the message.
    InvalidSignature { position: usize },

    /// Every contribution is correct, but there are too few of them.
    BelowThreshold { signers: usize, threshold: usize },
}
