/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions of the inputs and outputs of the [two-phase protocol](super::protocol::BftCosi).

use typed_builder::TypedBuilder;

use crate::cosi::{CollectiveSignature, CosiError};

/// The output of a two-phase run.
///
/// On success, `msg` is the candidate message and `sig` is the commit signature over it. When the
/// prepare signature fails verification, both are empty: see [`is_failure`](Self::is_failure).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalSignature {
    pub msg: Vec<u8>,
    pub sig: Option<CollectiveSignature>,
}

impl FinalSignature {
    pub(crate) fn failure() -> FinalSignature {
        FinalSignature {
            msg: Vec::new(),
            sig: None,
        }
    }

    /// Whether this is the "consensus failed" sentinel.
    pub fn is_failure(&self) -> bool {
        self.sig.is_none()
    }
}

/// How a collective-signing round may partition the tree into subtrees, each managed by a sub-leader.
///
/// Partitioning only affects fan-out. The fault threshold is always computed from the size of the
/// whole tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubtreePolicy {
    /// Do not partition.
    Flat,

    /// One subtree per `k` nodes, rounded down.
    NodesPerSubtree(usize),

    /// Always the given number of subtrees.
    Fixed(usize),
}

impl SubtreePolicy {
    /// Number of subtrees to hint for a tree of `n` nodes. 0 means "do not partition".
    pub fn subtree_count(&self, n: usize) -> usize {
        match *self {
            SubtreePolicy::Flat => 0,
            SubtreePolicy::NodesPerSubtree(0) => 0,
            SubtreePolicy::NodesPerSubtree(k) => n / k,
            SubtreePolicy::Fixed(count) => count,
        }
    }
}

impl Default for SubtreePolicy {
    fn default() -> Self {
        SubtreePolicy::NodesPerSubtree(10)
    }
}

/// Tunables of the [two-phase protocol](super::protocol::BftCosi).
#[derive(Clone, Debug, TypedBuilder)]
#[builder(builder_method(doc = "
    Create a builder for building a [BftCosiConfiguration]. On the builder call the following methods to construct a valid [BftCosiConfiguration].

    Optional:
    - `.subtree_policy(...)`
"))]
pub struct BftCosiConfiguration {
    #[builder(default, setter(doc = "Set how each round partitions the tree. Defaults to one sub-leader per 10 nodes. Optional."))]
    pub subtree_policy: SubtreePolicy,
}

impl Default for BftCosiConfiguration {
    fn default() -> Self {
        BftCosiConfiguration::builder().build()
    }
}

#[derive(Debug)]
pub enum BftCosiError {
    /// `start` or `dispatch` was called on a node other than the root.
    NotRoot,

    /// `start` was called before a candidate message was set.
    MissingMessage,

    /// `start` was called a second time.
    AlreadyStarted,

    /// `dispatch` was called before `start`.
    NotStarted,

    /// A collective-signing round could not be initialized or started.
    Cosi(CosiError),

    /// A collective-signing round ended without delivering its signature.
    SignatureChannelClosed,
}

impl From<CosiError> for BftCosiError {
    fn from(value: CosiError) -> Self {
        BftCosiError::Cosi(value)
    }
}
