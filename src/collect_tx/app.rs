/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Node-local capabilities a collection run draws on, injected at construction.
//!
//! Each node of the tree gives its instance of [`CollectTx`](super::protocol::CollectTx):
//! - A [`TxPool`], which knows the node's pending transactions.
//! - A [`VersionProvider`], which knows the node's protocol version.

use ed25519_dalek::VerifyingKey;

use crate::types::data_types::{ClientTransaction, CryptoHash, ProtocolVersion};

use super::messages::CollectTxRequest;

/// Source of the transactions a node has received from clients but not yet seen committed.
pub trait TxPool: Send {
    /// Get the pending transactions to report to the leader.
    ///
    /// Implementations must return no more than [`max_num_txs`](PendingTxsRequest::max_num_txs)
    /// transactions when it is `Some`. The batch is passed to the leader as returned, and the leader
    /// drops a larger batch whole.
    fn pending_txs(&mut self, request: PendingTxsRequest) -> Vec<ClientTransaction>;
}

/// Source of the local protocol version.
pub trait VersionProvider: Send {
    fn version(&self) -> ProtocolVersion;
}

/// A [`VersionProvider`] that always reports the same version.
#[derive(Clone, Copy, Debug)]
pub struct StaticVersion(pub ProtocolVersion);

impl VersionProvider for StaticVersion {
    fn version(&self) -> ProtocolVersion {
        self.0
    }
}

/// Request for the pending transactions of a node.
pub struct PendingTxsRequest<'a> {
    leader: &'a VerifyingKey,
    request: &'a CollectTxRequest,
}

impl<'a> PendingTxsRequest<'a> {
    pub(crate) fn new(leader: &'a VerifyingKey, request: &'a CollectTxRequest) -> Self {
        Self { leader, request }
    }

    /// The root of the run, which will propose the block.
    pub fn leader(&self) -> &VerifyingKey {
        self.leader
    }

    pub fn skipchain_id(&self) -> &CryptoHash {
        &self.request.skipchain_id
    }

    pub fn latest_id(&self) -> &CryptoHash {
        &self.request.latest_id
    }

    /// The maximum number of transactions requested, or `None` if the request predates bounding.
    pub fn max_num_txs(&self) -> Option<usize> {
        self.request.tx_bound()
    }
}
