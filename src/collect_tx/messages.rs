/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Messages exchanged during a transaction collection run.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::types::data_types::{ClientTransaction, CryptoHash, ProtocolVersion};

/// Sent by the root to itself, and forwarded by every node to its children.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CollectTxRequest {
    pub skipchain_id: CryptoHash,
    pub latest_id: CryptoHash,
    pub max_num_txs: u32,
    /// The root's protocol version.
    pub version: ProtocolVersion,
}

impl CollectTxRequest {
    /// The maximum number of transactions a node should respond with, or `None` for no bound.
    ///
    /// Requests declaring version 0 predate bounding, so their `max_num_txs` is not meaningful.
    pub fn tx_bound(&self) -> Option<usize> {
        if self.version.supports_tx_bound() {
            Some(self.max_num_txs as usize)
        } else {
            None
        }
    }
}

/// Sent by every node to the root.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CollectTxResponse {
    pub txs: Vec<ClientTransaction>,
    /// The responding node's protocol version.
    pub version: ProtocolVersion,
}
