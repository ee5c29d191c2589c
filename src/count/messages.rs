/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

use borsh::{BorshDeserialize, BorshSerialize};

use crate::types::data_types::CryptoHash;

/// Sent down the tree to start counting.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Announce {
    /// [ID](crate::types::tree::Tree::id) of the tree being counted.
    pub tree_id: CryptoHash,
}

/// Sent up the tree with the number of reachable nodes in the sender's subtree.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Reply {
    pub subtree_size: u32,
}
