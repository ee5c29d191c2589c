/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The rooted spanning tree over a [`Roster`] that protocols use for fan-out and aggregation.
//!
//! ## Layout
//!
//! Trees are laid out like an n-ary heap over the roster order: node 0 is the root, and the children
//! of node `i` are nodes `b*i + 1 ..= b*i + b` (those that exist), where `b` is the branching factor.
//! Consequently the parent of node `i > 0` is node `(i - 1) / b`.
//!
//! Nodes are addressed by their index in the roster. A tree is built once per protocol run and never
//! changes during the run.

use std::ops::Range;

use super::{
    crypto_primitives::{CryptoHasher, Digest, VerifyingKey},
    data_types::CryptoHash,
    roster::{Roster, ServerIdentity},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tree {
    roster: Roster,
    branching_factor: usize,
    id: CryptoHash,
}

impl Tree {
    /// Build a tree over `roster` in which every inner node has (up to) `branching_factor` children.
    ///
    /// A `branching_factor` of 0 is only accepted for single-node rosters.
    pub fn new(roster: Roster, branching_factor: usize) -> Result<Tree, TreeError> {
        if branching_factor == 0 && roster.len() > 1 {
            return Err(TreeError::ZeroBranchingFactor);
        }
        Ok(Tree::build(roster, branching_factor))
    }

    /// Build a star: the root is the parent of every other node.
    pub fn flat(roster: Roster) -> Tree {
        let branching_factor = roster.len().saturating_sub(1).max(1);
        Tree::build(roster, branching_factor)
    }

    fn build(roster: Roster, branching_factor: usize) -> Tree {
        let id = {
            let mut hasher = CryptoHasher::new();
            hasher.update(roster.id().bytes());
            hasher.update((branching_factor as u64).to_le_bytes());
            CryptoHash::new(hasher.finalize().into())
        };

        Tree {
            roster,
            branching_factor,
            id,
        }
    }

    /// Identifier of this tree, derived from the roster and the branching factor.
    pub fn id(&self) -> CryptoHash {
        self.id
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn branching_factor(&self) -> usize {
        self.branching_factor
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        self.roster.len()
    }

    /// Index of the root node. Always 0.
    pub const fn root(&self) -> usize {
        0
    }

    /// Public key of the root node.
    pub fn root_public(&self) -> &VerifyingKey {
        self.roster.leader().public()
    }

    pub fn is_root(&self, index: usize) -> bool {
        index == self.root()
    }

    /// Get the identity of the node at `index`.
    pub fn node(&self, index: usize) -> Option<&ServerIdentity> {
        self.roster.get(index)
    }

    /// Get the index of the node identified by `public`, if it is in the tree.
    pub fn position(&self, public: &VerifyingKey) -> Option<usize> {
        self.roster.position(public)
    }

    /// Public keys of every node, in roster order.
    pub fn publics(&self) -> Vec<VerifyingKey> {
        self.roster.publics()
    }

    /// Get the parent of the node at `index`. `None` for the root, and for indices outside the tree.
    pub fn parent(&self, index: usize) -> Option<usize> {
        if index == self.root() || index >= self.size() {
            None
        } else {
            Some((index - 1) / self.branching_factor)
        }
    }

    /// Get the direct children of the node at `index`, in roster order.
    pub fn children(&self, index: usize) -> Range<usize> {
        if index >= self.size() {
            return 0..0;
        }
        let first = index
            .saturating_mul(self.branching_factor)
            .saturating_add(1)
            .min(self.size());
        let end = first.saturating_add(self.branching_factor).min(self.size());
        first..end
    }

    pub fn is_leaf(&self, index: usize) -> bool {
        self.children(index).is_empty()
    }

    /// Number of nodes in the subtree rooted at `index`, `index` itself included.
    pub fn subtree_size(&self, index: usize) -> usize {
        if index >= self.size() {
            return 0;
        }
        1 + self
            .children(index)
            .map(|child| self.subtree_size(child))
            .sum::<usize>()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum TreeError {
    ZeroBranchingFactor,
}
