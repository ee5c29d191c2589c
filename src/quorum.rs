/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Byzantine fault threshold arithmetic, and the [`QuorumBuffer`] that counts reported values against
//! it.
//!
//! ## Fault threshold
//!
//! For a tree of `n` nodes, the number of faulty or unresponsive nodes tolerated is
//! `f = max(0, floor((n - 1) / 3) - 1)`. A quorum is any set of at least `n - 1 - f` nodes. The same
//! arithmetic is used both to accept a collective signature (see [`ThresholdPolicy`]) and to decide
//! whether a reported protocol version is agreed upon (see [`QuorumBuffer`]).

use std::{collections::HashMap, hash::Hash};

/// Number of faulty nodes tolerated in a tree of `n` nodes: `max(0, floor((n - 1) / 3) - 1)`.
pub fn max_faulty(n: usize) -> usize {
    (n.saturating_sub(1) / 3).saturating_sub(1)
}

/// Minimum number of agreeing nodes that forms a quorum in a tree of `n` nodes: `n - 1 - f`.
pub fn quorum_threshold(n: usize) -> usize {
    n.saturating_sub(1).saturating_sub(max_faulty(n))
}

/// Acceptance policy for collective signatures: a signature is acceptable if at least
/// [`threshold`](Self::threshold) signers contributed to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThresholdPolicy {
    threshold: usize,
}

impl ThresholdPolicy {
    /// A policy requiring at least `threshold` signers.
    pub const fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// The Byzantine fault tolerant policy for a tree of `n` nodes, requiring
    /// [`quorum_threshold(n)`](quorum_threshold) signers.
    pub fn bft(n: usize) -> Self {
        Self::new(quorum_threshold(n))
    }

    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    /// Check whether `signers` contributions satisfy this policy.
    pub const fn check(&self, signers: usize) -> bool {
        signers >= self.threshold
    }
}

/// Maps each reporting node to the last value it reported, and answers whether a value has the
/// support of a quorum.
///
/// A fresh buffer is created for every run and discarded when the run ends. Only one entry is kept per
/// node: a later report from the same node overwrites its earlier one, so a single node can never
/// count twice toward a value.
pub struct QuorumBuffer<K: Eq + Hash, V: Eq> {
    threshold: usize,
    reports: HashMap<K, V>,
}

impl<K: Eq + Hash, V: Eq> QuorumBuffer<K, V> {
    /// Create an empty buffer in which `threshold` distinct reporters form a quorum.
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            reports: HashMap::new(),
        }
    }

    /// Create an empty buffer whose quorum is computed from the size `n` of the tree, using the same
    /// fault arithmetic as [`ThresholdPolicy::bft`].
    pub fn for_tree_size(n: usize) -> Self {
        Self::new(quorum_threshold(n))
    }

    /// Record that `reporter` reported `value`. Returns the value `reporter` previously reported, if any.
    pub fn add(&mut self, reporter: K, value: V) -> Option<V> {
        self.reports.insert(reporter, value)
    }

    /// Number of distinct reporters whose latest report equals `value`.
    pub fn support(&self, value: &V) -> usize {
        self.reports.values().filter(|v| *v == value).count()
    }

    /// Whether `value` is supported by at least [`threshold`](Self::threshold) distinct reporters.
    pub fn has_threshold(&self, value: &V) -> bool {
        self.support(value) >= self.threshold
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of distinct reporters seen so far.
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
