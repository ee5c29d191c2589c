//! Agreement protocols for a ledger whose nodes are arranged in a tree.
//!
//! This crate provides two protocols that a leader runs, one after the other, to propose a block:
//! 1. [Transaction collection](collect_tx): gather the pending transactions of every node and agree on a
//!    common protocol version.
//! 2. [Two-phase collective signing](bftcosi): obtain a quorum-certified signature over the proposal.
//!
//! Both decide what a quorum is with the same [fault arithmetic](quorum). A third, smaller protocol
//! [counts](count) the reachable nodes of a tree.
//!
//! ## Pluggables
//!
//! The host supplies:
//! - The transport, as an implementation of [`Network`](networking::network::Network).
//! - The single-round collective-signing primitive, as an implementation of
//!   [`CollectiveSigning`](cosi::CollectiveSigning).
//! - Each node's [pending transactions](collect_tx::app::TxPool) and
//!   [protocol version](collect_tx::app::VersionProvider).
//!
//! Every protocol runs as one [instance](instance) per node and per run.

pub mod types;

pub mod quorum;

pub mod cosi;

pub mod networking;

pub mod instance;

pub mod events;

pub mod logging;

pub mod event_bus;

pub mod bftcosi;

pub mod collect_tx;

pub mod count;
