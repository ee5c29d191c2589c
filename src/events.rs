//! Definitions of the events emitted by the protocols in this crate, for event handling and logging.
//!
//! Note: an event for a given action indicates that the action has been completed.
//!
//! Every protocol takes an optional `Sender<Event>` at construction. To consume events, start an
//! [event bus](crate::event_bus) and pass the sender it returns to the protocols.

use std::{sync::mpsc::Sender, time::SystemTime};

use ed25519_dalek::VerifyingKey;

use crate::{
    cosi::Phase,
    types::data_types::{CryptoHash, ProtocolVersion},
};

pub enum Event {
    // Two-phase collective signing events.
    StartPhase(StartPhaseEvent),
    EndPhase(EndPhaseEvent),
    RejectPrepare(RejectPrepareEvent),
    FinishBftCosi(FinishBftCosiEvent),
    // Transaction collection events.
    StartCollectTx(StartCollectTxEvent),
    ReceiveTxResponse(ReceiveTxResponseEvent),
    DropTxBatch(DropTxBatchEvent),
    AgreeVersion(AgreeVersionEvent),
    // Substrate events.
    SendFailure(SendFailureEvent),
}

impl Event {
    pub(crate) fn publish(event_publisher: &Option<Sender<Event>>, event: Event) {
        if let Some(event_publisher) = event_publisher {
            // A stopped event bus must not affect the protocol.
            let _ = event_publisher.send(event);
        }
    }
}

/// The root started a collective-signing round.
pub struct StartPhaseEvent {
    pub timestamp: SystemTime,
    pub phase: Phase,
    pub subtrees: usize,
}

/// The root received the signature of a collective-signing round.
pub struct EndPhaseEvent {
    pub timestamp: SystemTime,
    pub phase: Phase,
    pub participants: usize,
}

/// The prepare signature did not pass verification, so the commit phase will not run.
pub struct RejectPrepareEvent {
    pub timestamp: SystemTime,
    pub participants: usize,
    pub threshold: usize,
}

/// The root emitted its final signature. `success` is `false` for the failure sentinel.
pub struct FinishBftCosiEvent {
    pub timestamp: SystemTime,
    pub success: bool,
}

/// The root started collecting transactions.
pub struct StartCollectTxEvent {
    pub timestamp: SystemTime,
    pub skipchain_id: CryptoHash,
    pub latest_id: CryptoHash,
    pub max_num_txs: u32,
    pub version: ProtocolVersion,
}

/// The root received (or produced, for itself) a node's pending transactions.
pub struct ReceiveTxResponseEvent {
    pub timestamp: SystemTime,
    pub origin: VerifyingKey,
    pub num_txs: usize,
    pub version: ProtocolVersion,
}

/// The root dropped a node's batch because it exceeded the maximum transaction count.
pub struct DropTxBatchEvent {
    pub timestamp: SystemTime,
    pub origin: VerifyingKey,
    pub num_txs: usize,
    pub max_num_txs: u32,
}

/// A quorum of nodes reported the root's version, which is now the common version.
pub struct AgreeVersionEvent {
    pub timestamp: SystemTime,
    pub version: ProtocolVersion,
    pub support: usize,
}

/// A delivery attempt to a child failed. The run continues.
pub struct SendFailureEvent {
    pub timestamp: SystemTime,
    pub peer: Option<VerifyingKey>,
    pub reason: String,
}
