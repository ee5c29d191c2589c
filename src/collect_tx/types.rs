/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Configuration, outputs, and errors of a [transaction collection run](super::protocol::CollectTx).

use std::{sync::mpsc::Receiver, time::Duration};

use typed_builder::TypedBuilder;

use crate::{
    instance::Trigger,
    networking::network::SendError,
    types::data_types::{ClientTransaction, ProtocolVersion},
};

/// Tunables of a collection run.
#[derive(Clone, Debug, TypedBuilder)]
#[builder(builder_method(doc = "
    Create a builder for building a [CollectTxConfiguration]. On the builder call the following methods to construct a valid [CollectTxConfiguration].

    Optional:
    - `.request_timeout(...)`
    - `.collect_deadline(...)`
    - `.max_num_txs(...)`
"))]
pub struct CollectTxConfiguration {
    #[builder(default = Duration::from_secs(10), setter(doc = "Set how long every node waits for the request to arrive. Defaults to 10 seconds. Optional."))]
    pub request_timeout: Duration,
    #[builder(default, setter(strip_option, doc = "Set an overall bound on how long the root waits for responses. Defaults to no bound. Optional."))]
    pub collect_deadline: Option<Duration>,
    #[builder(default = 100, setter(doc = "Set the default maximum number of transactions per node. Defaults to 100. Optional."))]
    pub max_num_txs: u32,
}

impl Default for CollectTxConfiguration {
    fn default() -> Self {
        CollectTxConfiguration::builder().build()
    }
}

/// The receiving ends of a collection run, and its finish handle.
///
/// Only the root's outputs produce values. The transaction stream ends when the root is done; the
/// common version is delivered at most once, after the stream ends.
pub struct CollectTxOutputs {
    pub txs: Receiver<Vec<ClientTransaction>>,
    pub common_version: Receiver<ProtocolVersion>,
    pub finish: FinishHandle,
}

/// Handle for ending a collection run early. The root stops waiting for responses and checks the
/// versions received so far.
pub struct FinishHandle(pub(crate) Trigger);

impl FinishHandle {
    pub fn finish(self) {
        self.0.fire()
    }
}

#[derive(Debug)]
pub enum CollectTxError {
    /// `start` was called on a node other than the root.
    NotRoot,

    /// `start` was called before the skipchain ID was set.
    MissingSkipchainID,

    /// `start` was called before the latest block ID was set.
    MissingLatestID,

    /// The request did not arrive within the request timeout.
    Timeout,

    /// Sending a message that the run cannot do without failed.
    Send(SendError),

    /// The inbox of this instance was disconnected.
    Disconnected,
}

impl From<SendError> for CollectTxError {
    fn from(value: SendError) -> Self {
        CollectTxError::Send(value)
    }
}
