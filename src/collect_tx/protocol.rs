/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! One node's instance of a transaction collection run.

use std::{
    sync::mpsc::{self, Sender},
    time::{Instant, SystemTime},
};

use ed25519_dalek::VerifyingKey;

use crate::{
    events::*,
    instance::{signal, ProtocolInstance, SignalListener, TreeNodeInstance, WaitError},
    networking::{messages::Message, network::Network},
    quorum::QuorumBuffer,
    types::data_types::{ClientTransaction, CryptoHash, ProtocolVersion},
};

use super::{
    app::{PendingTxsRequest, TxPool, VersionProvider},
    messages::{CollectTxRequest, CollectTxResponse},
    types::{CollectTxConfiguration, CollectTxError, CollectTxOutputs, FinishHandle},
};

/// An instance of a collection run, on one node of the tree.
pub struct CollectTx<N: Network, P: TxPool, V: VersionProvider> {
    node: TreeNodeInstance<N>,
    tx_pool: P,
    version_provider: V,
    config: CollectTxConfiguration,
    skipchain_id: Option<CryptoHash>,
    latest_id: Option<CryptoHash>,
    max_num_txs: u32,
    txs: Sender<Vec<ClientTransaction>>,
    common_version: Sender<ProtocolVersion>,
    finish: SignalListener,
    event_publisher: Option<Sender<Event>>,
}

impl<N: Network, P: TxPool, V: VersionProvider> CollectTx<N, P, V> {
    pub fn new(
        node: TreeNodeInstance<N>,
        tx_pool: P,
        version_provider: V,
        config: CollectTxConfiguration,
        event_publisher: Option<Sender<Event>>,
    ) -> (CollectTx<N, P, V>, CollectTxOutputs) {
        let (txs, txs_receiver) = mpsc::channel();
        let (common_version, common_version_receiver) = mpsc::channel();
        let (finish_trigger, finish) = signal();

        let collect_tx = CollectTx {
            node,
            tx_pool,
            version_provider,
            max_num_txs: config.max_num_txs,
            config,
            skipchain_id: None,
            latest_id: None,
            txs,
            common_version,
            finish,
            event_publisher,
        };
        let outputs = CollectTxOutputs {
            txs: txs_receiver,
            common_version: common_version_receiver,
            finish: FinishHandle(finish_trigger),
        };
        (collect_tx, outputs)
    }

    /// Set the chain that transactions are collected for.
    pub fn set_skipchain_id(&mut self, skipchain_id: CryptoHash) {
        self.skipchain_id = Some(skipchain_id);
    }

    /// Set the latest block known to the leader.
    pub fn set_latest_id(&mut self, latest_id: CryptoHash) {
        self.latest_id = Some(latest_id);
    }

    /// Override the configured maximum number of transactions per node for this run.
    pub fn set_max_num_txs(&mut self, max_num_txs: u32) {
        self.max_num_txs = max_num_txs;
    }

    /// Wait for the request, from the root itself or from this node's parent.
    ///
    /// Returns `Ok(None)` if the run was finished or shut down before the request arrived.
    fn wait_for_request(&mut self) -> Result<Option<CollectTxRequest>, CollectTxError> {
        let deadline = Instant::now() + self.config.request_timeout;
        let accept = |msg: &Message| match msg {
            Message::CollectTxRequest(request) => Some(request.clone()),
            _ => None,
        };

        match self.node.recv(accept, Some(deadline), Some(&self.finish)) {
            Ok((_, request)) => Ok(Some(request)),
            Err(WaitError::Timeout) => Err(CollectTxError::Timeout),
            Err(WaitError::Shutdown) | Err(WaitError::Finish) => Ok(None),
            Err(WaitError::Disconnected) => Err(CollectTxError::Disconnected),
        }
    }

    /// Pass the request on to this node's children, logging the deliveries that fail.
    fn forward_request(&mut self, request: &CollectTxRequest) {
        let failures = self
            .node
            .sender()
            .send_to_children_in_parallel(request.clone());

        for (child, err) in failures {
            log::warn!("Failed to forward the request to child {}: {:?}", child, err);
            let peer = self.node.tree().node(child).map(|identity| *identity.public());
            Event::publish(
                &self.event_publisher,
                Event::SendFailure(SendFailureEvent {
                    timestamp: SystemTime::now(),
                    peer,
                    reason: format!("{:?}", err),
                }),
            );
        }
    }

    fn respond(&mut self, request: &CollectTxRequest) -> CollectTxResponse {
        let leader = *self.node.tree().root_public();
        let txs = self
            .tx_pool
            .pending_txs(PendingTxsRequest::new(&leader, request));
        CollectTxResponse {
            txs,
            version: self.version_provider.version(),
        }
    }

    /// The root's collection loop.
    ///
    /// Processes the root's own response, then waits for one response from every other node of the
    /// tree, unless the run is finished or shut down, or the collect deadline passes.
    fn collect(
        mut self,
        request: &CollectTxRequest,
        own_response: CollectTxResponse,
    ) -> Result<(), CollectTxError> {
        let tx_bound = request.tx_bound();
        let tree_size = self.node.tree().size();
        let own_version = own_response.version;
        let mut versions = QuorumBuffer::for_tree_size(tree_size);
        let deadline = self
            .config
            .collect_deadline
            .map(|collect_deadline| Instant::now() + collect_deadline);

        let me = self.node.public();
        self.on_receive_response(&mut versions, tx_bound, me, own_response);

        let accept = |msg: &Message| match msg {
            Message::CollectTxResponse(response) => Some(response.clone()),
            _ => None,
        };
        let mut remaining = tree_size.saturating_sub(1);
        while remaining > 0 {
            match self.node.recv(accept, deadline, Some(&self.finish)) {
                Ok((origin, response)) => {
                    if self.node.tree().position(&origin).is_none() {
                        log::debug!("Ignoring a response from a node outside the tree");
                        continue;
                    }
                    self.on_receive_response(&mut versions, tx_bound, origin, response);
                    remaining -= 1;
                }
                Err(WaitError::Shutdown) => return Ok(()),
                Err(WaitError::Finish) => break,
                Err(WaitError::Timeout) => {
                    log::warn!(
                        "Collect deadline passed with {} responses outstanding",
                        remaining
                    );
                    break;
                }
                Err(WaitError::Disconnected) => return Err(CollectTxError::Disconnected),
            }
        }

        if versions.has_threshold(&own_version) {
            Event::publish(
                &self.event_publisher,
                Event::AgreeVersion(AgreeVersionEvent {
                    timestamp: SystemTime::now(),
                    version: own_version,
                    support: versions.support(&own_version),
                }),
            );
            let _ = self.common_version.send(own_version);
        } else {
            log::info!(
                "Version {} has the support of {} nodes, short of {}",
                own_version,
                versions.support(&own_version),
                versions.threshold()
            );
        }

        // Dropping `self` closes the outputs.
        Ok(())
    }

    fn on_receive_response(
        &mut self,
        versions: &mut QuorumBuffer<VerifyingKey, ProtocolVersion>,
        tx_bound: Option<usize>,
        origin: VerifyingKey,
        response: CollectTxResponse,
    ) {
        versions.add(origin, response.version);

        let num_txs = response.txs.len();
        Event::publish(
            &self.event_publisher,
            Event::ReceiveTxResponse(ReceiveTxResponseEvent {
                timestamp: SystemTime::now(),
                origin,
                num_txs,
                version: response.version,
            }),
        );

        // The bound is the one the root declared in its request, not the responder's.
        let within_bound = match tx_bound {
            None => true,
            Some(max) => num_txs <= max,
        };
        if response.version == ProtocolVersion::UNBOUNDED || within_bound {
            // The consumer may have stopped reading.
            let _ = self.txs.send(response.txs);
        } else {
            log::warn!(
                "Dropping a batch of {} transactions, more than the maximum of {}",
                num_txs,
                self.max_num_txs
            );
            Event::publish(
                &self.event_publisher,
                Event::DropTxBatch(DropTxBatchEvent {
                    timestamp: SystemTime::now(),
                    origin,
                    num_txs,
                    max_num_txs: self.max_num_txs,
                }),
            );
        }
    }
}

impl<N, P, V> ProtocolInstance for CollectTx<N, P, V>
where
    N: Network + 'static,
    P: TxPool + 'static,
    V: VersionProvider + 'static,
{
    type Error = CollectTxError;

    /// Check that both IDs are set, then send the request to the root itself.
    fn start(&mut self) -> Result<(), CollectTxError> {
        if !self.node.is_root() {
            return Err(CollectTxError::NotRoot);
        }
        let skipchain_id = self
            .skipchain_id
            .ok_or(CollectTxError::MissingSkipchainID)?;
        let latest_id = self.latest_id.ok_or(CollectTxError::MissingLatestID)?;

        let request = CollectTxRequest {
            skipchain_id,
            latest_id,
            max_num_txs: self.max_num_txs,
            version: self.version_provider.version(),
        };

        Event::publish(
            &self.event_publisher,
            Event::StartCollectTx(StartCollectTxEvent {
                timestamp: SystemTime::now(),
                skipchain_id,
                latest_id,
                max_num_txs: request.max_num_txs,
                version: request.version,
            }),
        );

        self.node.sender().send_to_self(request)?;
        Ok(())
    }

    fn dispatch(mut self) -> Result<(), CollectTxError> {
        let request = match self.wait_for_request()? {
            Some(request) => request,
            None => return Ok(()),
        };

        if !self.node.is_leaf() {
            self.forward_request(&request);
        }

        let response = self.respond(&request);
        if self.node.is_root() {
            self.collect(&request, response)
        } else {
            // Responses skip the inner nodes and go straight to the root, which counts one response
            // per node of the tree. Relaying through parents would need the inner nodes to aggregate.
            let root = self.node.tree().root();
            self.node.sender().unicast(root, response)?;
            Ok(())
        }
    }
}
