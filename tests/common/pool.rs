use std::sync::{Arc, Mutex};

use ed25519_dalek::VerifyingKey;
use treecosi::{
    collect_tx::app::{PendingTxsRequest, TxPool},
    types::data_types::ClientTransaction,
};

/// What a [FixedPool] was asked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RecordedRequest {
    pub(crate) leader: VerifyingKey,
    pub(crate) max_num_txs: Option<usize>,
}

/// A transaction pool that always reports the same transactions, regardless of the requested bound.
pub(crate) struct FixedPool {
    txs: Vec<ClientTransaction>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FixedPool {
    /// A pool holding `num_txs` transactions, each tagged with `tag` so that batches can be told apart.
    pub(crate) fn new(tag: u8, num_txs: usize) -> FixedPool {
        let txs = (0..num_txs)
            .map(|i| ClientTransaction::new(vec![tag, i as u8]))
            .collect();
        FixedPool {
            txs,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle through which the test can read the requests the pool received.
    pub(crate) fn requests(&self) -> Arc<Mutex<Vec<RecordedRequest>>> {
        self.requests.clone()
    }
}

impl TxPool for FixedPool {
    fn pending_txs(&mut self, request: PendingTxsRequest) -> Vec<ClientTransaction> {
        self.requests.lock().unwrap().push(RecordedRequest {
            leader: *request.leader(),
            max_num_txs: request.max_num_txs(),
        });
        self.txs.clone()
    }
}
