//! Tree quorum transaction collection.
//!
//! Before proposing a block, a leader (the root of a tree) asks every node for its pending
//! transactions and its protocol version:
//! 1. The root sends a [`CollectTxRequest`](messages::CollectTxRequest) to itself. Every node that
//!    receives the request forwards it to its children in parallel. A failed delivery is logged and
//!    does not abort the run.
//! 2. Every node (the root included) answers with a [`CollectTxResponse`](messages::CollectTxResponse)
//!    holding its pending transactions, taken from its [`TxPool`](app::TxPool), and its version, taken
//!    from its [`VersionProvider`](app::VersionProvider). Non-root nodes send their response to the
//!    root.
//! 3. The root waits for one response per node of the tree. Each batch no larger than the requested
//!    maximum is forwarded to the transaction output; larger batches are dropped whole. Every reported
//!    version is recorded in a [`QuorumBuffer`](crate::quorum::QuorumBuffer).
//! 4. If the root's own version has quorum support, it is published as the common version.
//!
//! The transaction output is closed when the root is done, so consumers can read it to the end.
//!
//! ## Waiting
//!
//! Every node waits for the request for at most
//! [`request_timeout`](types::CollectTxConfiguration::request_timeout), which detects a root that
//! never started. The root's collection loop is bounded by the number of nodes, and optionally by an
//! overall [`collect_deadline`](types::CollectTxConfiguration::collect_deadline). Both waits end early
//! when the run is finished through its [`FinishHandle`](types::FinishHandle) or shut down.

pub mod messages;

pub mod app;

pub mod types;

pub mod protocol;
