/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Per-node, per-run protocol instances and their lifecycle.
//!
//! A protocol run involves exactly one instance on every node of a [`Tree`]. Each instance is bound to
//! one node through a [`TreeNodeInstance`], which owns the node's inbound message queue, its handle for
//! sending along the tree, and its shutdown signal. An instance is never reused: it is consumed by
//! [`ProtocolInstance::dispatch`], and a new instance must be created for the next run.
//!
//! ## Lifecycle
//!
//! 1. Construct the protocol on every node (giving each a `TreeNodeInstance`).
//! 2. On the root only, call [`start`](ProtocolInstance::start). Preconditions are checked here, before
//!    any message is sent.
//! 3. On every node, call [`spawn`] (or `dispatch` directly) to run the protocol to completion.
//!
//! ## Shutdown
//!
//! [`TreeNodeInstance::new`] returns a [`ShutdownHandle`] alongside the instance. Calling
//! [`ShutdownHandle::shutdown`] causes every wait inside the instance to resolve promptly, after which
//! `dispatch` returns without producing a result. The handle is consumed by `shutdown`, so a run can only
//! be shut down once.

use std::{
    cell::Cell,
    fmt::Debug,
    sync::{
        mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use ed25519_dalek::VerifyingKey;

use crate::{
    networking::{
        messages::Message,
        network::Network,
        receiving::{InboxStub, ReceiveError, POLL_INTERVAL},
        sending::TreeSender,
    },
    types::tree::Tree,
};

/// A protocol that runs as one instance per tree node.
pub trait ProtocolInstance: Send + 'static {
    type Error: Debug + Send + 'static;

    /// Kick off a run. Only called on the root.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Run the instance to completion. Called once on every node; consumes the instance.
    fn dispatch(self) -> Result<(), Self::Error>;
}

/// Run `instance`'s [`dispatch`](ProtocolInstance::dispatch) on its own thread.
pub fn spawn<P: ProtocolInstance>(instance: P) -> JoinHandle<Result<(), P::Error>> {
    thread::spawn(move || instance.dispatch())
}

/// Create a one-shot signal: the [`Trigger`] fires it, the [`SignalListener`] observes it.
pub(crate) fn signal() -> (Trigger, SignalListener) {
    let (sender, receiver) = mpsc::channel();
    (
        Trigger(sender),
        SignalListener {
            receiver,
            fired: Cell::new(false),
        },
    )
}

/// The firing end of a one-shot signal. Firing consumes it.
pub(crate) struct Trigger(Sender<()>);

impl Trigger {
    pub(crate) fn fire(self) {
        // The listener may already be gone if its instance has finished.
        let _ = self.0.send(());
    }
}

/// The observing end of a one-shot signal. Once fired, stays fired.
///
/// Dropping the [`Trigger`] without firing it does not fire the signal.
pub(crate) struct SignalListener {
    receiver: Receiver<()>,
    fired: Cell<bool>,
}

impl SignalListener {
    pub(crate) fn has_fired(&self) -> bool {
        if self.fired.get() {
            return true;
        }
        match self.receiver.try_recv() {
            Ok(()) => {
                self.fired.set(true);
                true
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => false,
        }
    }
}

/// Handle for cooperatively cancelling one protocol instance.
pub struct ShutdownHandle(Trigger);

impl ShutdownHandle {
    /// Signal the instance to stop. In-flight waits resolve promptly, and the run's outputs become
    /// undefined.
    pub fn shutdown(self) {
        self.0.fire()
    }
}

/// One node of one tree, for the duration of one protocol run.
pub struct TreeNodeInstance<N: Network> {
    tree: Arc<Tree>,
    index: usize,
    public: VerifyingKey,
    sender: TreeSender<N>,
    inbox: InboxStub,
    shutdown: SignalListener,
}

impl<N: Network> TreeNodeInstance<N> {
    /// Bind the node identified by `me` in `tree`.
    ///
    /// `inbox` is where the host's [`Network`] delivers the messages addressed to this instance, tagged
    /// with their origin.
    pub fn new(
        tree: Arc<Tree>,
        me: &VerifyingKey,
        network: N,
        inbox: Receiver<(VerifyingKey, Message)>,
    ) -> Result<(TreeNodeInstance<N>, ShutdownHandle), InstanceError> {
        let index = tree.position(me).ok_or(InstanceError::NotInTree(*me))?;
        let (trigger, shutdown) = signal();
        let instance = TreeNodeInstance {
            sender: TreeSender::new(network, tree.clone(), index),
            tree,
            index,
            public: *me,
            inbox: InboxStub::new(inbox),
            shutdown,
        };
        Ok((instance, ShutdownHandle(trigger)))
    }

    pub fn tree(&self) -> &Arc<Tree> {
        &self.tree
    }

    /// Position of this node in the tree.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Public key of this node.
    pub fn public(&self) -> VerifyingKey {
        self.public
    }

    pub fn is_root(&self) -> bool {
        self.tree.is_root(self.index)
    }

    pub fn is_leaf(&self) -> bool {
        self.tree.is_leaf(self.index)
    }

    /// Handle for sending messages along the edges of the tree, from this node.
    pub fn sender(&mut self) -> &mut TreeSender<N> {
        &mut self.sender
    }

    pub(crate) fn is_closing(&self) -> bool {
        self.shutdown.has_fired()
    }

    /// Receive the first inbound message accepted by `accept`, guarding the wait on this instance's
    /// shutdown signal and, if given, on `finish`.
    pub(crate) fn recv<T>(
        &mut self,
        accept: impl Fn(&Message) -> Option<T>,
        deadline: Option<Instant>,
        finish: Option<&SignalListener>,
    ) -> Result<(VerifyingKey, T), WaitError> {
        let result = match finish {
            Some(finish) => self.inbox.recv(accept, deadline, &[&self.shutdown, finish]),
            None => self.inbox.recv(accept, deadline, &[&self.shutdown]),
        };
        result.map_err(|err| match err {
            ReceiveError::Timeout => WaitError::Timeout,
            ReceiveError::Interrupted(0) => WaitError::Shutdown,
            ReceiveError::Interrupted(_) => WaitError::Finish,
            ReceiveError::Disconnected => WaitError::Disconnected,
        })
    }

    /// Wait for a single value on `receiver`, guarding the wait on this instance's shutdown signal.
    pub(crate) fn wait_for<T>(&self, receiver: &Receiver<T>) -> Result<T, WaitError> {
        loop {
            if self.is_closing() {
                return Err(WaitError::Shutdown);
            }
            match receiver.recv_timeout(POLL_INTERVAL) {
                Ok(value) => return Ok(value),
                Err(RecvTimeoutError::Timeout) => (),
                Err(RecvTimeoutError::Disconnected) => return Err(WaitError::Disconnected),
            }
        }
    }
}

/// Ways a wait inside a protocol instance can end without producing a value.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum WaitError {
    Timeout,
    Shutdown,
    Finish,
    Disconnected,
}

#[derive(Debug, PartialEq, Eq)]
pub enum InstanceError {
    /// The given public key is not a node of the tree.
    NotInTree(VerifyingKey),
}
