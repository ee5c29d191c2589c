/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

use std::{
    collections::HashSet,
    sync::mpsc::{self, Receiver, Sender},
    time::{Duration, Instant},
};

use typed_builder::TypedBuilder;

use crate::{
    instance::{ProtocolInstance, TreeNodeInstance, WaitError},
    networking::{
        messages::Message,
        network::{Network, SendError},
    },
};

use super::messages::{Announce, Reply};

/// Tunables of a count run.
#[derive(Clone, Debug, TypedBuilder)]
#[builder(builder_method(doc = "
    Create a builder for building a [CountConfiguration]. On the builder call the following methods to construct a valid [CountConfiguration].

    Optional:
    - `.announce_timeout(...)`
    - `.reply_timeout(...)`
"))]
pub struct CountConfiguration {
    #[builder(default = Duration::from_secs(10), setter(doc = "Set how long every node waits for the announce. Defaults to 10 seconds. Optional."))]
    pub announce_timeout: Duration,
    #[builder(default = Duration::from_secs(10), setter(doc = "Set how long an inner node waits for its children's replies. Defaults to 10 seconds. Optional."))]
    pub reply_timeout: Duration,
}

impl Default for CountConfiguration {
    fn default() -> Self {
        CountConfiguration::builder().build()
    }
}

/// One node's instance of a count run.
pub struct CountNodes<N: Network> {
    node: TreeNodeInstance<N>,
    config: CountConfiguration,
    count: Sender<u32>,
}

impl<N: Network> CountNodes<N> {
    /// Create the instance. On the root, the receiver yields the number of reachable nodes once.
    pub fn new(node: TreeNodeInstance<N>, config: CountConfiguration) -> (CountNodes<N>, Receiver<u32>) {
        let (count, count_receiver) = mpsc::channel();
        (
            CountNodes {
                node,
                config,
                count,
            },
            count_receiver,
        )
    }

    /// Wait for the replies of this node's children and sum them up. Children that could not be
    /// reached are not waited for.
    ///
    /// Returns `Ok(None)` if the instance was shut down.
    fn collect_replies(&mut self, unreachable: &HashSet<usize>) -> Result<Option<u32>, CountError> {
        let me = self.node.index();
        let expected = self.node.tree().children(me).len() - unreachable.len();
        let deadline = Instant::now() + self.config.reply_timeout;
        let accept = |msg: &Message| match msg {
            Message::Reply(reply) => Some(reply.subtree_size),
            _ => None,
        };

        let mut replied = HashSet::new();
        let mut sum: u32 = 0;
        while replied.len() < expected {
            match self.node.recv(accept, Some(deadline), None) {
                Ok((origin, subtree_size)) => {
                    let child = self.node.tree().position(&origin);
                    match child {
                        Some(child) if self.node.tree().parent(child) == Some(me) => {
                            if replied.insert(child) {
                                sum = sum.saturating_add(subtree_size);
                            }
                        }
                        _ => log::debug!("Ignoring a reply from a node that is not a child"),
                    }
                }
                Err(WaitError::Timeout) => {
                    log::warn!(
                        "{} of {} children did not reply in time",
                        expected - replied.len(),
                        expected
                    );
                    break;
                }
                Err(WaitError::Shutdown) => return Ok(None),
                Err(WaitError::Finish) => break,
                Err(WaitError::Disconnected) => return Err(CountError::Disconnected),
            }
        }
        Ok(Some(sum))
    }
}

impl<N: Network + 'static> ProtocolInstance for CountNodes<N> {
    type Error = CountError;

    fn start(&mut self) -> Result<(), CountError> {
        if !self.node.is_root() {
            return Err(CountError::NotRoot);
        }
        let tree_id = self.node.tree().id();
        self.node.sender().send_to_self(Announce { tree_id })?;
        Ok(())
    }

    fn dispatch(mut self) -> Result<(), CountError> {
        let tree_id = self.node.tree().id();
        let deadline = Instant::now() + self.config.announce_timeout;
        let accept = |msg: &Message| match msg {
            Message::Announce(announce) if announce.tree_id == tree_id => Some(announce.clone()),
            _ => None,
        };

        let announce = match self.node.recv(accept, Some(deadline), None) {
            Ok((_, announce)) => announce,
            Err(WaitError::Timeout) => return Err(CountError::Timeout),
            Err(WaitError::Shutdown) | Err(WaitError::Finish) => return Ok(()),
            Err(WaitError::Disconnected) => return Err(CountError::Disconnected),
        };

        let subtree_size = if self.node.is_leaf() {
            1
        } else {
            let unreachable: HashSet<usize> = self
                .node
                .sender()
                .send_to_children_in_parallel(announce)
                .into_iter()
                .map(|(child, err)| {
                    log::warn!("Failed to announce to child {}: {:?}", child, err);
                    child
                })
                .collect();

            match self.collect_replies(&unreachable)? {
                Some(sum) => sum.saturating_add(1),
                None => return Ok(()),
            }
        };

        if self.node.is_root() {
            let _ = self.count.send(subtree_size);
            Ok(())
        } else {
            self.node.sender().send_to_parent(Reply { subtree_size })?;
            Ok(())
        }
    }
}

#[derive(Debug)]
pub enum CountError {
    /// `start` was called on a node other than the root.
    NotRoot,

    /// The announce did not arrive within the announce timeout.
    Timeout,

    Send(SendError),

    Disconnected,
}

impl From<SendError> for CountError {
    fn from(value: SendError) -> Self {
        CountError::Send(value)
    }
}
