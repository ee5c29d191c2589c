//! Functions and types for sending messages along the edges of a tree.

use std::{sync::Arc, thread};

use ed25519_dalek::VerifyingKey;

use crate::types::tree::Tree;

use super::{
    messages::Message,
    network::{Network, SendError},
};

/// Handle for sending messages to nodes of a [`Tree`] through the [`Network`], from the point of view of
/// one node of that tree.
///
/// It can be used to send instances of any type that implement the [`Into<Message>`] trait.
#[derive(Clone)]
pub struct TreeSender<N: Network> {
    network: N,
    tree: Arc<Tree>,
    me: usize,
}

impl<N: Network> TreeSender<N> {
    pub(crate) fn new(network: N, tree: Arc<Tree>, me: usize) -> Self {
        Self { network, tree, me }
    }

    /// Send `msg` to the node at `index`.
    pub fn unicast<S: Into<Message>>(&mut self, index: usize, msg: S) -> Result<(), SendError> {
        let peer = self.public_of(index)?;
        self.network.send(peer, msg.into())
    }

    /// Send `msg` to this node, through the network, so that it lands in this node's own inbox.
    pub fn send_to_self<S: Into<Message>>(&mut self, msg: S) -> Result<(), SendError> {
        self.unicast(self.me, msg)
    }

    /// Send `msg` to the parent of this node. Fails with [`SendError::NoParent`] on the root.
    pub fn send_to_parent<S: Into<Message>>(&mut self, msg: S) -> Result<(), SendError> {
        match self.tree.parent(self.me) {
            Some(parent) => self.unicast(parent, msg),
            None => Err(SendError::NoParent),
        }
    }

    /// Send `msg` to each child of this node in turn, stopping at the first failure.
    pub fn send_to_children<S: Into<Message>>(&mut self, msg: S) -> Result<(), SendError> {
        let msg = msg.into();
        for child in self.tree.children(self.me) {
            self.unicast(child, msg.clone())?;
        }
        Ok(())
    }

    /// Send `msg` to every child of this node concurrently, one thread per child.
    ///
    /// Every child gets a delivery attempt regardless of whether the others fail. Returns one entry per
    /// failed child; an empty `Vec` means every delivery attempt succeeded.
    pub fn send_to_children_in_parallel<S: Into<Message>>(
        &mut self,
        msg: S,
    ) -> Vec<(usize, SendError)> {
        let msg = msg.into();
        let children = self.tree.children(self.me);

        thread::scope(|scope| {
            let attempts: Vec<_> = children
                .map(|child| {
                    let mut network = self.network.clone();
                    let msg = msg.clone();
                    let peer = self.public_of(child);
                    let attempt = scope.spawn(move || network.send(peer?, msg));
                    (child, attempt)
                })
                .collect();

            attempts
                .into_iter()
                .filter_map(|(child, attempt)| match attempt.join() {
                    Ok(Ok(())) => None,
                    Ok(Err(err)) => Some((child, err)),
                    Err(_) => Some((
                        child,
                        SendError::Other(String::from("sending thread panicked")),
                    )),
                })
                .collect()
        })
    }

    fn public_of(&self, index: usize) -> Result<VerifyingKey, SendError> {
        self.tree
            .node(index)
            .map(|identity| *identity.public())
            .ok_or(SendError::NotInTree(index))
    }
}
