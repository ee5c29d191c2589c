use ed25519_dalek::VerifyingKey;

use super::messages::Message;

/// Pluggable transport between the nodes of a tree.
///
/// Implementations deliver a [`Message`] to a peer identified by its public key, and hand inbound
/// messages to the receiving node's protocol instance through the inbox given to
/// [`TreeNodeInstance::new`](crate::instance::TreeNodeInstance::new), tagged with the sender's key.
///
/// Each call to [`send`](Self::send) is one independent delivery attempt: retrying is the transport's
/// concern, and its outcome is reported per call.
pub trait Network: Clone + Send {
    /// Send a message to the specified peer without blocking on the peer's processing.
    fn send(&mut self, peer: VerifyingKey, message: Message) -> Result<(), SendError>;
}

/// Reasons a single delivery attempt can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The transport does not know how to reach the peer.
    UnknownPeer(VerifyingKey),

    /// The connection to the peer is closed.
    Disconnected(VerifyingKey),

    /// The root of a tree has no parent to send to.
    NoParent,

    /// The index is not a node of the tree.
    NotInTree(usize),

    /// Any other transport-specific failure.
    Other(String),
}
