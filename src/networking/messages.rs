//! Exhaustive enumeration of every message variant sent between the nodes of a tree.
//!
//! The set of messages is closed: decoding yields a [`Message`], and receivers dispatch on it with an
//! exhaustive `match`. There is no runtime registration of message types.

use std::io;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    collect_tx::messages::{CollectTxRequest, CollectTxResponse},
    count::messages::{Announce, Reply},
};

/// All message variants used in this crate.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Message {
    /// See: [`CollectTxRequest`].
    CollectTxRequest(CollectTxRequest),

    /// See: [`CollectTxResponse`].
    CollectTxResponse(CollectTxResponse),

    /// See: [`Announce`].
    Announce(Announce),

    /// See: [`Reply`].
    Reply(Reply),
}

impl Message {
    /// Serialize the message with Borsh.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        self.try_to_vec()
    }

    /// Deserialize a message previously produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> io::Result<Message> {
        Message::try_from_slice(bytes)
    }

    /// Name of the variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::CollectTxRequest(_) => "CollectTxRequest",
            Message::CollectTxResponse(_) => "CollectTxResponse",
            Message::Announce(_) => "Announce",
            Message::Reply(_) => "Reply",
        }
    }
}

impl From<CollectTxRequest> for Message {
    fn from(value: CollectTxRequest) -> Self {
        Message::CollectTxRequest(value)
    }
}

impl From<CollectTxResponse> for Message {
    fn from(value: CollectTxResponse) -> Self {
        Message::CollectTxResponse(value)
    }
}

impl From<Announce> for Message {
    fn from(value: Announce) -> Self {
        Message::Announce(value)
    }
}

impl From<Reply> for Message {
    fn from(value: Reply) -> Self {
        Message::Reply(value)
    }
}
