use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc::{self, Receiver, Sender},
        Arc, Mutex,
    },
};

use ed25519_dalek::VerifyingKey;
use treecosi::networking::{
    messages::Message,
    network::{Network, SendError},
};

/// A mock network stub which passes messages from and to threads using channels.
///
/// Every message is encoded and decoded on the way, like a real transport would. Peers can be marked
/// unreachable, in which case sends to them fail, and every delivery attempt is counted.
#[derive(Clone)]
pub(crate) struct NetworkStub {
    my_verifying_key: VerifyingKey,
    all_peers: HashMap<VerifyingKey, Sender<(VerifyingKey, Message)>>,
    unreachable: Arc<Mutex<HashSet<VerifyingKey>>>,
    sends: Arc<AtomicUsize>,
}

impl Network for NetworkStub {
    fn send(&mut self, peer: VerifyingKey, message: Message) -> Result<(), SendError> {
        self.sends.fetch_add(1, Ordering::SeqCst);

        if self.unreachable.lock().unwrap().contains(&peer) {
            return Err(SendError::Disconnected(peer));
        }
        let inbox = self
            .all_peers
            .get(&peer)
            .ok_or(SendError::UnknownPeer(peer))?;

        let bytes = message
            .to_bytes()
            .map_err(|err| SendError::Other(err.to_string()))?;
        let message = Message::from_bytes(&bytes).map_err(|err| SendError::Other(err.to_string()))?;

        inbox
            .send((self.my_verifying_key, message))
            .map_err(|_| SendError::Disconnected(peer))
    }
}

/// Handle for inspecting and manipulating a mock network from a test.
#[derive(Clone)]
pub(crate) struct NetworkControl {
    unreachable: Arc<Mutex<HashSet<VerifyingKey>>>,
    sends: Arc<AtomicUsize>,
}

impl NetworkControl {
    /// Make every future send to `peer` fail.
    pub(crate) fn disconnect(&self, peer: VerifyingKey) {
        self.unreachable.lock().unwrap().insert(peer);
    }

    /// Number of delivery attempts made so far, by every node, failed attempts included.
    pub(crate) fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

/// Create one network stub and one inbox for every peer, in the order of `peers`.
pub(crate) fn mock_network(
    peers: impl Iterator<Item = VerifyingKey>,
) -> (
    Vec<(NetworkStub, Receiver<(VerifyingKey, Message)>)>,
    NetworkControl,
) {
    let control = NetworkControl {
        unreachable: Arc::new(Mutex::new(HashSet::new())),
        sends: Arc::new(AtomicUsize::new(0)),
    };

    let mut all_peers = HashMap::new();
    let peer_and_inboxes: Vec<(VerifyingKey, Receiver<(VerifyingKey, Message)>)> = peers
        .map(|peer| {
            let (sender, receiver) = mpsc::channel();
            all_peers.insert(peer, sender);

            (peer, receiver)
        })
        .collect();

    let stubs = peer_and_inboxes
        .into_iter()
        .map(|(my_verifying_key, inbox)| {
            let stub = NetworkStub {
                my_verifying_key,
                all_peers: all_peers.clone(),
                unreachable: control.unreachable.clone(),
                sends: control.sends.clone(),
            };
            (stub, inbox)
        })
        .collect();

    (stubs, control)
}
