use std::sync::Arc;

use rand_core::OsRng;
use treecosi::{
    instance::{ShutdownHandle, TreeNodeInstance},
    types::{
        crypto_primitives::SigningKey,
        roster::{Roster, ServerIdentity},
        tree::Tree,
    },
};

use super::network::{mock_network, NetworkControl, NetworkStub};

/// Generate `n` fresh signing keys.
pub(crate) fn signing_keys(n: usize) -> Vec<SigningKey> {
    let mut csprg = OsRng {};
    (0..n).map(|_| SigningKey::generate(&mut csprg)).collect()
}

/// Build a roster over `keys`, giving each node a made-up address.
pub(crate) fn roster(keys: &[SigningKey]) -> Roster {
    let identities = keys
        .iter()
        .enumerate()
        .map(|(i, key)| ServerIdentity::new(key.verifying_key(), format!("tcp://127.0.0.1:{}", 7000 + i)))
        .collect();
    Roster::new(identities).unwrap()
}

/// Bind every node of `tree` to a fresh mock network. The instances are in roster order.
pub(crate) fn tree_nodes(
    tree: &Arc<Tree>,
) -> (
    Vec<(TreeNodeInstance<NetworkStub>, ShutdownHandle)>,
    NetworkControl,
) {
    let (stubs, control) = mock_network(tree.publics().into_iter());
    let nodes = tree
        .publics()
        .iter()
        .zip(stubs)
        .map(|(public, (network, inbox))| {
            TreeNodeInstance::new(tree.clone(), public, network, inbox).unwrap()
        })
        .collect();
    (nodes, control)
}
