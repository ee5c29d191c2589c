use std::{
    sync::{mpsc::RecvTimeoutError, Arc},
    thread,
    time::{Duration, Instant},
};

use treecosi::{
    bftcosi::{
        protocol::BftCosi,
        types::{BftCosiConfiguration, BftCosiError, SubtreePolicy},
    },
    cosi::{CosiError, Phase},
    instance::{self, ProtocolInstance, ShutdownHandle, TreeNodeInstance},
    quorum::ThresholdPolicy,
    types::{crypto_primitives::SigningKey, tree::Tree},
};

mod common;

use common::{
    cosi::{LocalCosi, RoundBehavior},
    network::NetworkStub,
    setup::{roster, signing_keys, tree_nodes},
};

const RESULT_TIMEOUT: Duration = Duration::from_secs(5);

fn flat_tree(keys: &[SigningKey]) -> Arc<Tree> {
    Arc::new(Tree::flat(roster(keys)))
}

fn root_node(tree: &Arc<Tree>) -> (TreeNodeInstance<NetworkStub>, ShutdownHandle) {
    let (mut nodes, _) = tree_nodes(tree);
    nodes.swap_remove(0)
}

/// Both phases are signed by every node: the final signature carries the candidate message and a commit
/// signature that passes verification.
#[test]
fn bftcosi_success_test() {
    let keys = signing_keys(7);
    let tree = flat_tree(&keys);
    let (node, _shutdown) = root_node(&tree);
    let (cosi, rounds) = LocalCosi::new(&keys, RoundBehavior::Sign(7), RoundBehavior::Sign(7));

    let (mut bft, final_signature) = BftCosi::new(node, cosi, BftCosiConfiguration::default(), None);
    bft.set_message(b"proposal".to_vec());
    bft.set_data(b"auxiliary".to_vec());
    bft.start().unwrap();
    let handle = instance::spawn(bft);

    let final_signature = final_signature.recv_timeout(RESULT_TIMEOUT).unwrap();
    assert!(handle.join().unwrap().is_ok());

    assert!(!final_signature.is_failure());
    assert_eq!(final_signature.msg, b"proposal".to_vec());
    let commit_signature = final_signature.sig.unwrap();
    assert_eq!(
        commit_signature.verify(&tree.publics(), b"proposal", &ThresholdPolicy::bft(7)),
        Ok(7)
    );

    let rounds = rounds.lock().unwrap();
    assert_eq!(rounds.len(), 2);
    assert_eq!(rounds[0].phase, Phase::Prepare);
    assert_eq!(rounds[1].phase, Phase::Commit);
    for round in rounds.iter() {
        assert_eq!(round.message, b"proposal".to_vec());
        assert_eq!(round.data, b"auxiliary".to_vec());
        // One sub-leader per 10 nodes: no partitioning for 7 nodes.
        assert_eq!(round.subtrees, 0);
    }
}

/// A prepare signature with exactly `n - 1 - f` signers lets the commit phase run.
#[test]
fn bftcosi_prepare_at_threshold_test() {
    let keys = signing_keys(7);
    let tree = flat_tree(&keys);
    let (node, _shutdown) = root_node(&tree);
    let (cosi, rounds) = LocalCosi::new(&keys, RoundBehavior::Sign(5), RoundBehavior::Sign(5));

    let (mut bft, final_signature) = BftCosi::new(node, cosi, BftCosiConfiguration::default(), None);
    bft.set_message(b"proposal".to_vec());
    bft.start().unwrap();
    let handle = instance::spawn(bft);

    let final_signature = final_signature.recv_timeout(RESULT_TIMEOUT).unwrap();
    assert!(handle.join().unwrap().is_ok());
    assert!(!final_signature.is_failure());
    assert_eq!(final_signature.msg, b"proposal".to_vec());
    assert_eq!(final_signature.sig.unwrap().participants(), 5);
    assert_eq!(rounds.lock().unwrap().len(), 2);
}

/// A prepare signature with one signer fewer than the threshold yields the failure sentinel, and the
/// commit phase is never run.
#[test]
fn bftcosi_prepare_below_threshold_test() {
    let keys = signing_keys(7);
    let tree = flat_tree(&keys);
    let (node, _shutdown) = root_node(&tree);
    let (cosi, rounds) = LocalCosi::new(&keys, RoundBehavior::Sign(4), RoundBehavior::Sign(7));

    let (mut bft, final_signature) = BftCosi::new(node, cosi, BftCosiConfiguration::default(), None);
    bft.set_message(b"proposal".to_vec());
    bft.start().unwrap();
    let handle = instance::spawn(bft);

    let final_signature = final_signature.recv_timeout(RESULT_TIMEOUT).unwrap();
    assert!(handle.join().unwrap().is_ok());
    assert!(final_signature.is_failure());
    assert!(final_signature.msg.is_empty());

    let rounds = rounds.lock().unwrap();
    assert_eq!(rounds.len(), 1);
    assert_eq!(rounds[0].phase, Phase::Prepare);
}

/// A prepare signature over a different message is rejected regardless of how many nodes signed it.
#[test]
fn bftcosi_prepare_invalid_signature_test() {
    let keys = signing_keys(4);
    let tree = flat_tree(&keys);
    let (node, _shutdown) = root_node(&tree);
    let (cosi, rounds) = LocalCosi::new(
        &keys,
        RoundBehavior::SignWrongMessage(4),
        RoundBehavior::Sign(4),
    );

    let (mut bft, final_signature) = BftCosi::new(node, cosi, BftCosiConfiguration::default(), None);
    bft.set_message(b"proposal".to_vec());
    bft.start().unwrap();
    let handle = instance::spawn(bft);

    assert!(final_signature
        .recv_timeout(RESULT_TIMEOUT)
        .unwrap()
        .is_failure());
    assert!(handle.join().unwrap().is_ok());
    assert_eq!(rounds.lock().unwrap().len(), 1);
}

#[test]
fn bftcosi_preconditions_test() {
    let keys = signing_keys(4);
    let tree = flat_tree(&keys);
    let (mut nodes, _) = tree_nodes(&tree);
    let (leaf, _) = nodes.pop().unwrap();
    let (root, _) = nodes.swap_remove(0);

    // Only the root may start.
    let (cosi, _) = LocalCosi::new(&keys, RoundBehavior::Sign(4), RoundBehavior::Sign(4));
    let (mut bft, _) = BftCosi::new(leaf, cosi, BftCosiConfiguration::default(), None);
    bft.set_message(b"proposal".to_vec());
    assert!(matches!(bft.start(), Err(BftCosiError::NotRoot)));

    // The message must be set before starting, and nothing runs until it is.
    let (cosi, rounds) = LocalCosi::new(&keys, RoundBehavior::Sign(4), RoundBehavior::Sign(4));
    let (mut bft, _) = BftCosi::new(root, cosi, BftCosiConfiguration::default(), None);
    assert!(matches!(bft.start(), Err(BftCosiError::MissingMessage)));
    assert!(rounds.lock().unwrap().is_empty());

    // Instances are single-use.
    bft.set_message(b"proposal".to_vec());
    bft.start().unwrap();
    assert!(matches!(bft.start(), Err(BftCosiError::AlreadyStarted)));
    assert_eq!(rounds.lock().unwrap().len(), 1);
}

#[test]
fn bftcosi_dispatch_before_start_test() {
    let keys = signing_keys(4);
    let tree = flat_tree(&keys);
    let (node, _shutdown) = root_node(&tree);
    let (cosi, rounds) = LocalCosi::new(&keys, RoundBehavior::Sign(4), RoundBehavior::Sign(4));

    let (mut bft, _) = BftCosi::new(node, cosi, BftCosiConfiguration::default(), None);
    bft.set_message(b"proposal".to_vec());
    assert!(matches!(bft.dispatch(), Err(BftCosiError::NotStarted)));
    assert!(rounds.lock().unwrap().is_empty());
}

/// A commit round that cannot be started aborts the run without emitting any signature.
#[test]
fn bftcosi_commit_start_failure_test() {
    let keys = signing_keys(4);
    let tree = flat_tree(&keys);
    let (node, _shutdown) = root_node(&tree);
    let (cosi, _) = LocalCosi::new(&keys, RoundBehavior::Sign(4), RoundBehavior::FailToStart);

    let (mut bft, final_signature) = BftCosi::new(node, cosi, BftCosiConfiguration::default(), None);
    bft.set_message(b"proposal".to_vec());
    bft.start().unwrap();
    let result = instance::spawn(bft).join().unwrap();

    assert!(matches!(
        result,
        Err(BftCosiError::Cosi(CosiError::Start(_)))
    ));
    assert_eq!(
        final_signature.recv_timeout(RESULT_TIMEOUT),
        Err(RecvTimeoutError::Disconnected)
    );
}

#[test]
fn bftcosi_prepare_start_failure_test() {
    let keys = signing_keys(4);
    let tree = flat_tree(&keys);
    let (node, _shutdown) = root_node(&tree);
    let (cosi, _) = LocalCosi::new(&keys, RoundBehavior::FailToStart, RoundBehavior::Sign(4));

    let (mut bft, _) = BftCosi::new(node, cosi, BftCosiConfiguration::default(), None);
    bft.set_message(b"proposal".to_vec());
    assert!(matches!(bft.start(), Err(BftCosiError::Cosi(_))));
}

/// Shutting down while the root waits for the prepare signature ends the run promptly, without a final
/// signature and without an error.
#[test]
fn bftcosi_shutdown_test() {
    let keys = signing_keys(4);
    let tree = flat_tree(&keys);
    let (node, shutdown) = root_node(&tree);
    let (cosi, rounds) = LocalCosi::new(&keys, RoundBehavior::Withhold, RoundBehavior::Sign(4));

    let (mut bft, final_signature) = BftCosi::new(node, cosi, BftCosiConfiguration::default(), None);
    bft.set_message(b"proposal".to_vec());
    bft.start().unwrap();
    let handle = instance::spawn(bft);

    thread::sleep(Duration::from_millis(100));
    let shutdown_at = Instant::now();
    shutdown.shutdown();

    assert!(handle.join().unwrap().is_ok());
    assert!(shutdown_at.elapsed() < Duration::from_secs(1));
    assert_eq!(
        final_signature.recv_timeout(RESULT_TIMEOUT),
        Err(RecvTimeoutError::Disconnected)
    );
    assert_eq!(rounds.lock().unwrap().len(), 1);
}

/// The subtree hint follows the configured policy, and does not affect the threshold.
#[test]
fn bftcosi_subtree_policy_test() {
    assert_eq!(SubtreePolicy::default().subtree_count(25), 2);
    assert_eq!(SubtreePolicy::NodesPerSubtree(0).subtree_count(25), 0);
    assert_eq!(SubtreePolicy::Flat.subtree_count(25), 0);

    let keys = signing_keys(25);
    let tree = flat_tree(&keys);
    let (node, _shutdown) = root_node(&tree);
    let (cosi, rounds) = LocalCosi::new(&keys, RoundBehavior::Sign(25), RoundBehavior::Sign(25));

    let config = BftCosiConfiguration::builder()
        .subtree_policy(SubtreePolicy::Fixed(3))
        .build();
    let (mut bft, final_signature) = BftCosi::new(node, cosi, config, None);
    bft.set_message(b"proposal".to_vec());
    bft.start().unwrap();
    let handle = instance::spawn(bft);

    assert!(!final_signature
        .recv_timeout(RESULT_TIMEOUT)
        .unwrap()
        .is_failure());
    assert!(handle.join().unwrap().is_ok());
    assert!(rounds.lock().unwrap().iter().all(|round| round.subtrees == 3));
}
