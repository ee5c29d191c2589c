use std::{
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc, Mutex,
    },
    thread,
};

use treecosi::{
    cosi::{CollectiveSignature, CollectiveSigning, CosiError, CosiRound, Phase},
    types::{crypto_primitives::Keypair, crypto_primitives::SigningKey},
};

/// How a [LocalCosi] behaves in one phase.
#[derive(Clone, Copy, Debug)]
pub(crate) enum RoundBehavior {
    /// The first `n` nodes of the tree sign the message; the rest do not respond.
    Sign(usize),
    /// The first `n` nodes of the tree sign something other than the message.
    SignWrongMessage(usize),
    /// The round starts, but never delivers a signature.
    Withhold,
    /// The round fails to start.
    FailToStart,
}

/// A summary of a round that a [LocalCosi] was asked to run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RecordedRound {
    pub(crate) phase: Phase,
    pub(crate) message: Vec<u8>,
    pub(crate) data: Vec<u8>,
    pub(crate) subtrees: usize,
}

/// An in-process collective-signing double which signs with the keys of the nodes of the tree, in
/// roster order, on a separate thread.
pub(crate) struct LocalCosi {
    keypairs: Vec<Keypair>,
    prepare: RoundBehavior,
    commit: RoundBehavior,
    rounds: Arc<Mutex<Vec<RecordedRound>>>,
    withheld: Vec<Sender<CollectiveSignature>>,
}

impl LocalCosi {
    /// Create the double, and a handle through which the test can read the rounds it ran.
    pub(crate) fn new(
        keys: &[SigningKey],
        prepare: RoundBehavior,
        commit: RoundBehavior,
    ) -> (LocalCosi, Arc<Mutex<Vec<RecordedRound>>>) {
        let rounds = Arc::new(Mutex::new(Vec::new()));
        let cosi = LocalCosi {
            keypairs: keys.iter().cloned().map(Keypair::new).collect(),
            prepare,
            commit,
            rounds: rounds.clone(),
            withheld: Vec::new(),
        };
        (cosi, rounds)
    }
}

impl CollectiveSigning for LocalCosi {
    fn run(&mut self, round: CosiRound) -> Result<Receiver<CollectiveSignature>, CosiError> {
        self.rounds.lock().unwrap().push(RecordedRound {
            phase: round.phase,
            message: round.message.clone(),
            data: round.data.clone(),
            subtrees: round.subtrees,
        });

        let behavior = match round.phase {
            Phase::Prepare => self.prepare,
            Phase::Commit => self.commit,
        };

        let (sender, receiver) = mpsc::channel();
        let (signers, message) = match behavior {
            RoundBehavior::Sign(signers) => (signers, round.message.clone()),
            RoundBehavior::SignWrongMessage(signers) => (signers, b"something else".to_vec()),
            RoundBehavior::Withhold => {
                self.withheld.push(sender);
                return Ok(receiver);
            }
            RoundBehavior::FailToStart => {
                return Err(CosiError::Start(format!("{:?} round refused to start", round.phase)))
            }
        };

        let keypairs = self.keypairs.clone();
        let size = round.tree.size();
        thread::spawn(move || {
            let mut signature = CollectiveSignature::new(size);
            for (pos, keypair) in keypairs.iter().enumerate().take(signers.min(size)) {
                signature.set(pos, Some(keypair.sign(&message)));
            }
            let _ = sender.send(signature);
        });

        Ok(receiver)
    }
}
