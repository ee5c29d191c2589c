/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The root's instance of the two-phase protocol.

use std::{
    sync::mpsc::{self, Receiver, Sender},
    time::SystemTime,
};

use ed25519_dalek::VerifyingKey;

use crate::{
    cosi::{CollectiveSignature, CollectiveSigning, CosiRound, Phase},
    events::*,
    instance::{ProtocolInstance, TreeNodeInstance, WaitError},
    networking::network::Network,
    quorum::ThresholdPolicy,
};

use super::types::{BftCosiConfiguration, BftCosiError, FinalSignature};

/// Drives the prepare and commit phases from the root of a tree.
///
/// A `BftCosi` is single-use: a new one must be created for every candidate message.
pub struct BftCosi<N: Network, C: CollectiveSigning> {
    node: TreeNodeInstance<N>,
    signer: C,
    config: BftCosiConfiguration,
    msg: Vec<u8>,
    data: Vec<u8>,
    publics: Vec<VerifyingKey>,
    started: bool,
    prepare_signature: Option<Receiver<CollectiveSignature>>,
    final_signature: Sender<FinalSignature>,
    event_publisher: Option<Sender<Event>>,
}

impl<N: Network, C: CollectiveSigning> BftCosi<N, C> {
    /// Create the instance, and the receiving end on which its [`FinalSignature`] is delivered once.
    ///
    /// `signer` runs each collective-signing round over `node`'s tree.
    pub fn new(
        node: TreeNodeInstance<N>,
        signer: C,
        config: BftCosiConfiguration,
        event_publisher: Option<Sender<Event>>,
    ) -> (BftCosi<N, C>, Receiver<FinalSignature>) {
        let (final_signature, final_signature_receiver) = mpsc::channel();
        let publics = node.tree().publics();
        let bft = BftCosi {
            node,
            signer,
            config,
            msg: Vec::new(),
            data: Vec::new(),
            publics,
            started: false,
            prepare_signature: None,
            final_signature,
            event_publisher,
        };
        (bft, final_signature_receiver)
    }

    /// Set the candidate message that both phases sign.
    pub fn set_message(&mut self, msg: Vec<u8>) {
        self.msg = msg;
    }

    /// Set auxiliary data handed to signers to help them verify the message. It is never signed.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
    }

    fn start_round(&mut self, phase: Phase) -> Result<Receiver<CollectiveSignature>, BftCosiError> {
        let subtrees = self
            .config
            .subtree_policy
            .subtree_count(self.node.tree().size());
        let round = CosiRound {
            phase,
            message: self.msg.clone(),
            data: self.data.clone(),
            tree: self.node.tree().clone(),
            subtrees,
        };

        log::debug!("Starting {:?} phase over {} subtrees", phase, subtrees);
        let signature = self.signer.run(round)?;

        Event::publish(
            &self.event_publisher,
            Event::StartPhase(StartPhaseEvent {
                timestamp: SystemTime::now(),
                phase,
                subtrees,
            }),
        );

        Ok(signature)
    }

    /// Wait for the signature of the round of `phase`. Returns `Ok(None)` if the instance was shut down.
    fn wait_for_signature(
        &self,
        phase: Phase,
        signature: &Receiver<CollectiveSignature>,
    ) -> Result<Option<CollectiveSignature>, BftCosiError> {
        match self.node.wait_for(signature) {
            Ok(signature) => {
                Event::publish(
                    &self.event_publisher,
                    Event::EndPhase(EndPhaseEvent {
                        timestamp: SystemTime::now(),
                        phase,
                        participants: signature.participants(),
                    }),
                );
                Ok(Some(signature))
            }
            Err(WaitError::Shutdown) => Ok(None),
            Err(_) => Err(BftCosiError::SignatureChannelClosed),
        }
    }

    fn finish(&self, final_signature: FinalSignature) {
        let success = !final_signature.is_failure();
        // The caller may have stopped listening.
        let _ = self.final_signature.send(final_signature);

        Event::publish(
            &self.event_publisher,
            Event::FinishBftCosi(FinishBftCosiEvent {
                timestamp: SystemTime::now(),
                success,
            }),
        );
    }
}

impl<N, C> ProtocolInstance for BftCosi<N, C>
where
    N: Network + 'static,
    C: CollectiveSigning + 'static,
{
    type Error = BftCosiError;

    /// Check the preconditions of the run, then start the prepare phase.
    fn start(&mut self) -> Result<(), BftCosiError> {
        if !self.node.is_root() {
            return Err(BftCosiError::NotRoot);
        }
        if self.started {
            return Err(BftCosiError::AlreadyStarted);
        }
        if self.msg.is_empty() {
            return Err(BftCosiError::MissingMessage);
        }

        self.started = true;
        let prepare_signature = self.start_round(Phase::Prepare)?;
        self.prepare_signature = Some(prepare_signature);
        Ok(())
    }

    /// Wait for the prepare phase to finish, check its signature, run the commit phase if the check
    /// passes, and deliver the final signature.
    fn dispatch(mut self) -> Result<(), BftCosiError> {
        if !self.node.is_root() {
            return Err(BftCosiError::NotRoot);
        }
        let prepare_signature = self
            .prepare_signature
            .take()
            .ok_or(BftCosiError::NotStarted)?;

        // Prepare.
        let prepare_signature = match self.wait_for_signature(Phase::Prepare, &prepare_signature)? {
            Some(signature) => signature,
            None => return Ok(()),
        };

        // Verify.
        let policy = ThresholdPolicy::bft(self.publics.len());
        if let Err(err) = prepare_signature.verify(&self.publics, &self.msg, &policy) {
            log::warn!("Prepare signature rejected: {:?}", err);
            Event::publish(
                &self.event_publisher,
                Event::RejectPrepare(RejectPrepareEvent {
                    timestamp: SystemTime::now(),
                    participants: prepare_signature.participants(),
                    threshold: policy.threshold(),
                }),
            );
            self.finish(FinalSignature::failure());
            return Ok(());
        }

        // Commit.
        let commit_signature = self.start_round(Phase::Commit)?;
        let commit_signature = match self.wait_for_signature(Phase::Commit, &commit_signature)? {
            Some(signature) => signature,
            None => return Ok(()),
        };

        let msg = std::mem::take(&mut self.msg);
        self.finish(FinalSignature {
            msg,
            sig: Some(commit_signature),
        });
        Ok(())
    }
}
