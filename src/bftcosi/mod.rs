//! Two-phase Byzantine fault tolerant collective signing.
//!
//! The root of a tree obtains a quorum-certified signature over a candidate message by running two
//! sequential [collective-signing](crate::cosi) rounds over the whole tree:
//! 1. **Prepare**: a round over the candidate message. Its signature proves that a quorum of signers
//!    *saw* the proposal.
//! 2. **Verify**: the root checks the prepare signature against every signer's public key, with the
//!    [threshold](crate::quorum::ThresholdPolicy::bft) derived from the size of the tree. If the check
//!    fails, the root emits the [failure sentinel](types::FinalSignature::is_failure) and stops.
//! 3. **Commit**: a second round over the same message and the same tree. Its signature proves that a
//!    quorum *accepts* the proposal.
//!
//! Only the root drives the phases. Non-root nodes participate through the host's collective-signing
//! primitive and have no instance of this protocol.
//!
//! ## Usage
//!
//! ```ignore
//! let (mut bft, final_signature) = BftCosi::new(node, signer, BftCosiConfiguration::default(), None);
//! bft.set_message(proposal);
//! bft.start()?;
//! let handle = instance::spawn(bft);
//! let final_signature = final_signature.recv()?;
//! ```

pub mod types;

pub mod protocol;
