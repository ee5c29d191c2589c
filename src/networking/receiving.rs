//! Functions and types for receiving messages from a protocol instance's inbox.

use std::{
    collections::VecDeque,
    sync::mpsc::{Receiver, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use ed25519_dalek::VerifyingKey;

use crate::instance::SignalListener;

use super::messages::Message;

/// How long a blocked receive waits on the inbox before re-checking its signals.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Maximum number of messages held back for later by an [`InboxStub`].
pub(crate) const MAX_BUFFERED_MSGS: usize = 1024;

/// A receiving end for the messages addressed to one protocol instance.
///
/// ## Selective receive
///
/// Protocols usually wait for one kind of message at a time (e.g., a request before any response). The
/// stub's [`recv`](Self::recv) returns the first message accepted by a caller-supplied filter. Messages
/// that the filter rejects are not discarded but held back in a buffer, and are offered again (in arrival
/// order) to subsequent calls, so that a message which arrives "early" is not lost.
///
/// ## Buffer management
///
/// If the buffer grows beyond [`MAX_BUFFERED_MSGS`], the oldest held-back message is dropped to make space.
pub(crate) struct InboxStub {
    inbox: Receiver<(VerifyingKey, Message)>,
    buffer: VecDeque<(VerifyingKey, Message)>,
}

impl InboxStub {
    pub(crate) fn new(inbox: Receiver<(VerifyingKey, Message)>) -> InboxStub {
        Self {
            inbox,
            buffer: VecDeque::new(),
        }
    }

    /// Receive the first message for which `accept` returns `Some`, converted by `accept`.
    ///
    /// Waits until either:
    /// 1. An accepted message is available (`Ok`),
    /// 2. `deadline` (if any) passes ([`ReceiveError::Timeout`]),
    /// 3. One of `interrupts` fires ([`ReceiveError::Interrupted`], with the index of the signal that
    ///    fired), or
    /// 4. The inbox is disconnected ([`ReceiveError::Disconnected`]).
    ///
    /// Interrupts are checked before each wait, and at least every [`POLL_INTERVAL`] while waiting.
    pub(crate) fn recv<T>(
        &mut self,
        accept: impl Fn(&Message) -> Option<T>,
        deadline: Option<Instant>,
        interrupts: &[&SignalListener],
    ) -> Result<(VerifyingKey, T), ReceiveError> {
        // Try messages held back by previous calls first.
        if let Some(pos) = self.buffer.iter().position(|(_, msg)| accept(msg).is_some()) {
            if let Some((origin, msg)) = self.buffer.remove(pos) {
                if let Some(accepted) = accept(&msg) {
                    return Ok((origin, accepted));
                }
            }
        }

        loop {
            if let Some(fired) = interrupts.iter().position(|signal| signal.has_fired()) {
                return Err(ReceiveError::Interrupted(fired));
            }

            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(ReceiveError::Timeout);
                    }
                    (deadline - now).min(POLL_INTERVAL)
                }
                None => POLL_INTERVAL,
            };

            match self.inbox.recv_timeout(wait) {
                Ok((origin, msg)) => match accept(&msg) {
                    Some(accepted) => return Ok((origin, accepted)),
                    None => self.hold_back(origin, msg),
                },
                Err(RecvTimeoutError::Timeout) => thread::yield_now(),
                Err(RecvTimeoutError::Disconnected) => return Err(ReceiveError::Disconnected),
            }
        }
    }

    fn hold_back(&mut self, origin: VerifyingKey, msg: Message) {
        if self.buffer.len() >= MAX_BUFFERED_MSGS {
            if let Some((dropped_origin, dropped)) = self.buffer.pop_front() {
                log::debug!(
                    "Inbox buffer full, dropping {} from {:?}",
                    dropped.kind(),
                    dropped_origin
                );
            }
        }
        self.buffer.push_back((origin, msg));
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ReceiveError {
    Timeout,
    Interrupted(usize),
    Disconnected,
}
