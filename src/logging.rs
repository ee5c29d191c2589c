/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Functions that log out events.
//!
//! The logs defined in this module are printed if the user enabled them when building the
//! [event bus](crate::event_bus::EventBusSpec).
//!
//! This crate logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
//! printed onto a terminal or to a file, set up a
//! [logging implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
//!
//! ## Log message format
//!
//! Log messages are CSVs (Comma Separated Values) with at least two values. The first two values are
//! always:
//! 1. The name of the [event](crate::events) in PascalCase (defined in this module as constants).
//! 2. The time the event was emitted (as number of seconds since the Unix Epoch).
//!
//! The rest of the values differ depending on the kind of event. For example, the following snippet
//! is how a [DropTxBatch](crate::events::DropTxBatchEvent) is printed:
//!
//! ```text
//! DropTxBatch, 1701329264, Id5u7f6, 3, 2
//! ```
//!
//! In the snippet:
//! - The third value is the first seven characters of the Base64 encoding of the public key of the
//!   node whose batch was dropped.
//! - The fourth value is the number of transactions in the dropped batch.
//! - The fifth value is the maximum number of transactions that was requested.

use crate::events::*;
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use std::time::SystemTime;

// Names of each event in PascalCase for printing:
pub const START_PHASE: &str = "StartPhase";
pub const END_PHASE: &str = "EndPhase";
pub const REJECT_PREPARE: &str = "RejectPrepare";
pub const FINISH_BFT_COSI: &str = "FinishBftCosi";

pub const START_COLLECT_TX: &str = "StartCollectTx";
pub const RECEIVE_TX_RESPONSE: &str = "ReceiveTxResponse";
pub const DROP_TX_BATCH: &str = "DropTxBatch";
pub const AGREE_VERSION: &str = "AgreeVersion";

pub const SEND_FAILURE: &str = "SendFailure";

/// Implemented by event types. Used to get a closure that logs the event.
pub(crate) trait Logger {
    /// Returns a pointer to the default logging handler for a given event type.
    fn get_logger() -> Box<dyn Fn(&Self) + Send>;
}

impl Logger for StartPhaseEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |start_phase_event: &StartPhaseEvent| {
            log::info!(
                "{}, {}, {:?}, {}",
                START_PHASE,
                secs_since_unix_epoch(start_phase_event.timestamp),
                start_phase_event.phase,
                start_phase_event.subtrees
            )
        };
        Box::new(logger)
    }
}

impl Logger for EndPhaseEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |end_phase_event: &EndPhaseEvent| {
            log::info!(
                "{}, {}, {:?}, {}",
                END_PHASE,
                secs_since_unix_epoch(end_phase_event.timestamp),
                end_phase_event.phase,
                end_phase_event.participants
            )
        };
        Box::new(logger)
    }
}

impl Logger for RejectPrepareEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |reject_prepare_event: &RejectPrepareEvent| {
            log::warn!(
                "{}, {}, {}, {}",
                REJECT_PREPARE,
                secs_since_unix_epoch(reject_prepare_event.timestamp),
                reject_prepare_event.participants,
                reject_prepare_event.threshold
            )
        };
        Box::new(logger)
    }
}

impl Logger for FinishBftCosiEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |finish_bft_cosi_event: &FinishBftCosiEvent| {
            log::info!(
                "{}, {}, {}",
                FINISH_BFT_COSI,
                secs_since_unix_epoch(finish_bft_cosi_event.timestamp),
                finish_bft_cosi_event.success
            )
        };
        Box::new(logger)
    }
}

impl Logger for StartCollectTxEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |start_collect_tx_event: &StartCollectTxEvent| {
            log::info!(
                "{}, {}, {}, {}, {}, {}",
                START_COLLECT_TX,
                secs_since_unix_epoch(start_collect_tx_event.timestamp),
                first_seven_base64_chars(&start_collect_tx_event.skipchain_id.bytes()),
                first_seven_base64_chars(&start_collect_tx_event.latest_id.bytes()),
                start_collect_tx_event.max_num_txs,
                start_collect_tx_event.version
            )
        };
        Box::new(logger)
    }
}

impl Logger for ReceiveTxResponseEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |receive_tx_response_event: &ReceiveTxResponseEvent| {
            log::debug!(
                "{}, {}, {}, {}, {}",
                RECEIVE_TX_RESPONSE,
                secs_since_unix_epoch(receive_tx_response_event.timestamp),
                first_seven_base64_chars(&receive_tx_response_event.origin.to_bytes()),
                receive_tx_response_event.num_txs,
                receive_tx_response_event.version
            )
        };
        Box::new(logger)
    }
}

impl Logger for DropTxBatchEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |drop_tx_batch_event: &DropTxBatchEvent| {
            log::warn!(
                "{}, {}, {}, {}, {}",
                DROP_TX_BATCH,
                secs_since_unix_epoch(drop_tx_batch_event.timestamp),
                first_seven_base64_chars(&drop_tx_batch_event.origin.to_bytes()),
                drop_tx_batch_event.num_txs,
                drop_tx_batch_event.max_num_txs
            )
        };
        Box::new(logger)
    }
}

impl Logger for AgreeVersionEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |agree_version_event: &AgreeVersionEvent| {
            log::info!(
                "{}, {}, {}, {}",
                AGREE_VERSION,
                secs_since_unix_epoch(agree_version_event.timestamp),
                agree_version_event.version,
                agree_version_event.support
            )
        };
        Box::new(logger)
    }
}

impl Logger for SendFailureEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |send_failure_event: &SendFailureEvent| {
            log::warn!(
                "{}, {}, {}, {}",
                SEND_FAILURE,
                secs_since_unix_epoch(send_failure_event.timestamp),
                send_failure_event
                    .peer
                    .map(|peer| first_seven_base64_chars(&peer.to_bytes()))
                    .unwrap_or_default(),
                send_failure_event.reason
            )
        };
        Box::new(logger)
    }
}

// Get a more readable representation of a bytesequence by base64-encoding it and taking the first 7 characters.
pub(crate) fn first_seven_base64_chars(bytes: &[u8]) -> String {
    let encoded = STANDARD_NO_PAD.encode(bytes);
    if encoded.len() > 7 {
        encoded[0..7].to_string()
    } else {
        encoded
    }
}

fn secs_since_unix_epoch(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}
