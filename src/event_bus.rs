//! The event bus thread, which fires the logging and user-defined handlers registered for each kind of
//! [event](crate::events).
//!
//! ## Starting an event bus
//!
//! ```ignore
//! let (event_publisher, event_bus) =
//!     EventBusSpec::builder()
//!     .log_events(true)
//!     .on_drop_tx_batch(|event| alert(event.origin))
//!     .build()
//!     .start();
//! ```
//!
//! Pass clones of `event_publisher` to the protocols. The bus thread stops when `event_bus` is dropped.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use typed_builder::TypedBuilder;

use crate::events::*;
use crate::logging::Logger;

pub(crate) type HandlerPtr<T> = Box<dyn Fn(&T) + Send>;

const RECV_INTERVAL: Duration = Duration::from_millis(10);

/// Specification of an event bus: whether events are logged, and which user-defined handlers to run.
#[derive(TypedBuilder)]
#[builder(builder_method(doc = "
    Create a builder for building an [EventBusSpec]. On the builder call the following methods to construct a valid [EventBusSpec].

    Required:
    - `.log_events(...)`

    Optional:
    - `.on_start_phase(...)`
    - `.on_end_phase(...)`
    - `.on_reject_prepare(...)`
    - `.on_finish_bft_cosi(...)`
    - `.on_start_collect_tx(...)`
    - `.on_receive_tx_response(...)`
    - `.on_drop_tx_batch(...)`
    - `.on_agree_version(...)`
    - `.on_send_failure(...)`
"))]
pub struct EventBusSpec {
    #[builder(setter(doc = "Log every event through the `log` crate? Required."))]
    log_events: bool,
    #[builder(default, setter(transform = |handler: impl Fn(&StartPhaseEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<StartPhaseEvent>),
    doc = "Register a handler closure to be invoked after the root starts a collective-signing round. Optional."))]
    on_start_phase: Option<HandlerPtr<StartPhaseEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&EndPhaseEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<EndPhaseEvent>),
    doc = "Register a handler closure to be invoked after the root receives the signature of a round. Optional."))]
    on_end_phase: Option<HandlerPtr<EndPhaseEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&RejectPrepareEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<RejectPrepareEvent>),
    doc = "Register a handler closure to be invoked after a prepare signature fails verification. Optional."))]
    on_reject_prepare: Option<HandlerPtr<RejectPrepareEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&FinishBftCosiEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<FinishBftCosiEvent>),
    doc = "Register a handler closure to be invoked after the root emits its final signature. Optional."))]
    on_finish_bft_cosi: Option<HandlerPtr<FinishBftCosiEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&StartCollectTxEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<StartCollectTxEvent>),
    doc = "Register a handler closure to be invoked after the root starts collecting transactions. Optional."))]
    on_start_collect_tx: Option<HandlerPtr<StartCollectTxEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ReceiveTxResponseEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<ReceiveTxResponseEvent>),
    doc = "Register a handler closure to be invoked after the root receives a node's pending transactions. Optional."))]
    on_receive_tx_response: Option<HandlerPtr<ReceiveTxResponseEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&DropTxBatchEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<DropTxBatchEvent>),
    doc = "Register a handler closure to be invoked after the root drops an oversized batch. Optional."))]
    on_drop_tx_batch: Option<HandlerPtr<DropTxBatchEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&AgreeVersionEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<AgreeVersionEvent>),
    doc = "Register a handler closure to be invoked after a common version is agreed upon. Optional."))]
    on_agree_version: Option<HandlerPtr<AgreeVersionEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&SendFailureEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<SendFailureEvent>),
    doc = "Register a handler closure to be invoked after a delivery attempt to a child fails. Optional."))]
    on_send_failure: Option<HandlerPtr<SendFailureEvent>>,
}

impl EventBusSpec {
    /// Start the event bus thread. Returns the sender to give to protocols, and the handle that keeps the
    /// thread alive.
    pub fn start(self) -> (Sender<Event>, EventBus) {
        let handlers = EventHandlers::new(self);
        let (event_publisher, event_subscriber) = mpsc::channel();
        let (shutdown, shutdown_receiver) = mpsc::channel();
        let thread = start_event_bus(handlers, event_subscriber, shutdown_receiver);
        (
            event_publisher,
            EventBus {
                thread: Some(thread),
                shutdown,
            },
        )
    }
}

/// A handle to the event bus thread. When this value is dropped, the thread is gracefully shut down.
pub struct EventBus {
    thread: Option<JoinHandle<()>>,
    shutdown: Sender<()>,
}

impl Drop for EventBus {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

pub(crate) struct EventHandlers {
    pub(crate) start_phase_handlers: Vec<HandlerPtr<StartPhaseEvent>>,
    pub(crate) end_phase_handlers: Vec<HandlerPtr<EndPhaseEvent>>,
    pub(crate) reject_prepare_handlers: Vec<HandlerPtr<RejectPrepareEvent>>,
    pub(crate) finish_bft_cosi_handlers: Vec<HandlerPtr<FinishBftCosiEvent>>,
    pub(crate) start_collect_tx_handlers: Vec<HandlerPtr<StartCollectTxEvent>>,
    pub(crate) receive_tx_response_handlers: Vec<HandlerPtr<ReceiveTxResponseEvent>>,
    pub(crate) drop_tx_batch_handlers: Vec<HandlerPtr<DropTxBatchEvent>>,
    pub(crate) agree_version_handlers: Vec<HandlerPtr<AgreeVersionEvent>>,
    pub(crate) send_failure_handlers: Vec<HandlerPtr<SendFailureEvent>>,
}

impl EventHandlers {
    fn new(spec: EventBusSpec) -> EventHandlers {
        // The logger, if enabled, runs before the user-defined handler of each event.
        fn handlers<T: Logger>(log_events: bool, user: Option<HandlerPtr<T>>) -> Vec<HandlerPtr<T>> {
            let mut handlers = Vec::new();
            if log_events {
                handlers.push(T::get_logger());
            }
            handlers.extend(user);
            handlers
        }

        let log = spec.log_events;
        EventHandlers {
            start_phase_handlers: handlers(log, spec.on_start_phase),
            end_phase_handlers: handlers(log, spec.on_end_phase),
            reject_prepare_handlers: handlers(log, spec.on_reject_prepare),
            finish_bft_cosi_handlers: handlers(log, spec.on_finish_bft_cosi),
            start_collect_tx_handlers: handlers(log, spec.on_start_collect_tx),
            receive_tx_response_handlers: handlers(log, spec.on_receive_tx_response),
            drop_tx_batch_handlers: handlers(log, spec.on_drop_tx_batch),
            agree_version_handlers: handlers(log, spec.on_agree_version),
            send_failure_handlers: handlers(log, spec.on_send_failure),
        }
    }

    pub(crate) fn fire_handlers(&self, event: Event) {
        match event {
            Event::StartPhase(start_phase_event) => self
                .start_phase_handlers
                .iter()
                .for_each(|handler| handler(&start_phase_event)),

            Event::EndPhase(end_phase_event) => self
                .end_phase_handlers
                .iter()
                .for_each(|handler| handler(&end_phase_event)),

            Event::RejectPrepare(reject_prepare_event) => self
                .reject_prepare_handlers
                .iter()
                .for_each(|handler| handler(&reject_prepare_event)),

            Event::FinishBftCosi(finish_bft_cosi_event) => self
                .finish_bft_cosi_handlers
                .iter()
                .for_each(|handler| handler(&finish_bft_cosi_event)),

            Event::StartCollectTx(start_collect_tx_event) => self
                .start_collect_tx_handlers
                .iter()
                .for_each(|handler| handler(&start_collect_tx_event)),

            Event::ReceiveTxResponse(receive_tx_response_event) => self
                .receive_tx_response_handlers
                .iter()
                .for_each(|handler| handler(&receive_tx_response_event)),

            Event::DropTxBatch(drop_tx_batch_event) => self
                .drop_tx_batch_handlers
                .iter()
                .for_each(|handler| handler(&drop_tx_batch_event)),

            Event::AgreeVersion(agree_version_event) => self
                .agree_version_handlers
                .iter()
                .for_each(|handler| handler(&agree_version_event)),

            Event::SendFailure(send_failure_event) => self
                .send_failure_handlers
                .iter()
                .for_each(|handler| handler(&send_failure_event)),
        }
    }
}

pub(crate) fn start_event_bus(
    event_handlers: EventHandlers,
    event_subscriber: Receiver<Event>,
    shutdown_signal: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || loop {
        match shutdown_signal.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => return,
            Err(TryRecvError::Empty) => (),
        }

        match event_subscriber.recv_timeout(RECV_INTERVAL) {
            Ok(event) => event_handlers.fire_handlers(event),
            Err(RecvTimeoutError::Timeout) => (),
            // Every publisher is gone; keep waiting for shutdown.
            Err(RecvTimeoutError::Disconnected) => thread::sleep(RECV_INTERVAL),
        }
    })
}
