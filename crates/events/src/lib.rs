#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for versolve
//!
//! Resolution and catalog loading report progress through typed events sent
//! over an unbounded channel. Consumers that want log output pass each
//! received message to [`log_event`], which records it through `tracing`.
//!
//! ## Architecture
//!
//! - **Domain events**: grouped by functional domain (Resolver, Catalog)
//! - **`EventEmitter` trait**: one API for any holder of an optional sender
//! - **Metadata**: every message carries an [`EventMeta`] with id, level, source crate and solve phase

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource, SolvePhase};

pub mod events;
pub use events::{AppEvent, CatalogEvent, FailureContext, ResolverEvent};

mod logging;
pub use logging::log_event;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// An event together with its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

impl EventMessage {
    #[must_use]
    pub fn new(meta: EventMeta, event: AppEvent) -> Self {
        Self { meta, event }
    }

    /// Wrap an event with metadata derived from its domain and level
    #[must_use]
    pub fn from_event(event: AppEvent) -> Self {
        let meta = EventMeta::new(event.log_level(), event.event_source(), event.phase());
        Self { meta, event }
    }
}

/// Sending half of the event channel
pub type EventSender = UnboundedSender<EventMessage>;

/// Receiving half of the event channel
pub type EventReceiver = UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events
///
/// Implemented by the raw sender and by anything that optionally holds one.
/// Without a sender, emission is a no-op.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Optional correlation id attached to every emitted message
    fn correlation_id(&self) -> Option<&str> {
        None
    }

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            let mut message = EventMessage::from_event(event);
            if let Some(id) = self.correlation_id() {
                message.meta = message.meta.with_correlation_id(id);
            }
            // Receiver may be gone; emission never fails the caller
            let _ = sender.send(message);
        }
    }

    fn emit_resolver(&self, event: ResolverEvent) {
        self.emit(AppEvent::Resolver(event));
    }

    fn emit_catalog(&self, event: CatalogEvent) {
        self.emit(AppEvent::Catalog(event));
    }
}

impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

impl EventEmitter for Option<EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.as_ref()
    }
}
