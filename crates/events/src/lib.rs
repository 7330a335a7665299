#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in apkm
//!
//! Lower layers never print or toast. They emit events that the session
//! controller and the CLI turn into progress output and log records.
//!
//! - **Domain events**: grouped by concern (step lifecycle, downloads, session)
//! - **`EventEmitter` trait**: one API whether you hold a sender or a context
//! - **Metadata**: every emission carries an [`EventMeta`] for correlation

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{
    AppEvent, DownloadEvent, FailureContext, GeneralEvent, SessionEvent, StepEvent,
};

use tokio::sync::mpsc::UnboundedSender;

/// An event together with its metadata
#[derive(Debug, Clone)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

impl EventMessage {
    #[must_use]
    pub fn new(meta: EventMeta, event: AppEvent) -> Self {
        Self { meta, event }
    }

    /// Wrap an event with metadata derived from the event itself
    #[must_use]
    pub fn from_event(event: AppEvent) -> Self {
        let meta = EventMeta::new(event.log_level(), event.event_source());
        Self { meta, event }
    }
}

/// Type alias for the event sender
pub type EventSender = UnboundedSender<EventMessage>;

/// Type alias for the event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Anything that can put events on the channel.
///
/// Implemented by the raw `EventSender` and by the step and session contexts,
/// which additionally stamp the install id as correlation id.
pub trait EventEmitter {
    fn event_sender(&self) -> Option<&EventSender>;

    fn correlation_id(&self) -> Option<String> {
        None
    }

    /// Send an event. A dropped receiver is not an error.
    fn emit(&self, event: AppEvent) {
        let Some(sender) = self.event_sender() else {
            return;
        };
        let mut meta = EventMeta::new(event.log_level(), event.event_source());
        if let Some(id) = self.correlation_id() {
            meta = meta.with_correlation_id(id);
        }
        let _ = sender.send(EventMessage::new(meta, event));
    }

    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error(message)));
    }

    /// Progress note from inside a running step
    fn emit_step_note(&self, step: impl Into<String>, message: impl Into<String>) {
        self.emit(AppEvent::Step(StepEvent::Note {
            step: step.into(),
            message: message.into(),
        }));
    }

    fn emit_download_progress(&self, url: impl Into<String>, bytes: u64, total: Option<u64>) {
        self.emit(AppEvent::Download(DownloadEvent::Progress {
            url: url.into(),
            bytes_downloaded: bytes,
            total_bytes: total,
        }));
    }

    fn emit_session(&self, event: SessionEvent) {
        self.emit(AppEvent::Session(event));
    }
}

impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

/// Optional sender, for callers that may run without an event channel
impl EventEmitter for Option<&EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        *self
    }
}
