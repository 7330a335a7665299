//! Structured logging integration for events
//!
//! Converts domain events into tracing records with structured fields so the
//! debug log carries the same information the terminal shows.

use apkm_events::{AppEvent, DownloadEvent, EventMessage, GeneralEvent, SessionEvent, StepEvent};
use apkm_types::StepState;
use tracing::{debug, error, info, trace, warn};

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let event = &message.event;
    let meta = &message.meta;
    let level = meta.tracing_level();

    match event {
        AppEvent::Step(StepEvent::StateChanged {
            step,
            group,
            state,
            cause,
            duration_ms,
            failure,
        }) => match (state, failure) {
            (StepState::Failed, Some(failure)) => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    step = %step,
                    group = %group,
                    duration_ms = duration_ms,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Step failed"
                );
            }
            _ => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    step = %step,
                    group = %group,
                    state = %state,
                    cause = ?cause,
                    duration_ms = duration_ms,
                    "Step state changed"
                );
            }
        },

        AppEvent::Download(DownloadEvent::Failed { url, failure }) => {
            error!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                correlation = ?meta.correlation_id,
                url = %url,
                retryable = failure.retryable,
                code = ?failure.code,
                message = %failure.message,
                hint = ?failure.hint,
                "Download failed"
            );
        }
        AppEvent::Download(DownloadEvent::Completed {
            url,
            bytes_downloaded,
        }) => {
            info!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                correlation = ?meta.correlation_id,
                url = %url,
                bytes_downloaded = bytes_downloaded,
                "Download completed"
            );
        }

        AppEvent::Session(SessionEvent::InsufficientStorage { install_id }) => {
            error!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                install_id = %install_id,
                "Device out of storage"
            );
        }
        AppEvent::Session(SessionEvent::StateChanged { state }) => {
            info!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                state = ?state,
                "Session state changed"
            );
        }

        AppEvent::General(GeneralEvent::Warning { message }) => {
            warn!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                correlation = ?meta.correlation_id,
                message = %message,
                "Warning"
            );
        }
        AppEvent::General(GeneralEvent::Error { message }) => {
            error!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                correlation = ?meta.correlation_id,
                message = %message,
                "Error"
            );
        }

        // Fallback for everything without dedicated fields
        _ => match level {
            tracing::Level::ERROR => {
                error!(source = meta.source.as_str(), event_id = %meta.event_id, correlation = ?meta.correlation_id, event = ?event, "Application event")
            }
            tracing::Level::WARN => {
                warn!(source = meta.source.as_str(), event_id = %meta.event_id, correlation = ?meta.correlation_id, event = ?event, "Application event")
            }
            tracing::Level::INFO => {
                info!(source = meta.source.as_str(), event_id = %meta.event_id, correlation = ?meta.correlation_id, event = ?event, "Application event")
            }
            tracing::Level::DEBUG => {
                debug!(source = meta.source.as_str(), event_id = %meta.event_id, correlation = ?meta.correlation_id, event = ?event, "Application event")
            }
            tracing::Level::TRACE => {
                trace!(source = meta.source.as_str(), event_id = %meta.event_id, correlation = ?meta.correlation_id, event = ?event, "Application event")
            }
        },
    }
}
