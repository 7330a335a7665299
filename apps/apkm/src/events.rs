//! Event handling and progress display

use apkm_events::{
    AppEvent, DownloadEvent, EventMessage, FailureContext, GeneralEvent, SessionEvent, StepEvent,
};
use apkm_types::StepState;
use console::{Style, Term};
use std::collections::HashMap;

/// Event handler for progress display and user feedback
pub struct EventHandler {
    term: Term,
    colors_enabled: bool,
    debug_enabled: bool,
    /// Suppresses all human-readable output
    quiet: bool,
    /// Announced size of each active download by URL
    downloads: HashMap<String, Option<u64>>,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, debug_enabled: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors_enabled,
            debug_enabled,
            quiet,
            downloads: HashMap::new(),
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        crate::logging::log_event_with_tracing(&message);

        match message.event {
            AppEvent::Step(event) => self.handle_step_event(event),
            AppEvent::Download(event) => self.handle_download_event(event),
            AppEvent::Session(event) => self.handle_session_event(&event),
            AppEvent::General(event) => self.handle_general_event(event),
        }
    }

    fn handle_step_event(&mut self, event: StepEvent) {
        match event {
            StepEvent::PipelineStarted { steps } => {
                self.show_debug(&format!("Pipeline: {}", steps.join(", ")));
            }
            StepEvent::StateChanged {
                step,
                state,
                cause,
                duration_ms,
                failure,
                ..
            } => match state {
                StepState::Running => self.show_status(&format!("[..] {step}")),
                StepState::Success => {
                    let line = format!("[OK] {step} ({duration_ms}ms)");
                    self.show_styled(&line, &Style::new().green());
                }
                StepState::Skipped => {
                    let cause = cause.map_or_else(String::new, |c| format!(" ({c})"));
                    self.show_styled(&format!("[SKIP] {step}{cause}"), &Style::new().dim());
                }
                StepState::Failed => {
                    let detail = failure.as_ref().map_or_else(String::new, describe_failure);
                    self.show_error(&format!("[FAIL] {step}{detail}"));
                }
                StepState::Pending => {}
            },
            StepEvent::Note { step, message } => {
                self.show_debug(&format!("{step}: {message}"));
            }
            StepEvent::PipelineFinished {
                success,
                duration_ms,
            } => {
                self.show_debug(&format!(
                    "Pipeline finished (success: {success}) in {duration_ms}ms"
                ));
            }
        }
    }

    fn handle_download_event(&mut self, event: DownloadEvent) {
        match event {
            DownloadEvent::Started { url, total_bytes } => {
                let size = total_bytes.map_or_else(String::new, |b| format!(" ({})", format_bytes(b)));
                self.show_status(&format!("     Downloading {url}{size}"));
                self.downloads.insert(url, total_bytes);
            }
            DownloadEvent::Progress {
                url,
                bytes_downloaded,
                total_bytes,
            } => {
                let total = total_bytes
                    .or_else(|| self.downloads.get(&url).copied().flatten())
                    .map_or_else(|| "?".to_string(), format_bytes);
                self.show_debug(&format!(
                    "{url}: {} / {total}",
                    format_bytes(bytes_downloaded)
                ));
            }
            DownloadEvent::Completed {
                url,
                bytes_downloaded,
            } => {
                self.downloads.remove(&url);
                self.show_debug(&format!("Downloaded {}", format_bytes(bytes_downloaded)));
            }
            DownloadEvent::Failed { url, failure } => {
                self.downloads.remove(&url);
                self.show_debug(&format!("Download of {url} failed{}", describe_failure(&failure)));
            }
        }
    }

    fn handle_session_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Started { install_id } => {
                self.show_debug(&format!("Install id: {install_id}"));
            }
            SessionEvent::InsufficientStorage { .. } => {
                self.show_error(
                    "The device ran out of storage. Free up some space and try again.",
                );
            }
            SessionEvent::RecordStored { install_id } => {
                self.show_debug(&format!("Stored installation record {install_id}"));
            }
            SessionEvent::StateChanged { .. } | SessionEvent::CacheCleared => {}
        }
    }

    fn handle_general_event(&mut self, event: GeneralEvent) {
        match event {
            GeneralEvent::Warning { message } => {
                self.show_styled(&format!("Warning: {message}"), &Style::new().yellow());
            }
            GeneralEvent::Error { message } => self.show_error(&format!("Error: {message}")),
            GeneralEvent::Debug { message } => self.show_debug(&message),
        }
    }

    /// Show status message
    fn show_status(&self, message: &str) {
        if !self.quiet {
            self.term.write_line(message).unwrap_or(());
        }
    }

    fn show_styled(&self, message: &str, style: &Style) {
        if self.colors_enabled {
            self.show_status(&style.apply_to(message).to_string());
        } else {
            self.show_status(message);
        }
    }

    /// Show error message
    fn show_error(&self, message: &str) {
        self.show_styled(message, &Style::new().red().bold());
    }

    fn show_debug(&self, message: &str) {
        if self.debug_enabled {
            self.show_styled(message, &Style::new().dim());
        }
    }
}

fn describe_failure(failure: &FailureContext) -> String {
    let mut out = format!(": {}", failure.message);
    if let Some(hint) = &failure.hint {
        out.push_str(&format!(" (hint: {hint})"));
    }
    out
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / MIB)
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
