//! Execution context handed to every step

use crate::release::ResolvedRelease;
use crate::toolchain::{BlockingScope, Toolchain};
use apkm_config::PathManager;
use apkm_errors::{Error, PatchError};
use apkm_events::{EventEmitter, EventSender};
use apkm_types::PatchOptions;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

/// Data produced by one step and consumed by a later one
#[derive(Debug, Clone, Default)]
pub struct PatchState {
    pub release: Option<ResolvedRelease>,
    pub base_apk: Option<PathBuf>,
    pub injector: Option<PathBuf>,
    pub apk_dir: Option<PathBuf>,
    pub unsigned_apk: Option<PathBuf>,
    pub signed_apk: Option<PathBuf>,
}

/// Unwrap a value an earlier step should have produced
///
/// # Errors
///
/// Returns [`PatchError::MissingPrerequisite`] when the value is absent.
pub fn require<T>(value: Option<T>, step: &str, requirement: &str) -> Result<T, Error> {
    value.ok_or_else(|| {
        PatchError::MissingPrerequisite {
            step: step.to_string(),
            requirement: requirement.to_string(),
        }
        .into()
    })
}

/// Everything a step may touch: options, paths, toolchain, shared run data
/// and the cancellation signal.
pub struct StepContext {
    options: PatchOptions,
    paths: PathManager,
    toolchain: Toolchain,
    cancel: CancellationToken,
    blocking: BlockingScope,
    state: Mutex<PatchState>,
    event_sender: Option<EventSender>,
    correlation_id: Option<String>,
}

impl StepContext {
    #[must_use]
    pub fn new(options: PatchOptions, paths: PathManager, toolchain: Toolchain) -> Self {
        let cancel = CancellationToken::new();
        Self {
            options,
            paths,
            toolchain,
            blocking: BlockingScope::new(cancel.clone()),
            cancel,
            state: Mutex::new(PatchState::default()),
            event_sender: None,
            correlation_id: None,
        }
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, event_sender: EventSender) -> Self {
        self.event_sender = Some(event_sender);
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.blocking = BlockingScope::new(token.clone());
        self.cancel = token;
        self
    }

    /// Stamp every emitted event with this id (the install id)
    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn options(&self) -> &PatchOptions {
        &self.options
    }

    #[must_use]
    pub fn paths(&self) -> &PathManager {
        &self.paths
    }

    #[must_use]
    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    #[must_use]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[must_use]
    pub fn blocking(&self) -> &BlockingScope {
        &self.blocking
    }

    /// Wait for blocking work left behind by cancelled steps
    pub async fn drain_blocking(&self) {
        self.blocking.drain().await;
    }

    /// Copy of the shared run data
    #[must_use]
    pub fn patch_state(&self) -> PatchState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutate the shared run data. Never held across an await.
    pub fn update_state<R>(&self, f: impl FnOnce(&mut PatchState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

impl EventEmitter for StepContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }

    fn correlation_id(&self) -> Option<String> {
        self.correlation_id.clone()
    }
}
