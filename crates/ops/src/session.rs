//! Installation session controller

use crate::context::SessionContext;
use apkm_errors::{Error, InstallError};
use apkm_events::{EventEmitter, SessionEvent};
use apkm_patcher::{PatchRunner, StepContext, StepKind, StepRunner, StepSnapshot};
use apkm_state::{InstallRecord, RecordedError};
use apkm_types::{InstallId, PatchOptions, SessionState, StepGroup, StepState, Uuid};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Message recorded when the installer step never completed
pub const ABORTED_MESSAGE: &str = "Installation was aborted or cancelled";

/// Log recorded when the pipeline could not even be assembled
pub const INIT_FAILED_LOG: &str = "- Failed to initialize patch runner";

/// Attempt data readable while the attempt runs
#[derive(Default)]
struct Shared {
    install_id: Option<InstallId>,
    runner: Option<Arc<StepRunner>>,
    last_error: Option<Error>,
    /// Token of the live attempt, fired by `cancel()` without the run lock
    cancel: Option<CancellationToken>,
}

struct Run {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Everything the spawned attempt needs
struct Attempt {
    ctx: Arc<SessionContext>,
    options: PatchOptions,
    install_id: InstallId,
    started_at: DateTime<Utc>,
    token: CancellationToken,
    shared: Arc<Mutex<Shared>>,
    state: Arc<watch::Sender<SessionState>>,
}

/// How an attempt ended
struct Outcome {
    state: SessionState,
    duration: Duration,
    log: String,
    error: Option<Error>,
    recorded: Option<RecordedError>,
}

/// Drives installation attempts for one set of patch options.
///
/// At most one attempt runs at a time. Starting again cancels and joins the
/// previous attempt, which still persists its own record first.
pub struct PatchingSession {
    ctx: Arc<SessionContext>,
    options: PatchOptions,
    state: Arc<watch::Sender<SessionState>>,
    shared: Arc<Mutex<Shared>>,
    run: tokio::sync::Mutex<Option<Run>>,
}

impl PatchingSession {
    #[must_use]
    pub fn new(ctx: SessionContext, options: PatchOptions) -> Self {
        let (state, _) = watch::channel(SessionState::Working);
        Self {
            ctx: Arc::new(ctx),
            options,
            state: Arc::new(state),
            shared: Arc::new(Mutex::new(Shared::default())),
            run: tokio::sync::Mutex::new(None),
        }
    }

    fn shared(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn options(&self) -> &PatchOptions {
        &self.options
    }

    /// Id of the current (or last) attempt
    #[must_use]
    pub fn install_id(&self) -> Option<InstallId> {
        self.shared().install_id
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Error that ended the last attempt, if any
    #[must_use]
    pub fn last_error(&self) -> Option<Error> {
        self.shared().last_error.clone()
    }

    #[must_use]
    pub fn dev_mode(&self) -> bool {
        self.ctx.dev_mode
    }

    /// Step snapshots of the current attempt, clustered by group
    #[must_use]
    pub fn steps(&self) -> BTreeMap<StepGroup, Vec<StepSnapshot>> {
        self.shared()
            .runner
            .as_ref()
            .map(|runner| runner.grouped())
            .unwrap_or_default()
    }

    /// Begin a new attempt and return its install id.
    ///
    /// Any attempt still running is cancelled and joined first.
    ///
    /// # Errors
    ///
    /// Returns an error if cleaning up after the previous attempt fails.
    pub async fn start(&self) -> Result<InstallId, Error> {
        let mut run = self.run.lock().await;
        self.stop(&mut run).await?;

        let install_id = Uuid::new_v4();
        let started_at = Utc::now();
        {
            let mut shared = self.shared();
            shared.install_id = Some(install_id);
            shared.runner = None;
            shared.last_error = None;
        }
        self.publish(SessionState::Working);
        self.ctx.emit_session(SessionEvent::Started { install_id });
        tracing::info!(%install_id, package = %self.options.package_name, "starting installation");

        let token = CancellationToken::new();
        self.shared().cancel = Some(token.clone());
        let attempt = Attempt {
            ctx: self.ctx.clone(),
            options: self.options.clone(),
            install_id,
            started_at,
            token: token.clone(),
            shared: self.shared.clone(),
            state: self.state.clone(),
        };
        let handle = tokio::spawn(attempt.run());

        *run = Some(Run { token, handle });
        Ok(install_id)
    }

    /// Cancel the running attempt and remove its partial output.
    ///
    /// Idempotent; does nothing when no attempt is active. The attempt is
    /// signalled before the run lock is taken, so a concurrent `start()` or
    /// `clear_cache()` holding it cannot delay the cancellation.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be removed.
    pub async fn cancel(&self) -> Result<(), Error> {
        let token = self.shared().cancel.clone();
        if let Some(token) = token {
            token.cancel();
        }
        let mut run = self.run.lock().await;
        self.stop(&mut run).await
    }

    /// Wait for the current attempt to reach a terminal state.
    ///
    /// Observes the state cell only, so any number of waiters may run
    /// alongside `cancel()`.
    pub async fn wait(&self) -> SessionState {
        let active = self.run.lock().await.is_some();
        if !active {
            return self.state();
        }
        let mut rx = self.state.subscribe();
        let state = match rx.wait_for(SessionState::is_terminal).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        state
    }

    /// Remove cached downloads. A running attempt is cancelled first.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be removed.
    pub async fn clear_cache(&self) -> Result<(), Error> {
        let mut run = self.run.lock().await;
        self.stop(&mut run).await?;
        self.ctx.paths.clear_cache().await?;
        self.ctx.emit_session(SessionEvent::CacheCleared);
        tracing::info!("cleared download cache");
        Ok(())
    }

    /// Launch the installed app. Only meaningful after a successful attempt.
    ///
    /// Returns `false` if there is nothing to launch or the package has no
    /// launcher activity; the latter is reported as a warning event.
    ///
    /// # Errors
    ///
    /// Returns an error if the installer tool itself fails.
    pub async fn launch_app(&self) -> Result<bool, Error> {
        if self.state() != SessionState::Success {
            return Ok(false);
        }
        match self
            .ctx
            .toolchain
            .installer
            .launch(&self.options.package_name)
            .await
        {
            Ok(()) => Ok(true),
            Err(Error::Install(InstallError::LaunchUnavailable { package })) => {
                self.ctx
                    .emit_warning(format!("{package} has no launcher activity"));
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn publish(&self, state: SessionState) {
        self.state.send_replace(state.clone());
        self.ctx.emit_session(SessionEvent::StateChanged { state });
    }

    /// Cancel, join and clean up the attempt held in `run`
    async fn stop(&self, run: &mut Option<Run>) -> Result<(), Error> {
        let Some(current) = run.take() else {
            return Ok(());
        };

        current.token.cancel();
        if let Err(e) = current.handle.await {
            tracing::warn!(error = %e, "installation task did not finish cleanly");
        }

        let interrupted = {
            let mut shared = self.shared();
            shared.cancel = None;
            shared
                .runner
                .as_ref()
                .map(|runner| runner.interrupted_downloads())
                .unwrap_or_default()
        };
        for path in interrupted {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(path = %path.display(), "removed partial download"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::io_with_path(&e, &path)),
            }
        }
        self.ctx.paths.delete_working_dir().await
    }
}

impl Attempt {
    async fn run(self) {
        let outcome = match AssertUnwindSafe(self.execute()).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => self.init_failure(e),
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(ToString::to_string)
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                self.init_failure(Error::internal(format!("patch runner panicked: {message}")))
            }
        };
        self.finish(outcome).await;
    }

    async fn execute(&self) -> Result<Outcome, Error> {
        let runner = Arc::new(PatchRunner::new(self.options.clone())?.into_runner()?);
        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .runner = Some(runner.clone());

        if !self.ctx.start_delay.is_zero() {
            tokio::select! {
                () = self.token.cancelled() => {}
                () = tokio::time::sleep(self.ctx.start_delay) => {}
            }
        }

        let mut step_ctx = StepContext::new(
            self.options.clone(),
            self.ctx.paths.clone(),
            self.ctx.toolchain.clone(),
        )
        .with_cancel_token(self.token.clone())
        .with_correlation_id(self.install_id.to_string());
        if let Some(tx) = &self.ctx.tx {
            step_ctx = step_ctx.with_event_sender(tx.clone());
        }

        let failure = runner.execute_all(&step_ctx).await;
        let duration = runner.total_duration();
        let log = runner.log();

        Ok(match failure {
            Some(error) => Outcome {
                state: SessionState::Failed {
                    install_id: self.install_id,
                },
                duration,
                log,
                recorded: Some(RecordedError::from_error(&error)),
                error: Some(error),
            },
            None if runner.step(StepKind::Install).core().state() == StepState::Skipped => {
                Outcome {
                    state: SessionState::CloseScreen,
                    duration,
                    log,
                    error: Some(InstallError::Cancelled.into()),
                    recorded: Some(RecordedError::aborted(ABORTED_MESSAGE)),
                }
            }
            None => Outcome {
                state: SessionState::Success,
                duration,
                log,
                error: None,
                recorded: None,
            },
        })
    }

    fn init_failure(&self, error: Error) -> Outcome {
        Outcome {
            state: SessionState::Failed {
                install_id: self.install_id,
            },
            duration: Duration::ZERO,
            log: INIT_FAILED_LOG.to_string(),
            recorded: Some(RecordedError::from_error(&error)),
            error: Some(error),
        }
    }

    async fn finish(self, outcome: Outcome) {
        let install_id = self.install_id;
        match &outcome.error {
            Some(error) if error.is_insufficient_storage() => {
                tracing::error!(%install_id, "device ran out of storage");
                self.ctx
                    .emit_session(SessionEvent::InsufficientStorage { install_id });
            }
            Some(error) if matches!(outcome.state, SessionState::Failed { .. }) => {
                tracing::error!(%install_id, %error, "installation failed");
            }
            _ => {}
        }

        let record = InstallRecord::new(
            install_id,
            self.started_at,
            outcome.duration,
            self.options,
            outcome.log,
            outcome.recorded,
        );
        match self.ctx.store.store_install_data(record).await {
            Ok(()) => self
                .ctx
                .emit_session(SessionEvent::RecordStored { install_id }),
            Err(e) => tracing::warn!(%install_id, error = %e, "failed to store installation record"),
        }

        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_error = outcome.error;

        tracing::info!(%install_id, state = ?outcome.state, "installation finished");
        self.state.send_replace(outcome.state.clone());
        self.ctx
            .emit_session(SessionEvent::StateChanged { state: outcome.state });
    }
}
