//! Session context for dependency injection

use apkm_config::{Config, PathManager};
use apkm_errors::{ConfigError, Error};
use apkm_events::{EventEmitter, EventSender};
use apkm_patcher::Toolchain;
use apkm_state::{InstallLogStore, JsonInstallLogStore};
use std::sync::Arc;
use std::time::Duration;

/// Collaborators shared by every attempt of a session
pub struct SessionContext {
    /// Path provider
    pub paths: PathManager,
    /// External primitives the steps call
    pub toolchain: Toolchain,
    /// Diagnostic log store
    pub store: Arc<dyn InstallLogStore>,
    /// Event sender for progress reporting
    pub tx: Option<EventSender>,
    /// Delay before the first step so the UI can render the Running state
    pub start_delay: Duration,
    /// Developer preference flag
    pub dev_mode: bool,
}

impl EventEmitter for SessionContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

/// Builder for [`SessionContext`]
pub struct SessionContextBuilder {
    paths: Option<PathManager>,
    toolchain: Option<Toolchain>,
    store: Option<Arc<dyn InstallLogStore>>,
    tx: Option<EventSender>,
    start_delay: Duration,
    dev_mode: bool,
}

impl SessionContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            paths: None,
            toolchain: None,
            store: None,
            tx: None,
            start_delay: Duration::ZERO,
            dev_mode: false,
        }
    }

    /// Builder pre-filled from configuration: default toolchain, JSON record
    /// store under the data directory, configured delay and dev flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the default toolchain cannot be created.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let paths = config.path_manager();
        let store = Arc::new(JsonInstallLogStore::new(paths.logs_dir()));
        Ok(Self::new()
            .with_toolchain(Toolchain::from_config(config)?)
            .with_log_store(store)
            .with_paths(paths)
            .with_start_delay(Duration::from_millis(config.patching.start_delay_ms))
            .with_dev_mode(config.general.dev_mode))
    }

    #[must_use]
    pub fn with_paths(mut self, paths: PathManager) -> Self {
        self.paths = Some(paths);
        self
    }

    #[must_use]
    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = Some(toolchain);
        self
    }

    #[must_use]
    pub fn with_log_store(mut self, store: Arc<dyn InstallLogStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    #[must_use]
    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns an error if paths, toolchain or log store were not provided.
    pub fn build(self) -> Result<SessionContext, Error> {
        let missing = |field: &str| ConfigError::Invalid {
            message: format!("session context is missing {field}"),
        };
        Ok(SessionContext {
            paths: self.paths.ok_or_else(|| missing("paths"))?,
            toolchain: self.toolchain.ok_or_else(|| missing("toolchain"))?,
            store: self.store.ok_or_else(|| missing("log store"))?,
            tx: self.tx,
            start_delay: self.start_delay,
            dev_mode: self.dev_mode,
        })
    }
}

impl Default for SessionContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
