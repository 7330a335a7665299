//! Tracked blocking work

use apkm_errors::Error;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Runs blocking closures that outlive a dropped step future.
///
/// The closure gets the attempt's cancellation token and must poll it
/// between units of work. [`BlockingScope::drain`] waits until every closure
/// has returned, so nothing writes into a directory after it is removed.
#[derive(Debug, Clone, Default)]
pub struct BlockingScope {
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl BlockingScope {
    #[must_use]
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            tracker: TaskTracker::new(),
        }
    }

    /// Run `work` on the blocking pool and wait for its result.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or an internal error if it panicked.
    pub async fn run<F, R>(&self, what: &str, work: F) -> Result<R, Error>
    where
        F: FnOnce(&CancellationToken) -> Result<R, Error> + Send + 'static,
        R: Send + 'static,
    {
        let cancel = self.cancel.clone();
        self.tracker
            .spawn_blocking(move || work(&cancel))
            .await
            .map_err(|e| Error::internal(format!("{what} task failed: {e}")))?
    }

    /// Number of closures still running
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every closure started through this scope
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

/// Bail out of a blocking loop once the attempt is cancelled
pub(crate) fn check(cancel: &CancellationToken) -> Result<(), Error> {
    if cancel.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}
