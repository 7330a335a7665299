//! Filesystem layout of an installation attempt

use apkm_errors::Error;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Resolves every path the patching pipeline reads or writes.
///
/// Downloads are cached across attempts under `cache/`, while everything under
/// the working directory belongs to a single attempt and is removed on cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathManager {
    data_dir: PathBuf,
    cache_dir: PathBuf,
}

impl PathManager {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache_dir: cache_dir.into(),
        }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Scratch directory of the current attempt
    #[must_use]
    pub fn patching_working_dir(&self) -> PathBuf {
        self.cache_dir.join("patching")
    }

    /// Installation records, one JSON file per install id
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// Cached base package for a release version
    #[must_use]
    pub fn cached_base_apk(&self, version: &str) -> PathBuf {
        self.cache_dir
            .join("apks")
            .join(format!("base-{version}.apk"))
    }

    /// Cached mod payload for a release version
    #[must_use]
    pub fn cached_injector(&self, version: &str) -> PathBuf {
        self.cache_dir
            .join("injector")
            .join(format!("injector-{version}.dex"))
    }

    #[must_use]
    pub fn unpacked_apk_dir(&self) -> PathBuf {
        self.patching_working_dir().join("apk")
    }

    #[must_use]
    pub fn unsigned_apk(&self) -> PathBuf {
        self.patching_working_dir().join("unsigned.apk")
    }

    /// Signed artifact handed to the installer
    #[must_use]
    pub fn patched_apk(&self) -> PathBuf {
        self.patching_working_dir().join("patched.apk")
    }

    /// Recursively remove the working directory. Missing is fine.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be removed.
    pub async fn delete_working_dir(&self) -> Result<(), Error> {
        remove_dir_all_if_exists(&self.patching_working_dir()).await
    }

    /// Remove all cached downloads and any leftover working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory exists but cannot be removed.
    pub async fn clear_cache(&self) -> Result<(), Error> {
        remove_dir_all_if_exists(&self.cache_dir).await
    }
}

async fn remove_dir_all_if_exists(path: &Path) -> Result<(), Error> {
    match fs::remove_dir_all(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed directory");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io_with_path(&e, path)),
    }
}
