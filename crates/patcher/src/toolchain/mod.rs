//! External primitives the steps call
//!
//! Every side effect outside the working directory bookkeeping goes through
//! one of these traits so pipelines can run against fakes in tests.

mod archive;
mod blocking;
mod editor;
mod process;

pub use archive::ZipApkArchive;
pub use blocking::BlockingScope;
pub use editor::{ManifestPatch, XmlApkEditor};
pub use process::{classify_install_output, AdbInstaller, ApksignerSigner};

use crate::release::{GithubReleaseSource, ReleaseSource};
use apkm_config::Config;
use apkm_errors::Error;
use apkm_events::EventSender;
use apkm_net::{download_file, NetClient, NetConfig};
use apkm_types::IconReplacement;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Fetches a remote file into a local path
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url` to `dest`, returning the number of bytes written.
    /// A failed download must not leave `dest` behind.
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        events: Option<&EventSender>,
    ) -> Result<u64, Error>;
}

#[async_trait]
impl Downloader for NetClient {
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        events: Option<&EventSender>,
    ) -> Result<u64, Error> {
        download_file(self, url, dest, events, |_| {}).await
    }
}

/// Unpacks and repacks package archives
#[async_trait]
pub trait ApkArchive: Send + Sync {
    /// Blocking work must run through `scope` so a cancelled attempt can
    /// stop it and wait for it before cleaning up.
    async fn extract(&self, apk: &Path, dest: &Path, scope: &BlockingScope) -> Result<(), Error>;

    async fn repack(&self, src_dir: &Path, out: &Path, scope: &BlockingScope)
        -> Result<(), Error>;
}

/// Edits the unpacked package in place
#[async_trait]
pub trait ApkEditor: Send + Sync {
    async fn patch_manifest(&self, apk_dir: &Path, patch: &ManifestPatch) -> Result<(), Error>;

    async fn patch_icons(&self, apk_dir: &Path, icon: &IconReplacement) -> Result<(), Error>;
}

#[async_trait]
pub trait ApkSigner: Send + Sync {
    async fn sign(&self, unsigned: &Path, signed: &Path) -> Result<(), Error>;
}

/// Installs and launches packages on the target device
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Install the package. A user abort surfaces as `InstallError::Cancelled`,
    /// a full device as `StorageError::InsufficientStorage`.
    async fn install(&self, apk: &Path) -> Result<(), Error>;

    async fn launch(&self, package: &str) -> Result<(), Error>;
}

/// The bundle of primitives a pipeline runs against
#[derive(Clone)]
pub struct Toolchain {
    pub releases: Arc<dyn ReleaseSource>,
    pub downloader: Arc<dyn Downloader>,
    pub archive: Arc<dyn ApkArchive>,
    pub editor: Arc<dyn ApkEditor>,
    pub signer: Arc<dyn ApkSigner>,
    pub installer: Arc<dyn PackageInstaller>,
}

impl Toolchain {
    /// Default toolchain: GitHub releases, HTTP downloads, zip archives,
    /// XML resource editing, `apksigner` and `adb`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let client = NetClient::new(NetConfig::from(&config.network))?;
        Ok(Self {
            releases: Arc::new(GithubReleaseSource::new(
                client.clone(),
                config.patching.releases_url.clone(),
            )),
            downloader: Arc::new(client),
            archive: Arc::new(ZipApkArchive),
            editor: Arc::new(XmlApkEditor),
            signer: Arc::new(ApksignerSigner::new(
                config.patching.apksigner.clone(),
                config.keystore_path(),
                config.patching.keystore_password.clone(),
            )),
            installer: Arc::new(AdbInstaller::new(config.patching.adb.clone())),
        })
    }
}
