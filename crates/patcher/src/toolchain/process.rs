//! Signing and installation through platform tools

use super::{ApkSigner, PackageInstaller};
use apkm_errors::{Error, InstallError, SigningError, StorageError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

const INSUFFICIENT_STORAGE: &str = "INSTALL_FAILED_INSUFFICIENT_STORAGE";
const USER_ABORTED: [&str; 2] = ["INSTALL_FAILED_ABORTED", "INSTALL_FAILED_USER_RESTRICTED"];

/// Signs with the `apksigner` tool from the Android build tools
#[derive(Debug, Clone)]
pub struct ApksignerSigner {
    program: String,
    keystore: PathBuf,
    password: String,
}

impl ApksignerSigner {
    #[must_use]
    pub fn new(program: impl Into<String>, keystore: impl Into<PathBuf>, password: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            keystore: keystore.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl ApkSigner for ApksignerSigner {
    async fn sign(&self, unsigned: &Path, signed: &Path) -> Result<(), Error> {
        if !tokio::fs::try_exists(&self.keystore).await.unwrap_or(false) {
            return Err(SigningError::KeystoreNotFound {
                path: self.keystore.display().to_string(),
            }
            .into());
        }

        let output = Command::new(&self.program)
            .arg("sign")
            .arg("--ks")
            .arg(&self.keystore)
            .arg("--ks-pass")
            .arg(format!("pass:{}", self.password))
            .arg("--out")
            .arg(signed)
            .arg(unsigned)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SigningError::ToolUnavailable {
                    tool: self.program.clone(),
                }
                .into(),
                _ => Error::from(e),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(SigningError::SigningFailed {
                reason: combined_output(&output).trim().to_string(),
            }
            .into())
        }
    }
}

/// Installs over `adb` to the connected device
#[derive(Debug, Clone)]
pub struct AdbInstaller {
    program: String,
}

impl AdbInstaller {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Output, Error> {
        Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => InstallError::InstallerUnavailable {
                    tool: self.program.clone(),
                }
                .into(),
                _ => Error::from(e),
            })
    }
}

#[async_trait]
impl PackageInstaller for AdbInstaller {
    async fn install(&self, apk: &Path) -> Result<(), Error> {
        let apk = apk.to_string_lossy();
        let output = self.run(&["install", "-r", apk.as_ref()]).await?;
        classify_install_output(output.status.success(), &combined_output(&output))
    }

    async fn launch(&self, package: &str) -> Result<(), Error> {
        let output = self
            .run(&[
                "shell",
                "monkey",
                "-p",
                package,
                "-c",
                "android.intent.category.LAUNCHER",
                "1",
            ])
            .await?;
        let text = combined_output(&output);
        if !output.status.success() || text.contains("No activities found") {
            return Err(InstallError::LaunchUnavailable {
                package: package.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

/// Map installer output to a result.
///
/// # Errors
///
/// - `StorageError::InsufficientStorage` when the device is full
/// - `InstallError::Cancelled` when the user aborted the install prompt
/// - `InstallError::Rejected` for any other `INSTALL_FAILED_*` reason
/// - `InstallError::Failed` when the tool failed without a reason
pub fn classify_install_output(exit_ok: bool, output: &str) -> Result<(), Error> {
    if output.contains(INSUFFICIENT_STORAGE) {
        return Err(StorageError::InsufficientStorage {
            path: "device".to_string(),
        }
        .into());
    }
    if USER_ABORTED.iter().any(|code| output.contains(code)) {
        return Err(InstallError::Cancelled.into());
    }
    if let Some(reason) = output
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_'))
        .find(|word| word.starts_with("INSTALL_FAILED_") || word.starts_with("INSTALL_PARSE_FAILED_"))
    {
        return Err(InstallError::Rejected {
            reason: reason.to_string(),
        }
        .into());
    }
    if exit_ok && output.contains("Success") {
        return Ok(());
    }
    Err(InstallError::Failed {
        message: output.trim().to_string(),
    }
    .into())
}
