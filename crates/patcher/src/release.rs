//! Release resolution per version channel

use apkm_errors::{Error, PatchError};
use apkm_net::{fetch_releases, GithubRelease, NetClient};
use apkm_types::VersionPreference;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Asset name of the base package in a release
pub const BASE_APK_ASSET: &str = "base.apk";
/// Asset name of the mod payload in a release
pub const INJECTOR_ASSET: &str = "injector.dex";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub url: String,
}

/// The release chosen for this installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRelease {
    pub version: String,
    pub assets: Vec<ReleaseAsset>,
}

impl ResolvedRelease {
    /// Find an asset by name.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::MissingAsset`] if the release does not carry it.
    pub fn asset(&self, name: &str) -> Result<&ReleaseAsset, Error> {
        self.assets.iter().find(|a| a.name == name).ok_or_else(|| {
            PatchError::MissingAsset {
                version: self.version.clone(),
                asset: name.to_string(),
            }
            .into()
        })
    }
}

impl From<&GithubRelease> for ResolvedRelease {
    fn from(release: &GithubRelease) -> Self {
        Self {
            version: release.version().to_string(),
            assets: release
                .assets
                .iter()
                .map(|a| ReleaseAsset {
                    name: a.name.clone(),
                    url: a.browser_download_url.clone(),
                })
                .collect(),
        }
    }
}

/// Remote source of releases
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Resolve the release to install for a channel.
    ///
    /// `custom_version_code` is only consulted for [`VersionPreference::Custom`].
    async fn resolve(
        &self,
        preference: VersionPreference,
        custom_version_code: &str,
    ) -> Result<ResolvedRelease, Error>;
}

/// Reads a GitHub releases listing
pub struct GithubReleaseSource {
    client: NetClient,
    url: String,
}

impl GithubReleaseSource {
    #[must_use]
    pub fn new(client: NetClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ReleaseSource for GithubReleaseSource {
    async fn resolve(
        &self,
        preference: VersionPreference,
        custom_version_code: &str,
    ) -> Result<ResolvedRelease, Error> {
        let releases = fetch_releases(&self.client, &self.url).await?;
        select_release(&releases, preference, custom_version_code).map(ResolvedRelease::from)
    }
}

/// Pick a release from a listing sorted newest first.
///
/// - Stable: newest non-prerelease
/// - Beta: newest whose tag does not mention `alpha`
/// - Alpha: newest
/// - Custom: tag (without leading `v`) equal to the version code
///
/// # Errors
///
/// Returns [`PatchError::ReleaseNotFound`] when nothing matches.
pub fn select_release<'a>(
    releases: &'a [GithubRelease],
    preference: VersionPreference,
    custom_version_code: &str,
) -> Result<&'a GithubRelease, Error> {
    let code = custom_version_code.trim();
    let found = match preference {
        VersionPreference::Stable => releases.iter().find(|r| !r.prerelease),
        VersionPreference::Beta => releases
            .iter()
            .find(|r| !r.tag_name.to_ascii_lowercase().contains("alpha")),
        VersionPreference::Alpha => releases.first(),
        VersionPreference::Custom => releases.iter().find(|r| r.version() == code),
    };

    found.ok_or_else(|| {
        let preference = match preference {
            VersionPreference::Custom => format!("custom version {code}"),
            other => format!("the {other} channel"),
        };
        PatchError::ReleaseNotFound { preference }.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn release(tag: &str, day: u32, prerelease: bool) -> GithubRelease {
        GithubRelease {
            tag_name: tag.to_string(),
            name: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap(),
            prerelease,
            assets: Vec::new(),
        }
    }

    fn listing() -> Vec<GithubRelease> {
        vec![
            release("v230-alpha", 4, true),
            release("v229-beta", 3, true),
            release("v228", 2, false),
            release("v227", 1, false),
        ]
    }

    #[test]
    fn test_channel_selection() {
        let releases = listing();
        let pick = |pref, code| {
            select_release(&releases, pref, code)
                .unwrap()
                .tag_name
                .clone()
        };

        assert_eq!(pick(VersionPreference::Stable, ""), "v228");
        assert_eq!(pick(VersionPreference::Beta, ""), "v229-beta");
        assert_eq!(pick(VersionPreference::Alpha, ""), "v230-alpha");
        assert_eq!(pick(VersionPreference::Custom, "227"), "v227");
    }

    #[test]
    fn test_unknown_custom_version() {
        let err = select_release(&listing(), VersionPreference::Custom, "1").unwrap_err();
        assert!(matches!(err, Error::Patch(PatchError::ReleaseNotFound { .. })));
    }

    #[test]
    fn test_missing_asset() {
        let resolved = ResolvedRelease {
            version: "228".to_string(),
            assets: vec![ReleaseAsset {
                name: BASE_APK_ASSET.to_string(),
                url: "https://example.invalid/base.apk".to_string(),
            }],
        };
        assert!(resolved.asset(BASE_APK_ASSET).is_ok());
        assert!(matches!(
            resolved.asset(INJECTOR_ASSET),
            Err(Error::Patch(PatchError::MissingAsset { .. }))
        ));
    }
}
