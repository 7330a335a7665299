//! GitHub releases listing

use crate::client::NetClient;
use apkm_errors::{Error, NetworkError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a GitHub releases listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<GithubAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

impl GithubRelease {
    /// Tag without a leading `v`
    #[must_use]
    pub fn version(&self) -> &str {
        self.tag_name.strip_prefix('v').unwrap_or(&self.tag_name)
    }

    #[must_use]
    pub fn asset(&self, name: &str) -> Option<&GithubAsset> {
        self.assets.iter().find(|a| a.name == name)
    }
}

/// Fetch a releases listing, newest first.
///
/// # Errors
///
/// Returns an error if the request fails or the body is not a releases array.
pub async fn fetch_releases(client: &NetClient, url: &str) -> Result<Vec<GithubRelease>, Error> {
    let response = client.get(url).await?;
    let body = response
        .text()
        .await
        .map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;

    let mut releases: Vec<GithubRelease> =
        serde_json::from_str(&body).map_err(|e| NetworkError::InvalidResponse {
            url: url.to_string(),
            message: e.to_string(),
        })?;
    releases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(releases)
}
