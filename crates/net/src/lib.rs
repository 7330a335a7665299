#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for apkm
//!
//! This crate handles all HTTP operations: release listing, streaming
//! downloads of the base package and mod payload, and connection pooling with
//! retry logic.

mod client;
mod download;
mod release;

pub use client::{DownloadProgress, NetClient, NetConfig};
pub use download::download_file;
pub use release::{fetch_releases, GithubAsset, GithubRelease};

use apkm_errors::{Error, NetworkError};
use url::Url;

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed or invalid according to RFC 3986.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()).into())
}
