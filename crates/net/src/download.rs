//! Streaming download into a target file

use crate::client::{DownloadProgress, NetClient};
use apkm_errors::{Error, NetworkError};
use apkm_events::{AppEvent, DownloadEvent, EventEmitter, EventSender, FailureContext};
use futures::StreamExt;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(50);

/// Stream `url` into `dest`, creating parent directories as needed.
///
/// A failed transfer removes the partially written file. Out-of-space write
/// failures surface as `StorageError::InsufficientStorage`. Dropping the
/// returned future leaves the partial file in place for the caller to clean.
///
/// # Errors
///
/// Returns an error if the request fails, the response stream breaks, or the
/// file cannot be written.
pub async fn download_file<F>(
    client: &NetClient,
    url: &str,
    dest: &Path,
    tx: Option<&EventSender>,
    progress_callback: F,
) -> Result<u64, Error>
where
    F: Fn(DownloadProgress),
{
    let result = stream_to_file(client, url, dest, tx, progress_callback).await;

    match &result {
        Ok(bytes) => tx.emit(AppEvent::Download(DownloadEvent::Completed {
            url: url.to_string(),
            bytes_downloaded: *bytes,
        })),
        Err(e) => {
            let _ = fs::remove_file(dest).await;
            tx.emit(AppEvent::Download(DownloadEvent::Failed {
                url: url.to_string(),
                failure: FailureContext::from_error(e),
            }));
        }
    }

    result
}

async fn stream_to_file<F>(
    client: &NetClient,
    url: &str,
    dest: &Path,
    tx: Option<&EventSender>,
    progress_callback: F,
) -> Result<u64, Error>
where
    F: Fn(DownloadProgress),
{
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io_with_path(&e, parent))?;
    }

    let response = client.get(url).await?;
    let total = response.content_length();
    tx.emit(AppEvent::Download(DownloadEvent::Started {
        url: url.to_string(),
        total_bytes: total,
    }));

    let mut file = File::create(dest)
        .await
        .map_err(|e| Error::io_with_path(&e, dest))?;
    let mut stream = response.bytes_stream();
    let mut downloaded = 0u64;
    let mut last_update = Instant::now();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::io_with_path(&e, dest))?;

        downloaded += chunk.len() as u64;
        progress_callback(DownloadProgress { downloaded, total });

        if last_update.elapsed() >= PROGRESS_INTERVAL {
            tx.emit_download_progress(url, downloaded, total);
            last_update = Instant::now();
        }
    }

    file.flush()
        .await
        .map_err(|e| Error::io_with_path(&e, dest))?;

    if let Some(expected) = total {
        if expected != downloaded {
            return Err(NetworkError::DownloadFailed(format!(
                "expected {expected} bytes from {url}, received {downloaded}"
            ))
            .into());
        }
    }

    Ok(downloaded)
}
