//! Integration tests for installation records

#[cfg(test)]
mod tests {
    use apkm_errors::{Error, InstallError, NetworkError, StorageError};
    use apkm_state::*;
    use apkm_types::{IconReplacement, PatchOptions, Uuid};
    use chrono::{Duration as ChronoDuration, Utc};
    use std::time::Duration;
    use tempfile::TempDir;

    fn record(error: Option<RecordedError>) -> InstallRecord {
        InstallRecord::new(
            Uuid::new_v4(),
            Utc::now(),
            Duration::from_millis(1234),
            PatchOptions {
                icon_replacement: IconReplacement::CustomImage {
                    image_bytes: vec![1, 2, 3],
                },
                ..PatchOptions::default()
            },
            "- [Prepare] Fetch release info: Success in 3ms\n",
            error,
        )
    }

    #[tokio::test]
    async fn test_json_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = JsonInstallLogStore::new(dir.path().join("logs"));

        let failed = record(Some(RecordedError::from_error(&Error::from(
            StorageError::InsufficientStorage {
                path: "device".to_string(),
            },
        ))));
        store.store_install_data(failed.clone()).await.unwrap();

        assert!(dir
            .path()
            .join("logs")
            .join(format!("{}.json", failed.id))
            .exists());

        let loaded = store.get(failed.id).await.unwrap().unwrap();
        assert_eq!(loaded, failed);
        assert_eq!(loaded.duration(), Duration::from_millis(1234));
        let error = loaded.error.unwrap();
        assert!(error.insufficient_storage);
        assert!(!error.aborted);
        assert_eq!(error.code.as_deref(), Some("storage.insufficient_storage"));
    }

    #[tokio::test]
    async fn test_json_store_list_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = JsonInstallLogStore::new(dir.path());

        let mut older = record(None);
        older.started_at = Utc::now() - ChronoDuration::hours(1);
        let newer = record(None);
        store.store_install_data(older.clone()).await.unwrap();
        store.store_install_data(newer.clone()).await.unwrap();
        tokio::fs::write(dir.path().join("broken.json"), b"{").await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), b"keep").await.unwrap();

        let ids: Vec<_> = store.list().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);

        store.delete_all().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_json_store_missing_dir() {
        let dir = TempDir::new().unwrap();
        let store = JsonInstallLogStore::new(dir.path().join("absent"));
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
        store.delete_all().await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryInstallLogStore::new();
        assert!(store.is_empty().await);

        let rec = record(Some(RecordedError::aborted(
            "Installation was aborted or cancelled",
        )));
        store.store_install_data(rec.clone()).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(rec.id).await.unwrap(), Some(rec));

        store.delete_all().await.unwrap();
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_recorded_error_flags() {
        let cancelled = RecordedError::from_error(&Error::from(InstallError::Cancelled));
        assert!(cancelled.aborted);
        assert!(!cancelled.insufficient_storage);

        let network =
            RecordedError::from_error(&Error::from(NetworkError::DownloadFailed("reset".into())));
        assert!(!network.aborted);
        assert!(network.message.contains("reset"));

        let env = MemoryInstallLogStore::new().environment_info();
        assert_eq!(env.os, std::env::consts::OS);
    }
}
