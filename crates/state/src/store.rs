//! Installation record stores

use crate::models::{EnvironmentInfo, InstallRecord};
use apkm_errors::Error;
use apkm_types::InstallId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

/// Diagnostic log store for installation records
#[async_trait]
pub trait InstallLogStore: Send + Sync {
    /// Persist a record. Each install id is stored once.
    async fn store_install_data(&self, record: InstallRecord) -> Result<(), Error>;

    async fn get(&self, id: InstallId) -> Result<Option<InstallRecord>, Error>;

    /// All records, newest first
    async fn list(&self) -> Result<Vec<InstallRecord>, Error>;

    async fn delete_all(&self) -> Result<(), Error>;

    fn environment_info(&self) -> EnvironmentInfo {
        EnvironmentInfo::current()
    }
}

/// One JSON file per install id under a logs directory
#[derive(Debug, Clone)]
pub struct JsonInstallLogStore {
    dir: PathBuf,
}

impl JsonInstallLogStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: InstallId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn record_files(&self) -> Result<Vec<PathBuf>, Error> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io_with_path(&e, &self.dir)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::io_with_path(&e, &self.dir))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl InstallLogStore for JsonInstallLogStore {
    async fn store_install_data(&self, record: InstallRecord) -> Result<(), Error> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::io_with_path(&e, &self.dir))?;

        let path = self.record_path(record.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(&record)?;
        fs::write(&tmp, json)
            .await
            .map_err(|e| Error::io_with_path(&e, &tmp))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| Error::io_with_path(&e, &path))
    }

    async fn get(&self, id: InstallId) -> Result<Option<InstallRecord>, Error> {
        let path = self.record_path(id);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io_with_path(&e, &path)),
        }
    }

    async fn list(&self) -> Result<Vec<InstallRecord>, Error> {
        let mut records = Vec::new();
        for path in self.record_files().await? {
            let bytes = fs::read(&path)
                .await
                .map_err(|e| Error::io_with_path(&e, &path))?;
            // Unreadable records are left on disk for manual inspection
            if let Ok(record) = serde_json::from_slice::<InstallRecord>(&bytes) {
                records.push(record);
            }
        }
        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(records)
    }

    async fn delete_all(&self) -> Result<(), Error> {
        for path in self.record_files().await? {
            fs::remove_file(&path)
                .await
                .map_err(|e| Error::io_with_path(&e, &path))?;
        }
        Ok(())
    }
}

/// In-memory store for tests and headless runs
#[derive(Debug, Default)]
pub struct MemoryInstallLogStore {
    records: RwLock<HashMap<InstallId, InstallRecord>>,
}

impl MemoryInstallLogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl InstallLogStore for MemoryInstallLogStore {
    async fn store_install_data(&self, record: InstallRecord) -> Result<(), Error> {
        self.records.write().await.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: InstallId) -> Result<Option<InstallRecord>, Error> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<InstallRecord>, Error> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(records)
    }

    async fn delete_all(&self) -> Result<(), Error> {
        self.records.write().await.clear();
        Ok(())
    }
}
