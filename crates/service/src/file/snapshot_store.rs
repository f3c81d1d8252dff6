use std::{path::PathBuf, sync::Arc};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::errors::ServiceError;
use crate::snapshot::{Snapshot, SnapshotChange, SnapshotRepository};
use crate::storage::json_document;

/// File-backed snapshot store.
/// Keeps the dashboard snapshot as one pretty-printed JSON document and
/// re-reads it on every access so external edits are picked up.
///
/// Every load-modify-save runs under `write_lock`, so updates from concurrent
/// requests in this process are applied one after another instead of racing.
pub struct FileSnapshotStore {
    file_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSnapshotStore {
    /// Initialize the store from a path. Writes the default snapshot if the file is missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = Self { file_path: path.into(), write_lock: Mutex::new(()) };
        if !json_document::exists(&store.file_path).await {
            store.save(&mut Snapshot::default()).await?;
            info!(path = %store.file_path.display(), "initialized snapshot file with defaults");
        }
        Ok(Arc::new(store))
    }

    /// Read the snapshot. Missing or unreadable data falls back to defaults.
    pub async fn load(&self) -> Snapshot {
        match json_document::read::<Snapshot>(&self.file_path).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => Snapshot::default(),
            Err(e) => {
                error!(path = %self.file_path.display(), error = %e, "failed to load snapshot; using defaults");
                Snapshot::default()
            }
        }
    }

    /// Stamp `last_updated` and persist.
    pub async fn save(&self, snapshot: &mut Snapshot) -> Result<(), ServiceError> {
        let _guard = self.write_lock.lock().await;
        self.persist(snapshot).await
    }

    /// Load, apply `change`, persist; all under the write lock.
    pub async fn apply(&self, change: SnapshotChange) -> Result<Snapshot, ServiceError> {
        let kind = change.kind();
        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.load().await;
        change.apply(&mut snapshot);
        self.persist(&mut snapshot).await?;
        debug!(change = kind, "snapshot updated");
        Ok(snapshot)
    }

    async fn persist(&self, snapshot: &mut Snapshot) -> Result<(), ServiceError> {
        snapshot.stamp(Utc::now());
        json_document::write_atomic(&self.file_path, snapshot).await
    }
}

#[async_trait::async_trait]
impl SnapshotRepository for FileSnapshotStore {
    async fn load(&self) -> Snapshot {
        self.load().await
    }

    async fn apply(&self, change: SnapshotChange) -> Result<Snapshot, ServiceError> {
        self.apply(change).await
    }
}
