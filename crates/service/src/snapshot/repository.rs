use async_trait::async_trait;

use super::{change::SnapshotChange, domain::Snapshot};
use crate::errors::ServiceError;

/// Access to the single dashboard snapshot.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Current snapshot; defaults when nothing usable is persisted.
    async fn load(&self) -> Snapshot;

    /// Load, apply `change`, save. Returns the snapshot as written.
    async fn apply(&self, change: SnapshotChange) -> Result<Snapshot, ServiceError>;
}
