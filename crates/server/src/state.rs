use std::sync::Arc;

use service::snapshot::SnapshotRepository;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub snapshots: Arc<dyn SnapshotRepository>,
}

impl AppState {
    pub fn new(snapshots: Arc<dyn SnapshotRepository>) -> Self {
        Self { snapshots }
    }
}
