//! Service layer for the dashboard snapshot.
//! - `snapshot` holds the document model and the per-endpoint merge rules.
//! - `storage` and `file` persist the document as a single JSON file.
//! - Handlers depend on the `SnapshotRepository` trait, not on the file store.

pub mod errors;
pub mod storage;
pub mod file;
pub mod snapshot;
