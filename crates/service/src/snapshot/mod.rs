//! Dashboard snapshot: document model, merge rules and the repository seam.

pub mod change;
pub mod domain;
pub mod repository;

pub use change::SnapshotChange;
pub use domain::{Snapshot, MAX_REPORTS, MAX_SIGNALS};
pub use repository::SnapshotRepository;
