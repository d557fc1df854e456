//! Snapshot Error Types

use thiserror::Error;

/// Errors returned by snapshot reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// Every attempt overlapped a write in progress
    #[error("snapshot read starved after {attempts} attempts")]
    Starved { attempts: u32 },
}
