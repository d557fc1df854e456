//! Snapshot Cells
//!
//! Shares small plain-data records between an interrupt-style writer and any
//! number of readers without a lock. Readers copy the record twice and only
//! accept the copy when both agree, so a half-written record is never
//! returned.

mod cell;
mod error;

pub use cell::{Snapshot, SnapshotCell, DEFAULT_MAX_RETRIES, MAX_WORDS};
pub use error::SnapshotError;

/// Pack eight bytes into one storage word.
pub fn pack_bytes(bytes: [u8; 8]) -> u64 {
    u64::from_le_bytes(bytes)
}

/// Split one storage word back into its eight bytes.
pub fn unpack_bytes(word: u64) -> [u8; 8] {
    word.to_le_bytes()
}
