//! Lock-Free Line Buffer
//!
//! Provides a double line buffer for handing complete NMEA sentences from an
//! interrupt-driven byte producer to a periodic consumer. It behaves as an
//! SPSC ring of depth two: the producer fills one buffer while the consumer
//! reads the other.

mod buffer;

pub use buffer::{LineBuffers, DEFAULT_CAPACITY, MIN_CAPACITY};

use serde::{Deserialize, Serialize};

/// Field separator within a sentence
pub const SEPARATOR: u8 = b',';

/// Line terminator that completes a sentence
pub const TERMINATOR: u8 = b'\n';

/// Character inserted between two adjacent separators
pub const EMPTY_FIELD_FILL: u8 = b'0';

/// Counters kept by the producer side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStats {
    /// Bytes accepted, including inserted fill characters
    pub bytes_written: u64,
    /// Lines completed by a terminator
    pub lines_completed: u64,
    /// Times the write cursor wrapped because a line outgrew the buffer
    pub overflow_wraps: u64,
}
