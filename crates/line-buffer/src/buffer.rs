//! Lock-Free Double Line Buffer Implementation

use crate::{LineStats, EMPTY_FIELD_FILL, SEPARATOR, TERMINATOR};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};

/// Default line capacity in bytes (an NMEA sentence is at most 82 characters)
pub const DEFAULT_CAPACITY: usize = 128;

/// Smallest usable line capacity
pub const MIN_CAPACITY: usize = 16;

/// Two fixed-capacity line buffers with an atomic active selector.
///
/// The producer (`push_byte`) writes only into the active buffer. When a
/// terminator arrives it flips the selector and raises the pending flag, so
/// the consumer (`copy_completed`) reads the other, completed buffer. Neither
/// side blocks or allocates after construction.
pub struct LineBuffers {
    /// Pre-allocated storage, one slice per buffer
    buffers: [Box<[AtomicU8]>; 2],
    /// Capacity of each buffer
    capacity: usize,
    /// Index of the buffer the producer writes into
    active: AtomicUsize,
    /// Producer write position within the active buffer
    cursor: AtomicUsize,
    /// Previous byte seen by the producer
    last_byte: AtomicU8,
    /// Set when a completed line waits for the consumer
    pending: AtomicBool,
    /// Statistics
    bytes_written: AtomicU64,
    lines_completed: AtomicU64,
    overflow_wraps: AtomicU64,
}

impl LineBuffers {
    /// Create a buffer pair with the given per-line capacity
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity >= MIN_CAPACITY,
            "Line capacity must be at least {} bytes",
            MIN_CAPACITY
        );
        Self {
            buffers: [Self::allocate(capacity), Self::allocate(capacity)],
            capacity,
            active: AtomicUsize::new(0),
            cursor: AtomicUsize::new(0),
            last_byte: AtomicU8::new(0),
            pending: AtomicBool::new(false),
            bytes_written: AtomicU64::new(0),
            lines_completed: AtomicU64::new(0),
            overflow_wraps: AtomicU64::new(0),
        }
    }

    /// Create a buffer pair with default capacity (128 bytes)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    fn allocate(capacity: usize) -> Box<[AtomicU8]> {
        let storage: Vec<AtomicU8> = (0..capacity).map(|_| AtomicU8::new(0)).collect();
        storage.into_boxed_slice()
    }

    /// Accept one received byte. Returns `true` when it completed a line.
    ///
    /// Called from the interrupt context only; must not be reentered.
    pub fn push_byte(&self, byte: u8) -> bool {
        // Two adjacent separators would hide an empty field from the tokenizer
        if byte == SEPARATOR && self.last_byte.load(Ordering::Relaxed) == SEPARATOR {
            self.put(EMPTY_FIELD_FILL);
        }

        self.put(byte);
        self.last_byte.store(byte, Ordering::Relaxed);

        if byte == TERMINATOR {
            let active = self.active.load(Ordering::Relaxed);
            self.active.store(active ^ 1, Ordering::Release);
            self.cursor.store(0, Ordering::Relaxed);
            self.lines_completed.fetch_add(1, Ordering::Relaxed);
            self.pending.store(true, Ordering::Release);
            return true;
        }
        false
    }

    /// Write a byte at the cursor, wrapping to the start on overflow
    fn put(&self, byte: u8) {
        let active = self.active.load(Ordering::Relaxed);
        let cursor = self.cursor.load(Ordering::Relaxed);

        self.buffers[active][cursor].store(byte, Ordering::Relaxed);
        self.bytes_written.fetch_add(1, Ordering::Relaxed);

        let next = cursor + 1;
        if next >= self.capacity {
            self.overflow_wraps.fetch_add(1, Ordering::Relaxed);
            self.cursor.store(0, Ordering::Relaxed);
        } else {
            self.cursor.store(next, Ordering::Relaxed);
        }
    }

    /// Whether a completed line waits for the consumer
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Copy the completed line (up to and including its terminator) into `out`.
    ///
    /// Returns `false`, leaving `out` untouched, when nothing is pending. The
    /// pending flag stays raised until [`LineBuffers::clear_pending`].
    pub fn copy_completed(&self, out: &mut Vec<u8>) -> bool {
        if !self.pending.load(Ordering::Acquire) {
            return false;
        }

        let inactive = self.active.load(Ordering::Acquire) ^ 1;
        out.clear();
        for slot in self.buffers[inactive].iter() {
            let byte = slot.load(Ordering::Relaxed);
            out.push(byte);
            if byte == TERMINATOR {
                break;
            }
        }
        true
    }

    /// Mark the completed line as consumed
    pub fn clear_pending(&self) {
        self.pending.store(false, Ordering::Release);
    }

    /// Index of the buffer currently being written
    pub fn active_index(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Get the per-line capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get producer statistics
    pub fn stats(&self) -> LineStats {
        LineStats {
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            lines_completed: self.lines_completed.load(Ordering::Relaxed),
            overflow_wraps: self.overflow_wraps.load(Ordering::Relaxed),
        }
    }
}

impl Default for LineBuffers {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl std::fmt::Debug for LineBuffers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineBuffers")
            .field("capacity", &self.capacity)
            .field("active", &self.active_index())
            .field("pending", &self.is_pending())
            .field("stats", &self.stats())
            .finish()
    }
}
