//! Double-Read Snapshot Cell Implementation

use crate::error::SnapshotError;
use std::marker::PhantomData;
use std::sync::atomic::{fence, AtomicU64, Ordering};
use tracing::warn;

/// Largest record, in 64-bit words, a cell can hold
pub const MAX_WORDS: usize = 8;

/// Default bound on read attempts before a read is reported as starved
pub const DEFAULT_MAX_RETRIES: u32 = 64;

/// A plain-data record that can be stored in a [`SnapshotCell`].
///
/// The record is flattened into a fixed number of 64-bit words. Two packed
/// copies compare equal exactly when the records are bit-identical.
pub trait Snapshot: Copy {
    /// Number of words the packed record occupies (at most [`MAX_WORDS`])
    const WORDS: usize;

    /// Write the record into `words` (`words.len() == Self::WORDS`)
    fn pack(&self, words: &mut [u64]);

    /// Rebuild a record from `words` (`words.len() == Self::WORDS`)
    fn unpack(words: &[u64]) -> Self;
}

/// Shared record written by a single context and read from any other.
///
/// Writers never wait. Readers copy the record twice, together with a write
/// sequence number, and retry until both copies agree and no write was in
/// flight. Retries are bounded by `max_retries`; a read that runs out of
/// attempts is counted as starved.
///
/// The bound holds only while writers finish their handful of word stores
/// promptly. A writer stalled mid-update (for example preempted for longer
/// than a reader's whole retry budget) starves readers instead of blocking
/// them.
pub struct SnapshotCell<T: Snapshot> {
    /// Packed record
    words: Box<[AtomicU64]>,
    /// Write sequence, odd while a write is in progress
    sequence: AtomicU64,
    /// Reads that exhausted their retry budget
    starved: AtomicU64,
    /// Maximum read attempts
    max_retries: u32,
    _record: PhantomData<fn() -> T>,
}

impl<T: Snapshot> SnapshotCell<T> {
    /// Create a cell holding `initial`
    pub fn new(initial: T, max_retries: u32) -> Self {
        assert!(
            T::WORDS > 0 && T::WORDS <= MAX_WORDS,
            "Snapshot records must pack into 1..={} words",
            MAX_WORDS
        );

        let mut packed = [0u64; MAX_WORDS];
        initial.pack(&mut packed[..T::WORDS]);
        let words: Vec<AtomicU64> = packed[..T::WORDS].iter().map(|w| AtomicU64::new(*w)).collect();

        Self {
            words: words.into_boxed_slice(),
            sequence: AtomicU64::new(0),
            starved: AtomicU64::new(0),
            max_retries: max_retries.max(1),
            _record: PhantomData,
        }
    }

    /// Create a cell with the default retry bound
    pub fn with_default_retries(initial: T) -> Self {
        Self::new(initial, DEFAULT_MAX_RETRIES)
    }

    /// Replace the whole record.
    ///
    /// Only one context may write a given cell at a time.
    pub fn store(&self, value: T) {
        let seq = self.begin_write();
        self.publish(seq, value);
    }

    /// Modify the record in place and publish the result.
    ///
    /// The write is in flight for the whole closure, so readers retry until
    /// it returns. The writer reads its own record without retrying: no
    /// other context writes this cell concurrently.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let seq = self.begin_write();
        let mut packed = [0u64; MAX_WORDS];
        for (out, word) in packed.iter_mut().zip(self.words.iter()) {
            *out = word.load(Ordering::Relaxed);
        }
        let mut value = T::unpack(&packed[..T::WORDS]);
        let result = f(&mut value);
        self.publish(seq, value);
        result
    }

    /// Mark a write in flight; returns the even sequence it started from
    fn begin_write(&self) -> u64 {
        let seq = self.sequence.load(Ordering::Relaxed);
        self.sequence.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);
        seq
    }

    /// Store the packed record and close the write opened at `seq`
    fn publish(&self, seq: u64, value: T) {
        let mut packed = [0u64; MAX_WORDS];
        value.pack(&mut packed[..T::WORDS]);
        for (slot, word) in self.words.iter().zip(packed.iter()) {
            slot.store(*word, Ordering::Relaxed);
        }
        self.sequence.store(seq.wrapping_add(2), Ordering::Release);
    }

    /// Read a torn-free copy, or report starvation
    pub fn try_read(&self) -> Result<T, SnapshotError> {
        for _ in 0..self.max_retries {
            if let Some(value) = self.attempt() {
                return Ok(value);
            }
            std::hint::spin_loop();
        }

        self.starved.fetch_add(1, Ordering::Relaxed);
        Err(SnapshotError::Starved {
            attempts: self.max_retries,
        })
    }

    /// Read a torn-free copy, waiting as long as the writer needs.
    ///
    /// This is the unbounded form of [`SnapshotCell::try_read`]: a read that
    /// exhausts its retries is counted and logged, then keeps yielding the
    /// thread until the writer lets a consistent copy through. Callers that
    /// must not wait on a stalled writer use `try_read` instead.
    pub fn read(&self) -> T {
        match self.try_read() {
            Ok(value) => value,
            Err(err) => {
                warn!("{}, yielding to the writer", err);
                loop {
                    std::thread::yield_now();
                    if let Some(value) = self.attempt() {
                        return value;
                    }
                }
            }
        }
    }

    /// One double copy; `Some` only if both copies agree and no write was
    /// in flight
    fn attempt(&self) -> Option<T> {
        let mut first = [0u64; MAX_WORDS];
        let mut second = [0u64; MAX_WORDS];
        let n = T::WORDS;

        let seq_first = self.copy_into(&mut first[..n]);
        let seq_second = self.copy_into(&mut second[..n]);
        (seq_first == seq_second && seq_first % 2 == 0 && first[..n] == second[..n])
            .then(|| T::unpack(&first[..n]))
    }

    /// Number of reads that ran out of attempts
    pub fn starved_reads(&self) -> u64 {
        self.starved.load(Ordering::Relaxed)
    }

    /// Maximum attempts per read
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Copy the packed words into `out`, returning the sequence seen first
    fn copy_into(&self, out: &mut [u64]) -> u64 {
        let seq = self.sequence.load(Ordering::Acquire);
        for (slot, word) in out.iter_mut().zip(self.words.iter()) {
            *slot = word.load(Ordering::Relaxed);
        }
        fence(Ordering::Acquire);
        seq
    }
}

impl<T: Snapshot + Default> Default for SnapshotCell<T> {
    fn default() -> Self {
        Self::with_default_retries(T::default())
    }
}

impl<T: Snapshot + std::fmt::Debug> std::fmt::Debug for SnapshotCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCell")
            .field("value", &self.try_read())
            .field("starved", &self.starved_reads())
            .finish()
    }
}
