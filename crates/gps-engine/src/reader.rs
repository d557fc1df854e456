//! Shared engine state and the read-side handle

use crate::config::{EngineConfig, PpsEdge};
use gps_time::GpsTime;
use line_buffer::LineBuffers;
use nmea_protocol::{FixQuality, Geodetic, SentenceKind, VectorTrack};
use serde::{Deserialize, Serialize};
use snapshot::{SnapshotCell, SnapshotError};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Pulse source state shared between the pulse input and the tick
pub(crate) struct PulseState {
    attached: AtomicBool,
    edge: AtomicU8,
    pending: AtomicU32,
    applied: AtomicU64,
}

impl PulseState {
    fn new(edge: PpsEdge) -> Self {
        Self {
            attached: AtomicBool::new(false),
            edge: AtomicU8::new(edge_code(edge)),
            pending: AtomicU32::new(0),
            applied: AtomicU64::new(0),
        }
    }

    pub fn attach(&self, edge: PpsEdge) {
        self.edge.store(edge_code(edge), Ordering::Relaxed);
        self.attached.store(true, Ordering::Release);
    }

    pub fn detach(&self) {
        self.attached.store(false, Ordering::Release);
        self.pending.store(0, Ordering::Relaxed);
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    pub fn edge(&self) -> PpsEdge {
        match self.edge.load(Ordering::Relaxed) {
            0 => PpsEdge::Rising,
            _ => PpsEdge::Falling,
        }
    }

    /// Record one pulse; ignored while detached
    pub fn record(&self) -> bool {
        if !self.is_attached() {
            return false;
        }
        self.pending.fetch_add(1, Ordering::AcqRel);
        true
    }

    /// Take every pulse recorded since the last call.
    ///
    /// A pulse that raced a detach is discarded here rather than applied.
    pub fn take(&self) -> u32 {
        let pulses = self.pending.swap(0, Ordering::AcqRel);
        if !self.is_attached() {
            return 0;
        }
        self.applied.fetch_add(u64::from(pulses), Ordering::Relaxed);
        pulses
    }
}

fn edge_code(edge: PpsEdge) -> u8 {
    match edge {
        PpsEdge::Rising => 0,
        PpsEdge::Falling => 1,
    }
}

/// Everything shared between the interrupt side, the tick and readers
pub(crate) struct SharedState {
    pub lines: LineBuffers,
    pub pulse: PulseState,
    pub position: SnapshotCell<Geodetic>,
    pub vector: SnapshotCell<VectorTrack>,
    pub time: SnapshotCell<GpsTime>,
    dispatched: [AtomicU64; SentenceKind::ALL.len()],
    dropped: AtomicU64,
}

impl SharedState {
    pub fn new(config: &EngineConfig) -> Self {
        let retries = config.max_snapshot_retries;
        Self {
            lines: LineBuffers::new(config.line_capacity),
            pulse: PulseState::new(config.pps_edge),
            position: SnapshotCell::new(Geodetic::default(), retries),
            vector: SnapshotCell::new(VectorTrack::default(), retries),
            time: SnapshotCell::new(GpsTime::default(), retries),
            dispatched: Default::default(),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn count_dispatched(&self, kind: SentenceKind) {
        self.dispatched[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn dispatched(&self, kind: SentenceKind) -> u64 {
        self.dispatched[kind.index()].load(Ordering::Relaxed)
    }
}

/// Engine counters at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Bytes accepted by the ingestor
    pub bytes_received: u64,
    /// Lines completed by a terminator
    pub lines_completed: u64,
    /// Times a line overran its buffer and wrapped
    pub overflow_wraps: u64,
    pub fix_sentences: u64,
    pub time_sentences: u64,
    pub vector_sentences: u64,
    pub unknown_sentences: u64,
    /// Sentences whose fields could not be applied
    pub dropped_sentences: u64,
    /// Pulses applied to the clock
    pub pulses_applied: u64,
    /// Snapshot reads that exhausted their retries
    pub starved_reads: u64,
}

/// Cloneable, thread-safe read handle.
///
/// Every accessor returns a torn-free copy of the current record. The plain
/// accessors wait for the tick to finish a write however long it takes; the
/// `try_` forms give up after `max_snapshot_retries` attempts with
/// [`SnapshotError::Starved`].
#[derive(Clone)]
pub struct GpsReader {
    shared: Arc<SharedState>,
}

impl GpsReader {
    pub(crate) fn new(shared: Arc<SharedState>) -> Self {
        Self { shared }
    }

    /// Position record
    pub fn position(&self) -> Geodetic {
        self.shared.position.read()
    }

    /// Position record, bounded by the configured retries
    pub fn try_position(&self) -> Result<Geodetic, SnapshotError> {
        self.shared.position.try_read()
    }

    /// Latitude in degrees, north positive
    pub fn latitude(&self) -> f64 {
        self.position().latitude
    }

    /// Longitude in degrees, east positive
    pub fn longitude(&self) -> f64 {
        self.position().longitude
    }

    /// Altitude in kilometres
    pub fn altitude(&self) -> f64 {
        self.position().altitude_km
    }

    pub fn satellites(&self) -> u32 {
        self.position().satellites
    }

    pub fn gps_quality(&self) -> FixQuality {
        self.position().fix_quality()
    }

    /// Velocity and track record
    pub fn vector(&self) -> VectorTrack {
        self.shared.vector.read()
    }

    pub fn try_vector(&self) -> Result<VectorTrack, SnapshotError> {
        self.shared.vector.try_read()
    }

    /// Time record
    pub fn time(&self) -> GpsTime {
        self.shared.time.read()
    }

    pub fn try_time(&self) -> Result<GpsTime, SnapshotError> {
        self.shared.time.try_read()
    }

    pub fn is_time_valid(&self) -> bool {
        self.time().is_valid()
    }

    pub fn julian_day_number(&self) -> i64 {
        self.time().julian_day_number()
    }

    pub fn julian_date(&self) -> f64 {
        self.time().julian_date()
    }

    /// Local sidereal time in degrees at the last fixed longitude
    pub fn sidereal_degrees(&self) -> f64 {
        self.time().sidereal_degrees(self.longitude())
    }

    /// Local sidereal hour angle at the last fixed longitude
    pub fn sidereal_hour_angle(&self) -> f64 {
        self.time().sidereal_hour_angle(self.longitude())
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let shared = &self.shared;
        let lines = shared.lines.stats();
        Diagnostics {
            bytes_received: lines.bytes_written,
            lines_completed: lines.lines_completed,
            overflow_wraps: lines.overflow_wraps,
            fix_sentences: shared.dispatched(SentenceKind::Gga),
            time_sentences: shared.dispatched(SentenceKind::Rmc),
            vector_sentences: shared.dispatched(SentenceKind::Vtg),
            unknown_sentences: shared.dispatched(SentenceKind::Unknown),
            dropped_sentences: shared.dropped.load(Ordering::Relaxed),
            pulses_applied: shared.pulse.applied.load(Ordering::Relaxed),
            starved_reads: shared.position.starved_reads()
                + shared.vector.starved_reads()
                + shared.time.starved_reads(),
        }
    }
}
