//! Tick-driven sentence dispatcher and clock

use crate::config::{EngineConfig, PpsEdge};
use crate::echo::EchoBuffer;
use crate::error::EngineError;
use crate::events::{EventKind, Handlers};
use crate::ingest::{ByteIngestor, PulseInput};
use crate::reader::{GpsReader, SharedState};
use nmea_protocol::{RmcFix, SentenceKind};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

/// Year, month, day, hour and minute of a clock-sync event
type MinuteStamp = (u16, u8, u8, u8, u8);

/// GPS engine owning the shared records, handlers and echo buffers.
///
/// The interrupt side talks to the engine through [`ByteIngestor`] and
/// [`PulseInput`] handles; the owner calls [`GpsEngine::on_tick`] at the
/// configured cadence (or awaits [`GpsEngine::run`]).
pub struct GpsEngine {
    config: EngineConfig,
    shared: Arc<SharedState>,
    handlers: Handlers,
    echoes: [Option<EchoBuffer>; SentenceKind::ALL.len()],
    /// Copy of the sentence being dispatched
    line: Vec<u8>,
    reported_overflows: u64,
    last_sync: Option<MinuteStamp>,
}

impl GpsEngine {
    /// Create an engine after validating `config`
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        info!(
            "Creating GPS engine: tick {} ms, {} byte lines, {:?} pulse edge",
            config.tick_interval_ms, config.line_capacity, config.pps_edge
        );

        let shared = Arc::new(SharedState::new(&config));
        Ok(Self {
            line: Vec::with_capacity(config.line_capacity),
            config,
            shared,
            handlers: Handlers::default(),
            echoes: Default::default(),
            reported_overflows: 0,
            last_sync: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Handle for the serial receive interrupt
    pub fn ingestor(&self) -> ByteIngestor {
        ByteIngestor::new(Arc::clone(&self.shared))
    }

    /// Handle for the pulse pin interrupt
    pub fn pulse_input(&self) -> PulseInput {
        PulseInput::new(Arc::clone(&self.shared))
    }

    /// Read handle for any thread
    pub fn reader(&self) -> GpsReader {
        GpsReader::new(Arc::clone(&self.shared))
    }

    /// Accept one received byte; returns `true` when it completed a line
    pub fn on_byte(&self, byte: u8) -> bool {
        self.shared.lines.push_byte(byte)
    }

    /// Accept a run of bytes; returns the number of lines completed
    pub fn feed(&self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&byte| self.on_byte(byte)).count()
    }

    /// Signal one timing pulse; ignored while no pulse source is attached
    pub fn on_pulse(&self) -> bool {
        self.shared.pulse.record()
    }

    /// Start honoring pulses on `edge`
    pub fn attach_pulse(&mut self, edge: PpsEdge) {
        self.config.pps_edge = edge;
        self.shared.pulse.attach(edge);
        info!("Pulse source attached on {:?} edge", edge);
    }

    /// Start honoring pulses on the configured edge
    pub fn attach_configured_pulse(&mut self) {
        self.attach_pulse(self.config.pps_edge);
    }

    /// Stop honoring pulses and discard any not yet applied
    pub fn detach_pulse(&mut self) {
        self.shared.pulse.detach();
        info!("Pulse source detached");
    }

    pub fn is_pulse_attached(&self) -> bool {
        self.shared.pulse.is_attached()
    }

    /// Register the handler for `kind`, replacing any previous one
    pub fn set_handler(&mut self, kind: EventKind, handler: impl FnMut() + Send + 'static) {
        if self.handlers.set(kind, Box::new(handler)) {
            debug!("Replaced {} handler", kind);
        }
    }

    /// Remove the handler for `kind`; returns whether one was registered
    pub fn clear_handler(&mut self, kind: EventKind) -> bool {
        self.handlers.clear(kind)
    }

    pub fn has_handler(&self, kind: EventKind) -> bool {
        self.handlers.is_set(kind)
    }

    /// Register the echo buffer for one sentence family, returning the
    /// previous one
    pub fn set_echo(&mut self, kind: SentenceKind, echo: EchoBuffer) -> Option<EchoBuffer> {
        self.echoes[kind.index()].replace(echo)
    }

    pub fn clear_echo(&mut self, kind: SentenceKind) -> Option<EchoBuffer> {
        self.echoes[kind.index()].take()
    }

    /// Periodic tick.
    ///
    /// Advances the clock by one cadence step, or applies the pulses seen
    /// since the last tick instead, then dispatches a completed sentence if
    /// one is waiting. Returns the family of the dispatched sentence.
    pub fn on_tick(&mut self) -> Option<SentenceKind> {
        let pulses = self.shared.pulse.take();
        let step = self.config.centiseconds_per_tick();
        self.shared.time.update(|time| {
            if pulses == 0 {
                time.advance(step);
            } else {
                for _ in 0..pulses {
                    time.pulse();
                }
            }
        });
        for _ in 0..pulses {
            trace!("Pulse applied");
            self.handlers.fire(EventKind::Pulse);
        }

        let dispatched = self.dispatch();
        self.check_clock_sync();
        self.check_overflow();
        dispatched
    }

    /// Process the completed sentence, if any, without advancing the clock
    pub fn dispatch(&mut self) -> Option<SentenceKind> {
        if !self.shared.lines.copy_completed(&mut self.line) {
            return None;
        }
        self.shared.lines.clear_pending();

        let kind = SentenceKind::classify(&self.line);
        if let Some(echo) = &self.echoes[kind.index()] {
            echo.write(&self.line);
        }

        let sentence = String::from_utf8_lossy(&self.line);
        trace!("Dispatching {} sentence {:?}", kind, sentence.trim_end());
        if !apply_sentence(&self.shared, kind, &sentence) {
            self.shared.count_dropped();
        }
        self.shared.count_dispatched(kind);
        self.handlers.fire(EventKind::for_sentence(kind));
        Some(kind)
    }

    /// Tick the clock on a tokio interval until `shutdown` turns true or
    /// its sender is dropped.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Starting GPS engine ticker every {:?}", self.config.tick_interval());
        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !*shutdown.borrow() {
            tokio::select! {
                _ = ticker.tick() => {
                    self.on_tick();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("GPS engine ticker stopped");
    }

    /// Fire the clock-sync event once for each valid whole minute
    fn check_clock_sync(&mut self) {
        let time = self.shared.time.read();
        if !time.is_valid() || !time.is_on_minute_boundary() {
            return;
        }

        let stamp = (time.year, time.month, time.day, time.hour, time.minute);
        if self.last_sync == Some(stamp) {
            return;
        }
        self.last_sync = Some(stamp);
        debug!(
            "Clock sync at {:04}-{:02}-{:02} {:02}:{:02}:00",
            time.year, time.month, time.day, time.hour, time.minute
        );
        self.handlers.fire(EventKind::ClockSync);
    }

    fn check_overflow(&mut self) {
        let wraps = self.shared.lines.stats().overflow_wraps;
        if wraps > self.reported_overflows {
            warn!(
                "Line buffer overflowed {} time(s), sentences longer than {} bytes are lost",
                wraps - self.reported_overflows,
                self.shared.lines.capacity()
            );
            self.reported_overflows = wraps;
        }
    }
}

/// Run the converter for `kind`; returns `false` if nothing could be applied
fn apply_sentence(shared: &SharedState, kind: SentenceKind, sentence: &str) -> bool {
    match kind {
        SentenceKind::Gga => match shared.position.update(|place| place.apply_gga(sentence)) {
            Ok(quality) => {
                trace!("Position updated, quality {:?}", quality);
                true
            }
            Err(e) => {
                debug!("GGA sentence left position unchanged: {}", e);
                false
            }
        },
        SentenceKind::Rmc => {
            let fix = match RmcFix::parse(sentence) {
                Ok(fix) => fix,
                Err(e) => {
                    debug!("RMC sentence dropped: {}", e);
                    return false;
                }
            };
            let pulse_attached = shared.pulse.is_attached();
            match shared.time.update(|time| time.resync(&fix, pulse_attached)) {
                Ok(()) => true,
                Err(e) => {
                    debug!("RMC sentence dropped: {}", e);
                    false
                }
            }
        }
        SentenceKind::Vtg => {
            let updated = shared.vector.update(|vector| vector.apply_vtg(sentence));
            if updated == 0 {
                debug!("VTG sentence carried no usable fields");
            }
            updated > 0
        }
        SentenceKind::Unknown => true,
    }
}
