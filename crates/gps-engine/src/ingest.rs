//! Interrupt-side handles
//!
//! Both handles are cheap to clone and never block, allocate or lock, so
//! they can be called from a UART receive interrupt and a pulse pin
//! interrupt respectively.

use crate::config::PpsEdge;
use crate::reader::SharedState;
use std::sync::Arc;

/// Byte sink for the receiver's serial stream
#[derive(Clone)]
pub struct ByteIngestor {
    shared: Arc<SharedState>,
}

impl ByteIngestor {
    pub(crate) fn new(shared: Arc<SharedState>) -> Self {
        Self { shared }
    }

    /// Accept one received byte.
    ///
    /// Returns `true` when the byte completed a line.
    pub fn on_byte(&self, byte: u8) -> bool {
        self.shared.lines.push_byte(byte)
    }

    /// Accept a run of bytes; returns the number of lines completed
    pub fn feed(&self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&byte| self.on_byte(byte)).count()
    }
}

/// Sink for the receiver's one-second timing pulse.
///
/// Pulses are only counted here; the clock applies them on the next tick.
#[derive(Clone)]
pub struct PulseInput {
    shared: Arc<SharedState>,
}

impl PulseInput {
    pub(crate) fn new(shared: Arc<SharedState>) -> Self {
        Self { shared }
    }

    /// Signal one pulse. Ignored while no pulse source is attached.
    pub fn on_pulse(&self) -> bool {
        self.shared.pulse.record()
    }

    /// Signal a pin transition; only the configured edge counts as a pulse
    pub fn on_edge(&self, edge: PpsEdge) -> bool {
        edge == self.shared.pulse.edge() && self.on_pulse()
    }

    pub fn is_attached(&self) -> bool {
        self.shared.pulse.is_attached()
    }
}
