//! Event kinds and handler slots

use nmea_protocol::SentenceKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of event kinds
const EVENT_KINDS: usize = 6;

/// Registered callback
pub type Handler = Box<dyn FnMut() + Send>;

/// Events an application can register a handler for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A GGA sentence was dispatched
    Fix,
    /// An RMC sentence was dispatched
    Time,
    /// A VTG sentence was dispatched
    Vector,
    /// An unrecognized sentence was dispatched
    Unknown,
    /// A one-second pulse was applied to the clock
    Pulse,
    /// A valid time reached a whole minute
    ClockSync,
}

impl EventKind {
    pub const ALL: [EventKind; EVENT_KINDS] = [
        EventKind::Fix,
        EventKind::Time,
        EventKind::Vector,
        EventKind::Unknown,
        EventKind::Pulse,
        EventKind::ClockSync,
    ];

    /// Event fired after dispatching a sentence of `kind`
    pub fn for_sentence(kind: SentenceKind) -> Self {
        match kind {
            SentenceKind::Gga => EventKind::Fix,
            SentenceKind::Rmc => EventKind::Time,
            SentenceKind::Vtg => EventKind::Vector,
            SentenceKind::Unknown => EventKind::Unknown,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Fix => "fix",
            EventKind::Time => "time",
            EventKind::Vector => "vector",
            EventKind::Unknown => "unknown",
            EventKind::Pulse => "pulse",
            EventKind::ClockSync => "clock-sync",
        };
        f.write_str(name)
    }
}

/// One optional handler per event kind
#[derive(Default)]
pub(crate) struct Handlers {
    slots: [Option<Handler>; EVENT_KINDS],
}

impl Handlers {
    /// Register `handler`, replacing any previous one
    pub fn set(&mut self, kind: EventKind, handler: Handler) -> bool {
        self.slots[kind.index()].replace(handler).is_some()
    }

    pub fn clear(&mut self, kind: EventKind) -> bool {
        self.slots[kind.index()].take().is_some()
    }

    pub fn is_set(&self, kind: EventKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// Invoke the handler for `kind`, if any
    pub fn fire(&mut self, kind: EventKind) -> bool {
        match self.slots[kind.index()].as_mut() {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }
}
