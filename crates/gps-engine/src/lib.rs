//! NMEA-0183 GPS Engine
//!
//! Bytes arrive one at a time from an interrupt handler through a
//! [`ByteIngestor`]; a periodic tick drives [`GpsEngine::on_tick`], which
//! advances the clock, dispatches completed sentences to their converters and
//! fires registered handlers. Any thread can read the current position,
//! vector and time through a [`GpsReader`] without tearing.

mod config;
mod echo;
mod engine;
mod error;
mod events;
mod ingest;
mod reader;

pub use self::config::{EngineConfig, PpsEdge};
pub use echo::EchoBuffer;
pub use engine::GpsEngine;
pub use error::EngineError;
pub use events::EventKind;
pub use ingest::{ByteIngestor, PulseInput};
pub use reader::{Diagnostics, GpsReader};

pub use gps_time::GpsTime;
pub use nmea_protocol::{FixQuality, Geodetic, SentenceKind, TimeStatus, VectorTrack};
pub use snapshot::SnapshotError;
