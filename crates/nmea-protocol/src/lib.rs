//! NMEA-0183 Protocol Implementation
//!
//! This crate tokenizes comma-delimited NMEA sentences and converts the
//! position fix (GGA), recommended minimum (RMC) and vector track (VTG)
//! families into typed records. Parsing never allocates.

mod error;
mod fields;
mod gga;
mod mock;
mod rmc;
mod sentence;
mod vtg;

pub use error::ParseError;
pub use fields::{
    parse_latitude, parse_longitude, strip_trailer, two_digits, Fields, EMPTY_FIELD, MAX_FIELDS,
};
pub use gga::{FixQuality, Geodetic, GgaFix};
pub use mock::{checksum, with_checksum, MockReceiver};
pub use rmc::{RmcFix, TimeStatus};
pub use sentence::{Hemisphere, SentenceKind};
pub use vtg::VectorTrack;

/// Conversion constants
pub mod units {
    /// Kilometres per hour in one knot
    pub const KPH_PER_KNOT: f64 = 1.852;
    /// Miles per hour in one kilometre per hour
    pub const MPH_PER_KPH: f64 = 0.621_371_192;
    /// Metres in one kilometre
    pub const METRES_PER_KM: f64 = 1000.0;
}
