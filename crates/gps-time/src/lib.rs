//! GPS Civil Time
//!
//! Keeps a calendar date and time of day that advances on a periodic tick,
//! carries whole seconds on the receiver's one-second pulse and is corrected
//! from RMC sentences. Astronomical helpers derive Julian dates and local
//! sidereal time from the current record.

pub mod astro;
pub mod calendar;
mod error;
mod time;

pub use calendar::{days_in_month, is_leap_year};
pub use error::TimeError;
pub use time::GpsTime;
