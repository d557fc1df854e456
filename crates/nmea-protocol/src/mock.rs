//! Simulated NMEA Receiver
//!
//! Produces well-formed GGA/RMC/VTG sentences for a configurable fix so the
//! engine can be exercised without hardware.

use crate::sentence::Hemisphere;
use crate::units::KPH_PER_KNOT;
use chrono::{Datelike, Duration, NaiveDateTime, Timelike};

/// XOR of every byte between `$` and `*`
pub fn checksum(body: &str) -> u8 {
    body.bytes()
        .filter(|&b| b != b'$')
        .take_while(|&b| b != b'*')
        .fold(0u8, |acc, b| acc ^ b)
}

/// Frame a sentence body (`GPGGA,...`) as `$body*hh\r\n`
pub fn with_checksum(body: &str) -> String {
    format!("${}*{:02X}\r\n", body, checksum(body))
}

/// Simulated receiver emitting one epoch of sentences per second
#[derive(Debug, Clone)]
pub struct MockReceiver {
    time: NaiveDateTime,
    latitude: f64,
    longitude: f64,
    altitude_m: f64,
    satellites: u32,
    quality: u8,
    speed_knots: f64,
    track_true: f64,
    /// Signed magnetic variation, east positive
    magnetic_variation: f64,
}

impl MockReceiver {
    /// Create a receiver starting at `time`, parked at a fixed position
    pub fn new(time: NaiveDateTime) -> Self {
        Self {
            time,
            latitude: 56.192_233,
            longitude: -3.033_843,
            altitude_m: 545.4,
            satellites: 8,
            quality: 1,
            speed_knots: 0.0,
            track_true: 307.0,
            magnetic_variation: -3.1,
        }
    }

    /// Set the reported position
    pub fn with_position(mut self, latitude: f64, longitude: f64, altitude_m: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self.altitude_m = altitude_m;
        self
    }

    /// Set speed over ground and true track
    pub fn with_velocity(mut self, speed_knots: f64, track_true: f64) -> Self {
        self.speed_knots = speed_knots;
        self.track_true = track_true;
        self
    }

    /// Set the GGA fix quality code
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Current receiver time
    pub fn time(&self) -> NaiveDateTime {
        self.time
    }

    /// Advance the receiver clock by one second
    pub fn advance(&mut self) {
        self.time += Duration::seconds(1);
    }

    /// One epoch: RMC, GGA then VTG
    pub fn epoch(&self) -> String {
        let mut out = self.rmc();
        out.push_str(&self.gga());
        out.push_str(&self.vtg());
        out
    }

    /// Position fix sentence
    pub fn gga(&self) -> String {
        let (lat, ns) = format_coordinate(self.latitude, 2, Hemisphere::North, Hemisphere::South);
        let (lon, ew) = format_coordinate(self.longitude, 3, Hemisphere::East, Hemisphere::West);
        with_checksum(&format!(
            "GPGGA,{},{},{},{},{},{},{:02},1.0,{:.1},M,,,,",
            self.utc(),
            lat,
            ns.as_char(),
            lon,
            ew.as_char(),
            self.quality,
            self.satellites,
            self.altitude_m,
        ))
    }

    /// Recommended minimum sentence
    pub fn rmc(&self) -> String {
        let (lat, ns) = format_coordinate(self.latitude, 2, Hemisphere::North, Hemisphere::South);
        let (lon, ew) = format_coordinate(self.longitude, 3, Hemisphere::East, Hemisphere::West);
        let status = if self.quality == 0 { 'V' } else { 'A' };
        let variation_dir = if self.magnetic_variation < 0.0 { 'W' } else { 'E' };
        with_checksum(&format!(
            "GPRMC,{},{},{},{},{},{},{:05.1},{:05.1},{:02}{:02}{:02},{:05.1},{},A",
            self.utc(),
            status,
            lat,
            ns.as_char(),
            lon,
            ew.as_char(),
            self.speed_knots,
            self.track_true,
            self.time.day(),
            self.time.month(),
            self.time.year().rem_euclid(100),
            self.magnetic_variation.abs(),
            variation_dir,
        ))
    }

    /// Track and ground speed sentence
    pub fn vtg(&self) -> String {
        let track_magnetic = (self.track_true - self.magnetic_variation).rem_euclid(360.0);
        with_checksum(&format!(
            "GPVTG,{:05.1},T,{:05.1},M,{:05.1},N,{:05.1},K,A",
            self.track_true,
            track_magnetic,
            self.speed_knots,
            self.speed_knots * KPH_PER_KNOT,
        ))
    }

    fn utc(&self) -> String {
        format!(
            "{:02}{:02}{:02}.00",
            self.time.hour(),
            self.time.minute(),
            self.time.second()
        )
    }
}

/// Format signed degrees as `D..DMM.mmmm` plus hemisphere
fn format_coordinate(
    value: f64,
    degree_digits: usize,
    positive: Hemisphere,
    negative: Hemisphere,
) -> (String, Hemisphere) {
    let hemisphere = if value < 0.0 { negative } else { positive };
    let magnitude = value.abs();
    let degrees = magnitude.trunc();
    let minutes = ((magnitude - degrees) * 60.0).min(59.9999);
    (
        format!("{:0width$}{:07.4}", degrees as u32, minutes, width = degree_digits),
        hemisphere,
    )
}
