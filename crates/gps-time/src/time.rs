//! Time State Machine

use crate::astro;
use crate::calendar::days_in_month;
use crate::error::TimeError;
use chrono::{NaiveDate, NaiveDateTime};
use nmea_protocol::units::{KPH_PER_KNOT, MPH_PER_KPH};
use nmea_protocol::{Hemisphere, RmcFix, TimeStatus};
use serde::{Deserialize, Serialize};
use snapshot::{pack_bytes, unpack_bytes, Snapshot};
use tracing::{debug, trace};

/// Receiver time and RMC motion fields
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub deciseconds: u8,
    pub centiseconds: u8,
    /// Receiver data status from the last RMC sentence
    pub status: TimeStatus,
    /// Speed over ground in knots
    pub speed_knots: f64,
    /// Track made good in degrees true
    pub track: f64,
    /// Magnetic variation magnitude in degrees
    pub magnetic_variation: f64,
    /// Magnetic variation direction
    pub variation_direction: Option<Hemisphere>,
}

impl Default for GpsTime {
    fn default() -> Self {
        Self {
            year: 2000,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            deciseconds: 0,
            centiseconds: 0,
            status: TimeStatus::Void,
            speed_knots: 0.0,
            track: 0.0,
            magnetic_variation: 0.0,
            variation_direction: None,
        }
    }
}

impl GpsTime {
    /// Advance the sub-second counters by one centisecond.
    ///
    /// Wraps at one second without carrying into the seconds field; whole
    /// seconds only advance on the pulse or an RMC resync.
    pub fn tick(&mut self) {
        self.centiseconds += 1;
        if self.centiseconds >= 10 {
            self.centiseconds = 0;
            self.deciseconds += 1;
            if self.deciseconds >= 10 {
                self.deciseconds = 0;
            }
        }
    }

    /// Advance by `centiseconds` ticks
    pub fn advance(&mut self, centiseconds: u32) {
        for _ in 0..centiseconds {
            self.tick();
        }
    }

    /// Zero the sub-second counters
    pub fn fractional_reset(&mut self) {
        self.deciseconds = 0;
        self.centiseconds = 0;
    }

    /// Add one second, carrying through every calendar field
    pub fn add_second(&mut self) {
        self.second += 1;
        if self.second < 60 {
            return;
        }
        self.second = 0;
        self.minute += 1;
        if self.minute < 60 {
            return;
        }
        self.minute = 0;
        self.hour += 1;
        if self.hour < 24 {
            return;
        }
        self.hour = 0;
        self.day += 1;
        if self.day <= days_in_month(self.year, self.month) {
            return;
        }
        self.day = 1;
        self.month += 1;
        if self.month <= 12 {
            return;
        }
        self.month = 1;
        self.year = self.year.saturating_add(1);
        trace!("Year rolled over to {}", self.year);
    }

    /// Apply the one-second timing pulse
    pub fn pulse(&mut self) {
        self.fractional_reset();
        self.add_second();
    }

    /// Overwrite the civil time from an RMC fix.
    ///
    /// With a pulse source attached the sub-second counters stay with the
    /// pulse; without one they are cleared. The record is left untouched if
    /// the date does not exist.
    pub fn resync(&mut self, fix: &RmcFix, pulse_attached: bool) -> Result<(), TimeError> {
        let max_day = days_in_month(fix.year, fix.month);
        if fix.day == 0 || fix.day > max_day {
            return Err(TimeError::FieldOutOfRange {
                field: "day",
                value: u32::from(fix.day),
                min: 1,
                max: u32::from(max_day),
            });
        }

        self.year = fix.year;
        self.month = fix.month;
        self.day = fix.day;
        self.hour = fix.hour;
        self.minute = fix.minute;
        self.second = fix.second;
        self.status = fix.status;
        if let Some(speed) = fix.speed_knots {
            self.speed_knots = speed;
        }
        if let Some(track) = fix.track {
            self.track = track;
        }
        if let Some(variation) = fix.magnetic_variation {
            self.magnetic_variation = variation;
        }
        if fix.variation_direction.is_some() {
            self.variation_direction = fix.variation_direction;
        }
        if !pulse_attached {
            self.fractional_reset();
        }

        debug!(
            "Time resync {:04}-{:02}-{:02} {:02}:{:02}:{:02} status {}",
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.status.as_char()
        );
        Ok(())
    }

    /// Check if the receiver vouched for the last time fix
    pub fn is_valid(&self) -> bool {
        self.status.is_valid()
    }

    /// Check if the record sits exactly on a whole minute
    pub fn is_on_minute_boundary(&self) -> bool {
        self.second == 0 && self.deciseconds == 0 && self.centiseconds == 0
    }

    /// Seconds within the minute, including the sub-second counters
    pub fn fractional_seconds(&self) -> f64 {
        f64::from(self.second)
            + f64::from(self.deciseconds) / 10.0
            + f64::from(self.centiseconds) / 100.0
    }

    /// Convert to a chrono timestamp; `None` if the fields do not form a date
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        let millis = u32::from(self.deciseconds) * 100 + u32::from(self.centiseconds) * 10;
        NaiveDate::from_ymd_opt(i32::from(self.year), u32::from(self.month), u32::from(self.day))?
            .and_hms_milli_opt(
                u32::from(self.hour),
                u32::from(self.minute),
                u32::from(self.second),
                millis,
            )
    }

    /// Whole seconds since the Unix epoch
    pub fn to_unix_timestamp(&self) -> Option<i64> {
        Some(self.to_datetime()?.and_utc().timestamp())
    }

    /// Speed over ground in knots
    pub fn speed_knots(&self) -> f64 {
        self.speed_knots
    }

    /// Speed over ground in km/h
    pub fn speed_kph(&self) -> f64 {
        self.speed_knots * KPH_PER_KNOT
    }

    /// Speed over ground in m/s
    pub fn speed_mps(&self) -> f64 {
        self.speed_kph() / 3.6
    }

    /// Speed over ground in mph
    pub fn speed_mph(&self) -> f64 {
        self.speed_kph() * MPH_PER_KPH
    }

    /// Track made good in degrees true
    pub fn track(&self) -> f64 {
        self.track
    }

    /// Magnetic variation in degrees, east positive and west negative
    pub fn signed_magnetic_variation(&self) -> f64 {
        match self.variation_direction {
            Some(Hemisphere::West) => -self.magnetic_variation,
            _ => self.magnetic_variation,
        }
    }

    /// Julian day number of the current date
    pub fn julian_day_number(&self) -> i64 {
        astro::julian_day_number(self.year, self.month, self.day)
    }

    /// Julian date of the current instant
    pub fn julian_date(&self) -> f64 {
        astro::julian_date(
            self.julian_day_number(),
            self.hour,
            self.minute,
            self.fractional_seconds(),
        )
    }

    /// Local sidereal time in degrees at `longitude` (east positive)
    pub fn sidereal_degrees(&self, longitude: f64) -> f64 {
        astro::local_sidereal_degrees(self.julian_date(), longitude)
    }

    /// Local sidereal time as an hour angle
    pub fn sidereal_hour_angle(&self, longitude: f64) -> f64 {
        self.sidereal_degrees(longitude) / 15.0
    }
}

fn direction_code(direction: Option<Hemisphere>) -> u8 {
    direction.map_or(0, |h| h.as_char() as u8)
}

impl Snapshot for GpsTime {
    const WORDS: usize = 5;

    fn pack(&self, words: &mut [u64]) {
        let year = self.year.to_le_bytes();
        words[0] = pack_bytes([
            year[0],
            year[1],
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.deciseconds,
        ]);
        words[1] = pack_bytes([
            self.centiseconds,
            self.status.as_char() as u8,
            direction_code(self.variation_direction),
            0,
            0,
            0,
            0,
            0,
        ]);
        words[2] = self.speed_knots.to_bits();
        words[3] = self.track.to_bits();
        words[4] = self.magnetic_variation.to_bits();
    }

    fn unpack(words: &[u64]) -> Self {
        let civil = unpack_bytes(words[0]);
        let flags = unpack_bytes(words[1]);
        Self {
            year: u16::from_le_bytes([civil[0], civil[1]]),
            month: civil[2],
            day: civil[3],
            hour: civil[4],
            minute: civil[5],
            second: civil[6],
            deciseconds: civil[7],
            centiseconds: flags[0],
            status: TimeStatus::from_byte(flags[1]).unwrap_or_default(),
            variation_direction: Hemisphere::from_byte(flags[2]),
            speed_knots: f64::from_bits(words[2]),
            track: f64::from_bits(words[3]),
            magnetic_variation: f64::from_bits(words[4]),
        }
    }
}
