//! RMC Recommended Minimum Conversion
//!
//! `$GPRMC,hhmmss.ss,A,DDMM.mmmm,N,DDDMM.mmmm,W,knots,track,DDMMYY,var,E/W,...`

use crate::error::ParseError;
use crate::fields::{two_digits, Fields};
use crate::sentence::{Hemisphere, SentenceKind};
use serde::{Deserialize, Serialize};

/// Field indices within an RMC sentence
mod index {
    pub const TIME: usize = 1;
    pub const STATUS: usize = 2;
    pub const SPEED_KNOTS: usize = 7;
    pub const TRACK: usize = 8;
    pub const DATE: usize = 9;
    pub const MAGNETIC_VARIATION: usize = 10;
    pub const VARIATION_HEMISPHERE: usize = 11;
}

/// Century assumed for two-digit RMC years.
///
/// Dates from 2100 onward will be read as 20xx.
pub const RMC_CENTURY: u16 = 2000;

/// Receiver data status (RMC field 2)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeStatus {
    /// `A`: data valid
    Valid,
    /// `V`: navigation receiver warning
    #[default]
    Void,
}

impl TimeStatus {
    /// Parse from a status character
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'A' => Some(TimeStatus::Valid),
            b'V' => Some(TimeStatus::Void),
            _ => None,
        }
    }

    /// NMEA status character
    pub fn as_char(&self) -> char {
        match self {
            TimeStatus::Valid => 'A',
            TimeStatus::Void => 'V',
        }
    }

    /// Check if the receiver vouches for the data
    pub fn is_valid(&self) -> bool {
        *self == TimeStatus::Valid
    }
}

/// Fields extracted from one RMC sentence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RmcFix {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub day: u8,
    pub month: u8,
    pub year: u16,
    /// Data status
    pub status: TimeStatus,
    /// Speed over ground in knots, if present
    pub speed_knots: Option<f64>,
    /// Track made good in degrees true, if present
    pub track: Option<f64>,
    /// Magnetic variation magnitude in degrees, if present
    pub magnetic_variation: Option<f64>,
    /// Magnetic variation direction, if present
    pub variation_direction: Option<Hemisphere>,
}

impl RmcFix {
    /// Parse an RMC sentence.
    ///
    /// Time, status and date are required and range-checked; the remaining
    /// fields are optional.
    pub fn parse(sentence: &str) -> Result<Self, ParseError> {
        let fields = Fields::new(sentence);
        if fields.kind() != SentenceKind::Rmc {
            return Err(ParseError::WrongSentence {
                expected: SentenceKind::Rmc,
                actual: fields.kind(),
            });
        }

        let status = fields.require_with(index::STATUS, "status", |t| {
            TimeStatus::from_byte(*t.as_bytes().first()?)
        })?;
        let (hour, minute, second) = fields.require_with(index::TIME, "UTC time", |t| {
            let hour = two_digits(t, 0).filter(|h| *h < 24)?;
            let minute = two_digits(t, 2).filter(|m| *m < 60)?;
            let second = two_digits(t, 4).filter(|s| *s < 60)?;
            Some((hour, minute, second))
        })?;
        let (day, month, year) = fields.require_with(index::DATE, "date", |t| {
            let day = two_digits(t, 0).filter(|d| (1..=31).contains(d))?;
            let month = two_digits(t, 2).filter(|m| (1..=12).contains(m))?;
            let year = two_digits(t, 4)?;
            Some((day, month, RMC_CENTURY + u16::from(year)))
        })?;

        Ok(Self {
            hour,
            minute,
            second,
            day,
            month,
            year,
            status,
            speed_knots: fields.parse_f64(index::SPEED_KNOTS),
            track: fields.parse_f64(index::TRACK),
            magnetic_variation: fields.parse_f64(index::MAGNETIC_VARIATION),
            variation_direction: fields
                .hemisphere(index::VARIATION_HEMISPHERE)
                .filter(|h| !h.is_latitude()),
        })
    }
}
