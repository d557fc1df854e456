//! NMEA Sentence Families

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentence families the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentenceKind {
    /// Global positioning system fix data (`$GPGGA`)
    Gga,
    /// Recommended minimum navigation information (`$GPRMC`)
    Rmc,
    /// Track made good and ground speed (`$GPVTG`)
    Vtg,
    /// Any other sentence
    Unknown,
}

impl SentenceKind {
    /// All families, in slot order
    pub const ALL: [SentenceKind; 4] = [
        SentenceKind::Gga,
        SentenceKind::Rmc,
        SentenceKind::Vtg,
        SentenceKind::Unknown,
    ];

    /// Length of the address prefix used for classification
    pub const PREFIX_LEN: usize = 6;

    /// Classify a raw line by its first six characters
    pub fn classify(line: &[u8]) -> Self {
        match line.get(..Self::PREFIX_LEN) {
            Some(b"$GPGGA") => SentenceKind::Gga,
            Some(b"$GPRMC") => SentenceKind::Rmc,
            Some(b"$GPVTG") => SentenceKind::Vtg,
            _ => SentenceKind::Unknown,
        }
    }

    /// Get the address prefix for this family
    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            SentenceKind::Gga => Some("$GPGGA"),
            SentenceKind::Rmc => Some("$GPRMC"),
            SentenceKind::Vtg => Some("$GPVTG"),
            SentenceKind::Unknown => None,
        }
    }

    /// Stable slot index (0..4)
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            SentenceKind::Gga => "GGA",
            SentenceKind::Rmc => "RMC",
            SentenceKind::Vtg => "VTG",
            SentenceKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SentenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compass hemisphere indicator of a coordinate or variation field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    /// Parse a hemisphere from the first character of a field
    pub fn from_token(token: &str) -> Option<Self> {
        Self::from_byte(*token.as_bytes().first()?)
    }

    /// Parse from a raw byte, as stored in packed records
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'N' => Some(Hemisphere::North),
            b'S' => Some(Hemisphere::South),
            b'E' => Some(Hemisphere::East),
            b'W' => Some(Hemisphere::West),
            _ => None,
        }
    }

    /// NMEA indicator character
    pub fn as_char(&self) -> char {
        match self {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
            Hemisphere::East => 'E',
            Hemisphere::West => 'W',
        }
    }

    /// Sign applied to a magnitude in this hemisphere (south and west negative)
    pub fn sign(&self) -> f64 {
        match self {
            Hemisphere::North | Hemisphere::East => 1.0,
            Hemisphere::South | Hemisphere::West => -1.0,
        }
    }

    /// Whether this indicator belongs to a latitude field
    pub fn is_latitude(&self) -> bool {
        matches!(self, Hemisphere::North | Hemisphere::South)
    }
}
