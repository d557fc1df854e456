//! GGA Position Fix Conversion
//!
//! `$GPGGA,hhmmss.ss,DDMM.mmmm,N,DDDMM.mmmm,W,q,ss,hdop,alt,M,...`

use crate::error::ParseError;
use crate::fields::{parse_latitude, parse_longitude, Fields};
use crate::sentence::{Hemisphere, SentenceKind};
use crate::units::METRES_PER_KM;
use serde::{Deserialize, Serialize};
use snapshot::{pack_bytes, unpack_bytes, Snapshot};

/// Field indices within a GGA sentence
mod index {
    pub const LATITUDE: usize = 2;
    pub const LAT_HEMISPHERE: usize = 3;
    pub const LONGITUDE: usize = 4;
    pub const LON_HEMISPHERE: usize = 5;
    pub const QUALITY: usize = 6;
    pub const SATELLITES: usize = 7;
    pub const ALTITUDE: usize = 9;
}

/// Fix quality indicator (GGA field 6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixQuality {
    /// No fix; position must not be trusted
    Invalid,
    /// Standalone GPS fix
    Gps,
    /// Differential GPS fix
    Dgps,
    /// Precise positioning service
    Pps,
    /// Real-time kinematic, fixed integers
    Rtk,
    /// Real-time kinematic, float integers
    FloatRtk,
    /// Dead reckoning
    Estimated,
    /// Manual input
    Manual,
    /// Simulator output
    Simulation,
    /// Vendor-specific code
    Other(u8),
}

impl FixQuality {
    /// Check if the code represents a usable fix
    pub fn is_valid(&self) -> bool {
        !matches!(self, FixQuality::Invalid)
    }
}

impl From<u8> for FixQuality {
    fn from(code: u8) -> Self {
        match code {
            0 => FixQuality::Invalid,
            1 => FixQuality::Gps,
            2 => FixQuality::Dgps,
            3 => FixQuality::Pps,
            4 => FixQuality::Rtk,
            5 => FixQuality::FloatRtk,
            6 => FixQuality::Estimated,
            7 => FixQuality::Manual,
            8 => FixQuality::Simulation,
            other => FixQuality::Other(other),
        }
    }
}

/// Fields extracted from one GGA sentence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GgaFix {
    /// Latitude in degrees, north positive
    pub latitude: f64,
    /// Longitude in degrees, east positive
    pub longitude: f64,
    /// Altitude above mean sea level in kilometres
    pub altitude_km: f64,
    /// Satellites used in the fix
    pub satellites: u32,
    /// Raw fix quality code
    pub quality: u8,
}

impl GgaFix {
    /// Parse a GGA sentence; every positional field is required
    pub fn parse(sentence: &str) -> Result<Self, ParseError> {
        let fields = Fields::new(sentence);
        if fields.kind() != SentenceKind::Gga {
            return Err(ParseError::WrongSentence {
                expected: SentenceKind::Gga,
                actual: fields.kind(),
            });
        }

        let lat_hemisphere = fields.require_with(
            index::LAT_HEMISPHERE,
            "latitude hemisphere",
            Hemisphere::from_token,
        )?;
        let latitude = fields.require_with(index::LATITUDE, "latitude", |t| {
            parse_latitude(t, lat_hemisphere)
        })?;
        let lon_hemisphere = fields.require_with(
            index::LON_HEMISPHERE,
            "longitude hemisphere",
            Hemisphere::from_token,
        )?;
        let longitude = fields.require_with(index::LONGITUDE, "longitude", |t| {
            parse_longitude(t, lon_hemisphere)
        })?;
        let quality = fields.require_with(index::QUALITY, "fix quality", |t| t.parse::<u8>().ok())?;
        let satellites = fields.require_with(index::SATELLITES, "satellite count", |t| {
            t.parse::<u32>().ok()
        })?;
        let altitude_m = fields.require_with(index::ALTITUDE, "altitude", |t| {
            t.parse::<f64>().ok().filter(|v| v.is_finite())
        })?;

        Ok(Self {
            latitude,
            longitude,
            altitude_km: altitude_m / METRES_PER_KM,
            satellites,
            quality,
        })
    }
}

/// Geodetic position record
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Geodetic {
    /// Latitude in degrees, north positive
    pub latitude: f64,
    /// Longitude in degrees, east positive
    pub longitude: f64,
    /// Altitude above mean sea level in kilometres
    pub altitude_km: f64,
    /// Satellites used in the last fix
    pub satellites: u32,
    /// Fix quality code (0 = no fix)
    pub quality: u8,
}

impl Geodetic {
    /// Classify the quality code
    pub fn fix_quality(&self) -> FixQuality {
        FixQuality::from(self.quality)
    }

    /// Check if the last fix can be trusted
    pub fn has_fix(&self) -> bool {
        self.quality != 0
    }

    /// Update from a GGA sentence.
    ///
    /// A complete sentence with a non-zero quality replaces every field. A
    /// quality of 0 only updates the quality. An incomplete or malformed
    /// sentence forces the quality to 0 and keeps the last good position.
    pub fn apply_gga(&mut self, sentence: &str) -> Result<FixQuality, ParseError> {
        match GgaFix::parse(sentence) {
            Ok(fix) => {
                self.quality = fix.quality;
                if fix.quality != 0 {
                    self.latitude = fix.latitude;
                    self.longitude = fix.longitude;
                    self.altitude_km = fix.altitude_km;
                    self.satellites = fix.satellites;
                }
                Ok(FixQuality::from(fix.quality))
            }
            Err(err) => {
                self.quality = 0;
                Err(err)
            }
        }
    }
}

impl Snapshot for Geodetic {
    const WORDS: usize = 4;

    fn pack(&self, words: &mut [u64]) {
        words[0] = self.latitude.to_bits();
        words[1] = self.longitude.to_bits();
        words[2] = self.altitude_km.to_bits();
        let sats = self.satellites.to_le_bytes();
        words[3] = pack_bytes([sats[0], sats[1], sats[2], sats[3], self.quality, 0, 0, 0]);
    }

    fn unpack(words: &[u64]) -> Self {
        let tail = unpack_bytes(words[3]);
        Self {
            latitude: f64::from_bits(words[0]),
            longitude: f64::from_bits(words[1]),
            altitude_km: f64::from_bits(words[2]),
            satellites: u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]),
            quality: tail[4],
        }
    }
}
