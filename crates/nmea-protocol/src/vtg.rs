//! VTG Track and Ground Speed Conversion
//!
//! `$GPVTG,track,T,track,M,knots,N,kph,K`

use crate::fields::Fields;
use crate::sentence::SentenceKind;
use serde::{Deserialize, Serialize};
use snapshot::Snapshot;
use tracing::debug;

/// Field indices within a VTG sentence
mod index {
    pub const TRACK_TRUE: usize = 1;
    pub const TRACK_MAGNETIC: usize = 3;
    pub const SPEED_KNOTS: usize = 5;
    pub const SPEED_KPH: usize = 7;
}

/// Vector track and speed record
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorTrack {
    /// Track made good relative to true north (degrees)
    pub track_true: f64,
    /// Track made good relative to magnetic north (degrees)
    pub track_magnetic: f64,
    /// Speed over ground (knots)
    pub speed_knots: f64,
    /// Speed over ground (km/h)
    pub speed_kph: f64,
}

impl VectorTrack {
    /// Update from a VTG sentence.
    ///
    /// Each field is applied on its own; a missing or malformed field keeps
    /// its previous value. Returns the number of fields updated.
    pub fn apply_vtg(&mut self, sentence: &str) -> usize {
        let fields = Fields::new(sentence);
        if fields.kind() != SentenceKind::Vtg {
            debug!("Ignoring {} sentence in VTG converter", fields.kind());
            return 0;
        }

        let mut updated = 0;
        let targets = [
            (index::TRACK_TRUE, &mut self.track_true),
            (index::TRACK_MAGNETIC, &mut self.track_magnetic),
            (index::SPEED_KNOTS, &mut self.speed_knots),
            (index::SPEED_KPH, &mut self.speed_kph),
        ];
        for (index, target) in targets {
            if let Some(value) = fields.parse_f64(index) {
                *target = value;
                updated += 1;
            }
        }
        updated
    }

    /// Speed over ground in metres per second
    pub fn speed_mps(&self) -> f64 {
        self.speed_kph / 3.6
    }
}

impl Snapshot for VectorTrack {
    const WORDS: usize = 4;

    fn pack(&self, words: &mut [u64]) {
        words[0] = self.track_true.to_bits();
        words[1] = self.track_magnetic.to_bits();
        words[2] = self.speed_knots.to_bits();
        words[3] = self.speed_kph.to_bits();
    }

    fn unpack(words: &[u64]) -> Self {
        Self {
            track_true: f64::from_bits(words[0]),
            track_magnetic: f64::from_bits(words[1]),
            speed_knots: f64::from_bits(words[2]),
            speed_kph: f64::from_bits(words[3]),
        }
    }
}
