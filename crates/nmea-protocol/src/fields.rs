//! Positional Field Tokenizer and Numeric Conversions
//!
//! NMEA sentences are position-defined: the meaning of a field is its index.
//! The tokenizer therefore never collapses empty fields; an empty field is
//! reported as `"0"`, the same value the byte ingestor writes between two
//! adjacent separators.

use crate::error::ParseError;
use crate::sentence::{Hemisphere, SentenceKind};

/// Most fields kept from one sentence; later fields are ignored
pub const MAX_FIELDS: usize = 24;

/// Token reported for an empty field
pub const EMPTY_FIELD: &str = "0";

/// Strip the line terminator and any `*hh` checksum trailer.
///
/// The checksum itself is not verified.
pub fn strip_trailer(sentence: &str) -> &str {
    let line = sentence.trim_end_matches(|c| c == '\r' || c == '\n');
    match line.find('*') {
        Some(star) => &line[..star],
        None => line,
    }
}

/// Parse the fixed-width decimal pair starting at byte `at`
pub fn two_digits(token: &str, at: usize) -> Option<u8> {
    let bytes = token.as_bytes();
    let tens = *bytes.get(at)?;
    let ones = *bytes.get(at + 1)?;
    if !tens.is_ascii_digit() || !ones.is_ascii_digit() {
        return None;
    }
    Some((tens - b'0') * 10 + (ones - b'0'))
}

/// Convert a `DDMM.mmmm` latitude into signed degrees
pub fn parse_latitude(token: &str, hemisphere: Hemisphere) -> Option<f64> {
    if !hemisphere.is_latitude() {
        return None;
    }
    let degrees = parse_coordinate(token, 2)?;
    (degrees <= 90.0).then(|| degrees * hemisphere.sign())
}

/// Convert a `DDDMM.mmmm` longitude into signed degrees
pub fn parse_longitude(token: &str, hemisphere: Hemisphere) -> Option<f64> {
    if hemisphere.is_latitude() {
        return None;
    }
    let degrees = parse_coordinate(token, 3)?;
    (degrees <= 180.0).then(|| degrees * hemisphere.sign())
}

/// `degrees + minutes / 60`, where the minutes carry their decimal fraction
fn parse_coordinate(token: &str, degree_digits: usize) -> Option<f64> {
    let bytes = token.as_bytes();
    if bytes.len() < degree_digits + 2 {
        return None;
    }
    if !bytes[..degree_digits + 2].iter().all(u8::is_ascii_digit) {
        return None;
    }

    let (degrees, minutes) = token.split_at(degree_digits);
    let degrees: f64 = degrees.parse().ok()?;
    let minutes: f64 = minutes.parse().ok()?;
    if minutes >= 60.0 {
        return None;
    }
    Some(degrees + minutes / 60.0)
}

/// Positional tokens of one sentence
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    tokens: [&'a str; MAX_FIELDS],
    len: usize,
    kind: SentenceKind,
}

impl<'a> Fields<'a> {
    /// Split a sentence on `,`. Index 0 is the `$GPxxx` address.
    pub fn new(sentence: &'a str) -> Self {
        let body = strip_trailer(sentence);
        let mut tokens = [EMPTY_FIELD; MAX_FIELDS];
        let mut len = 0;

        for field in body.split(',').take(MAX_FIELDS) {
            tokens[len] = if field.is_empty() { EMPTY_FIELD } else { field };
            len += 1;
        }

        Self {
            tokens,
            len,
            kind: SentenceKind::classify(body.as_bytes()),
        }
    }

    /// Family of the tokenized sentence
    pub fn kind(&self) -> SentenceKind {
        self.kind
    }

    /// Number of fields, including the address
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the sentence had no fields at all
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the token at `index`, if the sentence reached that far
    pub fn get(&self, index: usize) -> Option<&'a str> {
        (index < self.len).then(|| self.tokens[index])
    }

    /// Iterate tokens in order
    pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.tokens[..self.len].iter().copied()
    }

    /// Get a token or report it missing
    pub fn require(&self, index: usize, name: &'static str) -> Result<&'a str, ParseError> {
        self.get(index).ok_or(ParseError::MissingField {
            kind: self.kind,
            index,
            name,
        })
    }

    /// Convert a required token, reporting failures against `name`
    pub fn require_with<T>(
        &self,
        index: usize,
        name: &'static str,
        convert: impl FnOnce(&'a str) -> Option<T>,
    ) -> Result<T, ParseError> {
        let token = self.require(index, name)?;
        convert(token).ok_or(ParseError::InvalidField {
            kind: self.kind,
            index,
            name,
        })
    }

    /// Parse a decimal field; `None` when absent or malformed
    pub fn parse_f64(&self, index: usize) -> Option<f64> {
        self.get(index)?.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Parse an unsigned integer field; `None` when absent or malformed
    pub fn parse_u32(&self, index: usize) -> Option<u32> {
        self.get(index)?.parse().ok()
    }

    /// Parse a hemisphere indicator; `None` when absent or not N/S/E/W
    pub fn hemisphere(&self, index: usize) -> Option<Hemisphere> {
        Hemisphere::from_token(self.get(index)?)
    }
}
