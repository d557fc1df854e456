//! NMEA Parse Error Types

use crate::sentence::SentenceKind;
use thiserror::Error;

/// Errors that can occur while converting a sentence.
///
/// None of these are fatal: the record a sentence would have updated keeps
/// its previous value for every field the sentence could not supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Sentence ended before a required field
    #[error("{kind} sentence missing {name} (field {index})")]
    MissingField {
        kind: SentenceKind,
        index: usize,
        name: &'static str,
    },

    /// Field present but not convertible
    #[error("{kind} sentence has invalid {name} (field {index})")]
    InvalidField {
        kind: SentenceKind,
        index: usize,
        name: &'static str,
    },

    /// Sentence handed to the wrong converter
    #[error("Expected {expected} sentence, got {actual}")]
    WrongSentence {
        expected: SentenceKind,
        actual: SentenceKind,
    },
}
