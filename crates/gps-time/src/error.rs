//! Time Error Types

use thiserror::Error;

/// Errors while applying a time fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeError {
    /// A civil field fell outside its calendar range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    FieldOutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}
