//! Engine Error Types

use thiserror::Error;

/// Errors raised while building an engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration values are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration sources could not be read
    #[error("Configuration load error: {0}")]
    Config(#[from] ::config::ConfigError),
}
