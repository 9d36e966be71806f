//! # Error Types
//!
//! Custom error types for the solar log server using `thiserror`.

use thiserror::Error;

/// Main error type for the solar log server
#[derive(Debug, Error)]
pub enum SolarLogError {
    /// Missing or unparseable request payload
    #[error("{0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors (create, open, read, write or list)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the solar log server
pub type Result<T> = std::result::Result<T, SolarLogError>;
