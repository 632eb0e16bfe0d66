//! Error types for vendor analytics

use thiserror::Error;

/// Result type for analytics operations
pub type Result<T> = std::result::Result<T, Error>;

/// Analytics errors
#[derive(Error, Debug)]
pub enum Error {
    /// Marketplace error (unknown vendor, wrong role, actor stopped)
    #[error("Marketplace error: {0}")]
    Core(#[from] marketplace_core::Error),

    /// Unknown time range label
    #[error("Invalid time range: {0}")]
    InvalidRange(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
