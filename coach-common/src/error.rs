//! Common error types for the coaching services

use thiserror::Error;

/// Common result type for coaching service operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across coaching services
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
