//! Error types for the teaxis_core library.

use crate::failure::ApiError;
use crate::validation::ValidationError;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for teaxis_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Form input rejected before any request was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend call failed (already classified for display)
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Action not permitted for the current user's role
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Action requires an authenticated session
    #[error("Not signed in")]
    NotSignedIn,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns the classified backend error, if this is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e),
            _ => None,
        }
    }
}
