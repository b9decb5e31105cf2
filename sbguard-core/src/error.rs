//! Error types for SBGUARD.
//!
//! Library crates return [`SbError`]; the lookup orchestrator absorbs
//! transport failures at its boundary and only logs them.

use thiserror::Error;

/// Result type alias using `SbError`.
pub type Result<T> = std::result::Result<T, SbError>;

/// Main error type for all SBGUARD operations.
#[derive(Debug, Error)]
pub enum SbError {
    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSPORT ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// HTTP request could not be sent or the connection failed.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// The remote service did not answer in time.
    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The remote service answered with a non-success status.
    #[error("Unexpected HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Action string that maps to no known verdict code.
    #[error("Unknown action: '{0}'")]
    InvalidAction(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION / IO
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SbError {
    /// Returns true if this error came from talking to the remote service.
    ///
    /// These are the failures a lookup swallows and reports as "no verdict".
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SbError::HttpError(_)
                | SbError::Timeout { .. }
                | SbError::HttpStatus { .. }
                | SbError::MalformedResponse(_)
        )
    }

    /// Returns true if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(self, SbError::ConfigError(_) | SbError::InvalidAction(_))
    }
}
