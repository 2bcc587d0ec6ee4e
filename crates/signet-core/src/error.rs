//! Error types for the Signet core.

/// Core error type for Signet infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum SignetError {
    /// Unknown signature version selector.
    #[error("invalid signature version: {0} (expected 2 or 4)")]
    InvalidSignatureVersion(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for Signet operations.
pub type SignetResult<T> = Result<T, SignetError>;
