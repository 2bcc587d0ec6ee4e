//! Error types for request-signature verification.
//!
//! Every failure mode of the verification pipeline is a variant of
//! [`SignatureError`]. The variants are precise so the host can log them,
//! but the host must answer every one of them with the same rejection:
//! use [`SignatureError::status_code`] and [`SignatureError::public_message`]
//! when building the response.

/// The message shown to clients for any signature failure.
pub const PUBLIC_MESSAGE: &str = "Signature verification failed";

/// Errors that can occur while signing or verifying a request.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// The string to sign (or the request it is built from) lacks the
    /// expected line or field structure.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The credential scope is not `date/region/service/request_type` or one
    /// of its fields is invalid.
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// The signature's date or timestamp lies outside the accepted skew window.
    #[error("Signature has expired or is not yet valid")]
    ExpiredSignature,

    /// The recomputed signature differs from the provided one.
    #[error("Signature does not match")]
    SignatureMismatch,

    /// The signing key could not be derived (empty secret or scope field).
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// The secret provider does not know the access key.
    #[error("Access key not found: {0}")]
    AccessKeyNotFound(String),

    /// The request carries neither an `Authorization` header nor presigned
    /// query parameters.
    #[error("Missing authorization")]
    MissingAuthorization,

    /// The `Authorization` header or presigned parameters could not be parsed.
    #[error("Invalid authorization: {0}")]
    InvalidAuthorization(String),

    /// The signing algorithm is not one of the supported variants.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

impl SignatureError {
    /// HTTP status the host should answer with. Always `403 Forbidden`, so
    /// clients cannot tell which check failed.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        http::StatusCode::FORBIDDEN
    }

    /// Client-facing message. Identical for every variant.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        PUBLIC_MESSAGE
    }

    /// Short machine-readable name of the failure, for server-side logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "MalformedInput",
            Self::InvalidScope(_) => "InvalidScope",
            Self::ExpiredSignature => "ExpiredSignature",
            Self::SignatureMismatch => "SignatureMismatch",
            Self::KeyDerivation(_) => "KeyDerivationError",
            Self::AccessKeyNotFound(_) => "AccessKeyNotFound",
            Self::MissingAuthorization => "MissingAuthorization",
            Self::InvalidAuthorization(_) => "InvalidAuthorization",
            Self::UnsupportedAlgorithm(_) => "UnsupportedAlgorithm",
        }
    }
}
