//! Common type definitions shared across crates.

use std::fmt;
use std::str::FromStr;

use crate::SignetError;

/// Signature scheme version selected by configuration.
///
/// Version 2 is the single-step HMAC-SHA1 scheme, version 4 the scoped,
/// derived-key HMAC-SHA256 scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum SignatureVersion {
    /// Single-step HMAC-SHA1, base64 encoded.
    #[serde(rename = "2")]
    V2,
    /// Scoped HMAC-SHA256 with a derived key, hex encoded.
    #[default]
    #[serde(rename = "4")]
    V4,
}

impl SignatureVersion {
    /// The version as it appears in configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V2 => "2",
            Self::V4 => "4",
        }
    }
}

impl FromStr for SignatureVersion {
    type Err = SignetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "2" | "v2" => Ok(Self::V2),
            "4" | "v4" => Ok(Self::V4),
            other => Err(SignetError::InvalidSignatureVersion(other.to_owned())),
        }
    }
}

impl fmt::Display for SignatureVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
