//! The two supported signature scheme variants.
//!
//! A [`SignatureVariant`] selects canonicalization, key derivation and token
//! encoding together. The scheme constants (algorithm label, derivation key
//! prefix, scope terminator) are versioned here so a new variant only adds
//! match arms instead of new string concatenation sites.

use std::fmt;

use signet_core::SignatureVersion;

/// Authorization scheme label of the single-step variant (`AWS AKID:sig`).
pub const SINGLE_STEP_ALGORITHM: &str = "AWS";

/// Algorithm label of the scoped variant; first line of its string to sign.
pub const SCOPED_V4_ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Prefix prepended to the secret before the first derivation step.
pub const SCOPED_V4_KEY_PREFIX: &str = "AWS4";

/// Final component of every scoped credential scope.
pub const SCOPED_V4_TERMINATOR: &str = "aws4_request";

/// A signature scheme variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureVariant {
    /// `Base64(HMAC-SHA1(secret, string_to_sign))`.
    SingleStepHmacSha1Base64,
    /// `hex(HMAC-SHA256(derived_key(secret, scope), string_to_sign))`.
    ScopedHmacSha256Hex,
}

impl SignatureVariant {
    /// Algorithm label identifying the variant in an `Authorization` header.
    #[must_use]
    pub fn algorithm(self) -> &'static str {
        match self {
            Self::SingleStepHmacSha1Base64 => SINGLE_STEP_ALGORITHM,
            Self::ScopedHmacSha256Hex => SCOPED_V4_ALGORITHM,
        }
    }

    /// Prefix for the first derivation step, if the variant derives keys.
    #[must_use]
    pub fn key_prefix(self) -> Option<&'static str> {
        match self {
            Self::SingleStepHmacSha1Base64 => None,
            Self::ScopedHmacSha256Hex => Some(SCOPED_V4_KEY_PREFIX),
        }
    }

    /// Expected `request_type` of the credential scope, if the variant is scoped.
    #[must_use]
    pub fn scope_terminator(self) -> Option<&'static str> {
        match self {
            Self::SingleStepHmacSha1Base64 => None,
            Self::ScopedHmacSha256Hex => Some(SCOPED_V4_TERMINATOR),
        }
    }

    /// Whether the string to sign carries a credential scope.
    #[must_use]
    pub fn is_scoped(self) -> bool {
        matches!(self, Self::ScopedHmacSha256Hex)
    }

    /// The configuration-level version of this variant.
    #[must_use]
    pub fn version(self) -> SignatureVersion {
        match self {
            Self::SingleStepHmacSha1Base64 => SignatureVersion::V2,
            Self::ScopedHmacSha256Hex => SignatureVersion::V4,
        }
    }
}

impl From<SignatureVersion> for SignatureVariant {
    fn from(version: SignatureVersion) -> Self {
        match version {
            SignatureVersion::V2 => Self::SingleStepHmacSha1Base64,
            SignatureVersion::V4 => Self::ScopedHmacSha256Hex,
        }
    }
}

impl fmt::Display for SignatureVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleStepHmacSha1Base64 => f.write_str("HMAC-SHA1/base64"),
            Self::ScopedHmacSha256Hex => f.write_str("AWS4-HMAC-SHA256/hex"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_round_trip_through_signature_version() {
        for variant in [
            SignatureVariant::SingleStepHmacSha1Base64,
            SignatureVariant::ScopedHmacSha256Hex,
        ] {
            assert_eq!(SignatureVariant::from(variant.version()), variant);
        }
    }

    #[test]
    fn test_should_expose_scheme_constants_only_for_scoped_variant() {
        let single = SignatureVariant::SingleStepHmacSha1Base64;
        let scoped = SignatureVariant::ScopedHmacSha256Hex;

        assert_eq!(single.key_prefix(), None);
        assert_eq!(single.scope_terminator(), None);
        assert!(!single.is_scoped());

        assert_eq!(scoped.key_prefix(), Some("AWS4"));
        assert_eq!(scoped.scope_terminator(), Some("aws4_request"));
        assert_eq!(scoped.algorithm(), "AWS4-HMAC-SHA256");
        assert!(scoped.is_scoped());
    }
}
