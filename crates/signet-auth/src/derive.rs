//! Signing key derivation.
//!
//! The single-step variant signs with the raw secret. The scoped variant
//! derives a key with an HMAC-SHA256 chain over the scope fields:
//!
//! ```text
//! DateKey              = HMAC-SHA256(PREFIX + secret, date)
//! DateRegionKey        = HMAC-SHA256(DateKey, region)
//! DateRegionServiceKey = HMAC-SHA256(DateRegionKey, service)
//! SigningKey           = HMAC-SHA256(DateRegionServiceKey, request_type)
//! ```
//!
//! The step order is fixed; signer and verifier must derive identically.

use std::fmt;

use zeroize::Zeroizing;

use crate::error::SignatureError;
use crate::scope::Scope;
use crate::signer::hmac_sha256;
use crate::variant::SignatureVariant;

/// Key material used to compute a signature. Zeroed on drop; `Debug` never
/// prints the bytes.
pub struct DerivedKey(Zeroizing<Vec<u8>>);

impl DerivedKey {
    /// The raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey([REDACTED; {} bytes])", self.0.len())
    }
}

/// Derive the signing key for `variant`.
///
/// `scope` is required for the scoped variant and ignored by the single-step
/// variant.
///
/// # Errors
///
/// Returns [`SignatureError::KeyDerivation`] if the secret is empty, or if the
/// scoped variant gets no scope or a scope with an empty field.
///
/// # Examples
///
/// ```
/// use signet_auth::derive::derive;
/// use signet_auth::scope::Scope;
/// use signet_auth::variant::SignatureVariant;
///
/// let scope = Scope::new("20130524", "us-east-1", "s3", "aws4_request");
/// let key = derive(
///     b"wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
///     Some(&scope),
///     SignatureVariant::ScopedHmacSha256Hex,
/// )
/// .unwrap();
/// assert_eq!(key.len(), 32);
/// ```
pub fn derive(
    secret: &[u8],
    scope: Option<&Scope>,
    variant: SignatureVariant,
) -> Result<DerivedKey, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::KeyDerivation("secret is empty".to_owned()));
    }

    let Some(prefix) = variant.key_prefix() else {
        return Ok(DerivedKey(Zeroizing::new(secret.to_vec())));
    };

    let scope = scope.ok_or_else(|| {
        SignatureError::KeyDerivation(format!("{variant} requires a credential scope"))
    })?;

    let steps = [
        ("date", &scope.date),
        ("region", &scope.region),
        ("service", &scope.service),
        ("request type", &scope.request_type),
    ];
    if let Some((name, _)) = steps.iter().find(|(_, value)| value.is_empty()) {
        return Err(SignatureError::KeyDerivation(format!("scope {name} is empty")));
    }

    let mut key = Zeroizing::new(Vec::with_capacity(prefix.len() + secret.len()));
    key.extend_from_slice(prefix.as_bytes());
    key.extend_from_slice(secret);

    for (_, value) in steps {
        key = hmac_sha256(&key, value.as_bytes());
    }

    Ok(DerivedKey(key))
}
