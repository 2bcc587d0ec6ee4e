//! High-level signing and verification.
//!
//! [`SigningEngine`] wires the pipeline together:
//!
//! 1. Canonicalize the request into its string to sign.
//! 2. For the scoped variant, extract the scope and timestamp from the string
//!    and check them against the skew window.
//! 3. Resolve the secret through the configured [`SecretProvider`].
//! 4. Derive the signing key and compare signatures in constant time.
//!
//! Every failure is a [`SignatureError`]; the host answers all of them alike.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::authorization::parse_authorization;
use crate::canonical::{SCOPED_LINE_COUNT, canonicalize_request};
use crate::credentials::{Secret, SecretLookup, SecretProvider, StaticSecretProvider};
use crate::derive::derive;
use crate::error::SignatureError;
use crate::request::SigningRequest;
use crate::scope::{self, Scope, SkewWindow};
use crate::signer;
use crate::variant::SignatureVariant;

/// Verifier configuration supplied by the host.
#[derive(Clone)]
pub struct VerifierConfig {
    /// Accepted clock skew around the scope date and request timestamp.
    pub skew: SkewWindow,
    /// Source of secrets.
    pub secret_provider: Arc<dyn SecretProvider>,
}

impl VerifierConfig {
    /// A configuration with the default skew window.
    pub fn new(secret_provider: Arc<dyn SecretProvider>) -> Self {
        Self {
            skew: SkewWindow::default(),
            secret_provider,
        }
    }

    /// Replace the skew window.
    #[must_use]
    pub fn with_skew(mut self, skew: SkewWindow) -> Self {
        self.skew = skew;
        self
    }
}

impl fmt::Debug for VerifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierConfig")
            .field("skew", &self.skew)
            .finish_non_exhaustive()
    }
}

/// Outcome of a successful [`SigningEngine::verify_request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    /// The access key ID that signed the request.
    pub access_key_id: String,
    /// The variant the request was signed with.
    pub variant: SignatureVariant,
    /// The credential scope, for the scoped variant.
    pub scope: Option<Scope>,
}

/// Signs strings and verifies request signatures against a secret provider.
///
/// The engine holds no per-request state and can be shared across tasks
/// behind an [`Arc`].
#[derive(Debug, Clone)]
pub struct SigningEngine {
    config: VerifierConfig,
}

impl SigningEngine {
    /// Create an engine from its configuration.
    #[must_use]
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify `provided` as the `variant` signature of `request`.
    ///
    /// The string to sign is always composed from the request; a `to_sign`
    /// query parameter is signed over like any other parameter. The access
    /// key, if the request carries one, is passed to the secret provider; a
    /// presigned `X-Amz-Expires` is enforced.
    ///
    /// # Errors
    ///
    /// Returns the [`SignatureError`] of the first failed step.
    pub fn verify_signature(
        &self,
        request: &SigningRequest,
        provided: &str,
        variant: SignatureVariant,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let string_to_sign = canonicalize_request(request, variant)?;
        let auth = parse_authorization(request).ok();

        self.verify_string_to_sign(
            &string_to_sign,
            provided,
            auth.as_ref().map(|a| a.access_key_id.as_str()),
            variant,
            now,
            auth.as_ref().and_then(|a| a.expires),
        )
        .map(|_| ())
    }

    /// Verify `provided` against an already-built string to sign.
    ///
    /// Returns the credential scope for the scoped variant.
    ///
    /// # Errors
    ///
    /// Returns the [`SignatureError`] of the first failed step.
    pub fn verify_string_to_sign(
        &self,
        string_to_sign: &str,
        provided: &str,
        access_key_id: Option<&str>,
        variant: SignatureVariant,
        now: DateTime<Utc>,
        expires: Option<u64>,
    ) -> Result<Option<Scope>, SignatureError> {
        verify_with(
            &self.config.skew,
            string_to_sign,
            provided,
            variant,
            now,
            expires,
            |scope| {
                self.config.secret_provider.secret_for(&SecretLookup {
                    access_key_id,
                    scope,
                    variant,
                })
            },
        )
    }

    /// Verify a request using the authorization material it carries.
    ///
    /// The variant is detected from the `Authorization` header or the
    /// presigned query parameters, and the string to sign is composed from
    /// the request itself.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::MissingAuthorization`] if the request is not
    /// signed, and otherwise the error of the first failed verification step.
    pub fn verify_request(
        &self,
        request: &SigningRequest,
        now: DateTime<Utc>,
    ) -> Result<AuthResult, SignatureError> {
        let auth = parse_authorization(request)?;
        let variant = auth.variant;

        tracing::debug!(
            access_key_id = %auth.access_key_id,
            %variant,
            presigned = auth.presigned,
            "Verifying request signature"
        );

        let string_to_sign = canonicalize_request(request, variant)?;

        let scope = self.verify_string_to_sign(
            &string_to_sign,
            &auth.signature,
            Some(&auth.access_key_id),
            variant,
            now,
            auth.expires,
        )?;

        Ok(AuthResult {
            access_key_id: auth.access_key_id,
            variant,
            scope,
        })
    }

    /// Sign a client-built string to sign.
    ///
    /// For the scoped variant the scope is extracted and validated against
    /// `now` before a key is derived.
    ///
    /// # Errors
    ///
    /// Returns a [`SignatureError`] if the string is malformed, the scope is
    /// invalid or outside the skew window, or no secret is available.
    pub fn sign(
        &self,
        string_to_sign: &str,
        variant: SignatureVariant,
        access_key_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, SignatureError> {
        let scope = if variant.is_scoped() {
            check_scoped_layout(string_to_sign, variant)?;
            let scope = scope::extract_scope(string_to_sign)?;
            scope::validate_terminator(&scope, variant)?;
            scope::validate(&scope, now, &self.config.skew)?;
            Some(scope)
        } else {
            None
        };

        let secret = self.config.secret_provider.secret_for(&SecretLookup {
            access_key_id,
            scope: scope.as_ref(),
            variant,
        })?;
        let key = derive(&secret, scope.as_ref(), variant)?;

        tracing::debug!(%variant, "Signed string to sign");
        Ok(signer::sign(&key, string_to_sign, variant))
    }
}

/// Verify `provided` as the signature of `request` under a single `secret`,
/// with the default skew window.
///
/// # Errors
///
/// Returns the [`SignatureError`] of the first failed step.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use signet_auth::engine::verify_signature;
/// use signet_auth::request::SigningRequest;
/// use signet_auth::variant::SignatureVariant;
///
/// // Single-step string to sign: "GET\n\n\n\n/bucket/key".
/// let request = SigningRequest::builder()
///     .method("GET")
///     .path("/bucket/key")
///     .build();
///
/// let result = verify_signature(
///     &request,
///     "QX8Qip0xDupjuBFnPVlyCF8nePo=",
///     b"AWS_SECRET",
///     SignatureVariant::SingleStepHmacSha1Base64,
///     Utc::now(),
/// );
/// assert!(result.is_ok());
/// ```
pub fn verify_signature(
    request: &SigningRequest,
    provided: &str,
    secret: &[u8],
    variant: SignatureVariant,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let engine = SigningEngine::new(VerifierConfig::new(Arc::new(
        StaticSecretProvider::single(secret),
    )));
    engine.verify_signature(request, provided, variant, now)
}

fn verify_with<F>(
    skew: &SkewWindow,
    string_to_sign: &str,
    provided: &str,
    variant: SignatureVariant,
    now: DateTime<Utc>,
    expires: Option<u64>,
    resolve_secret: F,
) -> Result<Option<Scope>, SignatureError>
where
    F: FnOnce(Option<&Scope>) -> Result<Secret, SignatureError>,
{
    let scope = if variant.is_scoped() {
        check_scoped_layout(string_to_sign, variant)?;

        let scope = scope::extract_scope(string_to_sign)?;
        scope::validate_terminator(&scope, variant)?;
        scope::validate(&scope, now, skew)?;
        tracing::debug!(%scope, "Scope accepted");

        let timestamp = scope::extract_timestamp(string_to_sign)?;
        scope::validate_timestamp(timestamp, &scope, now, skew, expires)?;
        Some(scope)
    } else {
        None
    };

    let secret = resolve_secret(scope.as_ref())?;
    let key = derive(&secret, scope.as_ref(), variant)?;

    if !signer::verify(provided, &key, string_to_sign, variant) {
        tracing::debug!(%variant, "Signature mismatch");
        return Err(SignatureError::SignatureMismatch);
    }

    tracing::debug!(%variant, "Signature verified");
    Ok(scope)
}

/// A scoped string to sign has four lines and names the variant's algorithm.
fn check_scoped_layout(
    string_to_sign: &str,
    variant: SignatureVariant,
) -> Result<(), SignatureError> {
    let algorithm = string_to_sign.split('\n').next().unwrap_or_default();
    if algorithm != variant.algorithm() {
        return Err(SignatureError::UnsupportedAlgorithm(algorithm.to_owned()));
    }

    if string_to_sign.split('\n').count() != SCOPED_LINE_COUNT {
        return Err(SignatureError::MalformedInput(format!(
            "expected {SCOPED_LINE_COUNT} lines"
        )));
    }

    Ok(())
}
