//! HMAC request-signature signing and verification for Signet.
//!
//! Two signature variants are supported:
//!
//! - **Single-step** (`AWS`): `base64(HMAC-SHA1(secret, string_to_sign))`.
//! - **Scoped** (`AWS4-HMAC-SHA256`): the secret is turned into a signing key
//!   by an HMAC-SHA256 chain over the credential scope
//!   `date/region/service/aws4_request`, and the signature is
//!   `hex(HMAC-SHA256(signing_key, string_to_sign))`.
//!
//! Verification recomputes the signature and compares it in constant time.
//! For the scoped variant the scope date and request timestamp must lie
//! within a configurable skew window around the current time.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use chrono::{TimeZone, Utc};
//! use signet_auth::{SigningEngine, SignatureVariant, StaticSecretProvider, VerifierConfig};
//!
//! let provider = StaticSecretProvider::single("AWS_SECRET");
//! let engine = SigningEngine::new(VerifierConfig::new(Arc::new(provider)));
//!
//! let string_to_sign = "AWS4-HMAC-SHA256\n\
//!     20230101T000000Z\n\
//!     20230101/us-east-1/s3/aws4_request\n\
//!     0a0dd95dbca79e124d33999cbb81b5758137ce46cf224b2b1b49de6e1b950026";
//! let now = Utc.with_ymd_and_hms(2023, 1, 1, 0, 5, 0).unwrap();
//!
//! let token = engine
//!     .sign(string_to_sign, SignatureVariant::ScopedHmacSha256Hex, None, now)
//!     .unwrap();
//! assert_eq!(token, "de52d948efe86ade8e7345a97ece9fd1e23917f427095fcc7d99559595e3538e");
//! ```
//!
//! # Modules
//!
//! - [`authorization`] - `Authorization` header and presigned parameter parsing
//! - [`canonical`] - String-to-sign construction for both variants
//! - [`credentials`] - Secret provider trait and implementations
//! - [`derive`] - Signing key derivation
//! - [`engine`] - The verification pipeline
//! - [`error`] - Signature error types
//! - [`request`] - The request view the core signs over
//! - [`scope`] - Credential scope extraction and time-window checks
//! - [`signer`] - HMAC computation and constant-time comparison
//! - [`variant`] - Signature variants and their constants

pub mod authorization;
pub mod canonical;
pub mod credentials;
pub mod derive;
pub mod engine;
pub mod error;
pub mod request;
pub mod scope;
pub mod signer;
pub mod variant;

pub use canonical::{canonicalize, canonicalize_request};
pub use credentials::{Secret, SecretLookup, SecretProvider, StaticSecretProvider, secret_fn};
pub use derive::{DerivedKey, derive};
pub use engine::{AuthResult, SigningEngine, VerifierConfig, verify_signature};
pub use error::SignatureError;
pub use request::{Payload, SigningRequest, hash_payload};
pub use scope::{Scope, SkewWindow};
pub use signer::{sign, verify};
pub use variant::SignatureVariant;
