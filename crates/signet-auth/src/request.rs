//! The request-scoped input of the signing pipeline.
//!
//! A [`SigningRequest`] is what the host framework hands over after parsing
//! the transport request: method, path, decoded query parameters in arrival
//! order, headers and the payload. It is immutable once built.

use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};
use typed_builder::TypedBuilder;

/// Payload hash used when the body is not covered by the signature.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// The request body, or what the signature commits to about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// The raw body bytes; hashed with SHA-256 when needed.
    Raw(Vec<u8>),
    /// A precomputed lowercase hex SHA-256 of the body.
    Hash(String),
    /// The body is not signed.
    Unsigned,
}

impl Default for Payload {
    fn default() -> Self {
        Self::Raw(Vec::new())
    }
}

impl Payload {
    /// The payload hash as it appears in the canonical request.
    #[must_use]
    pub fn hash(&self) -> String {
        match self {
            Self::Raw(body) => hash_payload(body),
            Self::Hash(hash) => hash.clone(),
            Self::Unsigned => UNSIGNED_PAYLOAD.to_owned(),
        }
    }
}

/// An incoming request reduced to the parts a signature covers.
///
/// # Examples
///
/// ```
/// use signet_auth::request::SigningRequest;
///
/// let request = SigningRequest::builder()
///     .method("GET")
///     .path("/sign_auth")
///     .query_params(vec![("to_sign".to_owned(), "hello".to_owned())])
///     .build();
///
/// assert_eq!(request.query_param("to_sign"), Some("hello"));
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct SigningRequest {
    #[builder(setter(into))]
    method: String,
    #[builder(setter(into), default = "/".to_owned())]
    path: String,
    /// Decoded `(key, value)` pairs in the order they appeared.
    #[builder(default)]
    query_params: Vec<(String, String)>,
    /// `(name, value)` pairs; names are matched case-insensitively.
    #[builder(default)]
    headers: Vec<(String, String)>,
    #[builder(default)]
    payload: Payload,
}

impl SigningRequest {
    /// Build a signing request from parsed HTTP request parts and the body.
    ///
    /// Query parameters are percent-decoded. Header values that are not valid
    /// visible ASCII are skipped.
    #[must_use]
    pub fn from_parts(parts: &http::request::Parts, body: &[u8]) -> Self {
        let query_params = parse_query(parts.uri.query().unwrap_or(""));

        let headers = parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect();

        Self {
            method: parts.method.as_str().to_owned(),
            path: parts.uri.path().to_owned(),
            query_params,
            headers,
            payload: Payload::Raw(body.to_vec()),
        }
    }

    /// The HTTP method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The URI path, not yet canonicalized.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// All decoded query parameters in arrival order.
    #[must_use]
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query_params
    }

    /// All headers in arrival order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The payload.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// First value of the query parameter `name`.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First value of the header `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the header `name` is present (case-insensitive).
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
}

/// Split a raw query string into percent-decoded `(key, value)` pairs.
///
/// `+` is not treated as a space; signing clients encode spaces as `%20`.
#[must_use]
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| {
            let (key, value) = param.split_once('=').unwrap_or((param, ""));
            (url_decode(key), url_decode(value))
        })
        .collect()
}

/// Compute the SHA-256 hash of the given payload and return it as a hex string.
///
/// # Examples
///
/// ```
/// use signet_auth::request::hash_payload;
///
/// // SHA-256 of empty payload
/// assert_eq!(
///     hash_payload(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

fn url_decode(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}
