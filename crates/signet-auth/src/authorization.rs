//! Parsing of the authorization material a signed request carries.
//!
//! Three forms are recognised:
//!
//! ```text
//! Authorization: AWS <AccessKeyId>:<Signature>
//! Authorization: AWS4-HMAC-SHA256 Credential=<AKID>/<date>/<region>/<service>/aws4_request,
//!                SignedHeaders=<h1;h2>, Signature=<hex>
//! ?X-Amz-Algorithm=AWS4-HMAC-SHA256&X-Amz-Credential=...&X-Amz-Date=...
//!  &X-Amz-SignedHeaders=...&X-Amz-Signature=...[&X-Amz-Expires=<secs>]
//! ```
//!
//! The first selects the single-step variant, the other two the scoped one.

use crate::error::SignatureError;
use crate::request::SigningRequest;
use crate::variant::{SCOPED_V4_ALGORITHM, SignatureVariant};

/// Query parameter carrying the presigned algorithm.
pub const X_AMZ_ALGORITHM: &str = "X-Amz-Algorithm";
/// Query parameter carrying the presigned credential.
pub const X_AMZ_CREDENTIAL: &str = "X-Amz-Credential";
/// Query parameter / header carrying the request timestamp.
pub const X_AMZ_DATE: &str = "X-Amz-Date";
/// Query parameter carrying the presigned validity in seconds.
pub const X_AMZ_EXPIRES: &str = "X-Amz-Expires";
/// Query parameter carrying the presigned signed header list.
pub const X_AMZ_SIGNED_HEADERS: &str = "X-Amz-SignedHeaders";
/// Query parameter carrying the presigned signature.
pub const X_AMZ_SIGNATURE: &str = "X-Amz-Signature";

/// Authorization material extracted from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationParams {
    /// The variant selected by the authorization form.
    pub variant: SignatureVariant,
    /// The access key ID.
    pub access_key_id: String,
    /// The raw credential scope (`date/region/service/request_type`), scoped variant only.
    pub credential_scope: Option<String>,
    /// Lowercase names of the signed headers, scoped variant only.
    pub signed_headers: Vec<String>,
    /// The provided signature token.
    pub signature: String,
    /// Validity in seconds, presigned requests only.
    pub expires: Option<u64>,
    /// Whether the material came from query parameters.
    pub presigned: bool,
}

/// Whether the request carries presigned query parameters.
#[must_use]
pub fn is_presigned(request: &SigningRequest) -> bool {
    request.query_param(X_AMZ_ALGORITHM).is_some()
}

/// Extract authorization material from the request's query parameters or
/// `Authorization` header. Presigned parameters take precedence.
///
/// # Errors
///
/// Returns [`SignatureError::MissingAuthorization`] if neither form is present,
/// [`SignatureError::UnsupportedAlgorithm`] for an unknown scheme, and
/// [`SignatureError::InvalidAuthorization`] if the material is malformed.
pub fn parse_authorization(request: &SigningRequest) -> Result<AuthorizationParams, SignatureError> {
    if is_presigned(request) {
        return parse_presigned_params(request);
    }

    let header = request
        .header("authorization")
        .ok_or(SignatureError::MissingAuthorization)?;
    parse_authorization_header(header)
}

/// Parse an `Authorization` header value of either variant.
///
/// # Errors
///
/// See [`parse_authorization`].
pub fn parse_authorization_header(header: &str) -> Result<AuthorizationParams, SignatureError> {
    let (algorithm, rest) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| SignatureError::InvalidAuthorization("missing scheme separator".to_owned()))?;

    match algorithm {
        SCOPED_V4_ALGORITHM => parse_scoped_header(rest),
        "AWS" => parse_single_step_header(rest),
        other => Err(SignatureError::UnsupportedAlgorithm(other.to_owned())),
    }
}

/// Parse `AKID:Signature`.
fn parse_single_step_header(rest: &str) -> Result<AuthorizationParams, SignatureError> {
    let (access_key_id, signature) = rest
        .trim()
        .split_once(':')
        .ok_or_else(|| SignatureError::InvalidAuthorization("expected AKID:signature".to_owned()))?;

    if access_key_id.is_empty() || signature.is_empty() {
        return Err(SignatureError::InvalidAuthorization(
            "empty access key or signature".to_owned(),
        ));
    }

    Ok(AuthorizationParams {
        variant: SignatureVariant::SingleStepHmacSha1Base64,
        access_key_id: access_key_id.to_owned(),
        credential_scope: None,
        signed_headers: Vec::new(),
        signature: signature.to_owned(),
        expires: None,
        presigned: false,
    })
}

/// Parse `Credential=..., SignedHeaders=..., Signature=...` in any order.
fn parse_scoped_header(rest: &str) -> Result<AuthorizationParams, SignatureError> {
    let mut credential = None;
    let mut signed_headers = None;
    let mut signature = None;

    for part in rest.split(',') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("Credential=") {
            credential = Some(value);
        } else if let Some(value) = part.strip_prefix("SignedHeaders=") {
            signed_headers = Some(value);
        } else if let Some(value) = part.strip_prefix("Signature=") {
            signature = Some(value);
        }
    }

    let credential = credential.ok_or_else(|| missing("Credential"))?;
    let signed_headers = signed_headers.ok_or_else(|| missing("SignedHeaders"))?;
    let signature = signature.ok_or_else(|| missing("Signature"))?;

    scoped_params(credential, signed_headers, signature, None, false)
}

/// Parse the `X-Amz-*` presigned query parameters.
fn parse_presigned_params(request: &SigningRequest) -> Result<AuthorizationParams, SignatureError> {
    let algorithm = required_param(request, X_AMZ_ALGORITHM)?;
    if algorithm != SCOPED_V4_ALGORITHM {
        return Err(SignatureError::UnsupportedAlgorithm(algorithm.to_owned()));
    }

    let credential = required_param(request, X_AMZ_CREDENTIAL)?;
    required_param(request, X_AMZ_DATE)?;
    let signed_headers = required_param(request, X_AMZ_SIGNED_HEADERS)?;
    let signature = required_param(request, X_AMZ_SIGNATURE)?;

    let expires = request
        .query_param(X_AMZ_EXPIRES)
        .map(|v| {
            v.parse::<u64>().map_err(|_| {
                SignatureError::InvalidAuthorization(format!("{X_AMZ_EXPIRES} is not an integer"))
            })
        })
        .transpose()?;

    scoped_params(credential, signed_headers, signature, expires, true)
}

fn scoped_params(
    credential: &str,
    signed_headers: &str,
    signature: &str,
    expires: Option<u64>,
    presigned: bool,
) -> Result<AuthorizationParams, SignatureError> {
    let (access_key_id, credential_scope) = credential
        .split_once('/')
        .ok_or_else(|| SignatureError::InvalidAuthorization("credential has no scope".to_owned()))?;

    if access_key_id.is_empty() || signature.is_empty() || signed_headers.is_empty() {
        return Err(SignatureError::InvalidAuthorization(
            "empty credential component".to_owned(),
        ));
    }

    Ok(AuthorizationParams {
        variant: SignatureVariant::ScopedHmacSha256Hex,
        access_key_id: access_key_id.to_owned(),
        credential_scope: Some(credential_scope.to_owned()),
        signed_headers: signed_headers
            .split(';')
            .map(str::to_ascii_lowercase)
            .collect(),
        signature: signature.to_owned(),
        expires,
        presigned,
    })
}

fn required_param<'a>(request: &'a SigningRequest, name: &str) -> Result<&'a str, SignatureError> {
    request.query_param(name).ok_or_else(|| missing(name))
}

fn missing(name: &str) -> SignatureError {
    SignatureError::InvalidAuthorization(format!("missing {name}"))
}
