//! The Signet HTTP service implementing hyper's `Service` trait.
//!
//! Routes:
//!
//! - `GET /sign_auth?to_sign=...[&access_key=...]` signs a client-built string
//!   with the configured variant and returns the token as `text/plain`. It is
//!   served only when the service holds a signing engine, whose credential
//!   must differ from every credential the verify route accepts; otherwise
//!   the route answers `404`.
//! - `GET /server_time` returns the server's clock in RFC 1123 format, so
//!   clients can correct their local offset before signing.
//! - `GET /health`, `GET /_health` report liveness.
//! - Every other request is verified with the signature it carries.
//!
//! Any signature failure is answered with the same `403` body. Request bodies
//! over [`MAX_BODY_BYTES`] are answered with `413`.

use std::convert::Infallible;
use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::service::Service;
use signet_auth::error::{PUBLIC_MESSAGE, SignatureError};
use signet_auth::request::parse_query;
use signet_auth::{SignatureVariant, SigningEngine, SigningRequest};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Response body type of the service.
pub type SignetBody = Full<Bytes>;

/// Path of the signing endpoint.
const SIGN_PATH: &str = "/sign_auth";

/// Path of the server time endpoint.
const SERVER_TIME_PATH: &str = "/server_time";

/// RFC 1123 date format, always in GMT.
const RFC1123_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Largest request body read for verification: 16 MiB.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// The HTTP service wrapping a verifying and an optional signing
/// [`SigningEngine`].
#[derive(Debug, Clone)]
pub struct SignetService {
    verifier: Arc<SigningEngine>,
    signer: Option<Arc<SigningEngine>>,
    variant: SignatureVariant,
}

impl SignetService {
    /// Create a service that verifies with `verifier` and, if `signer` is
    /// given, signs with `variant` on the signing endpoint.
    pub fn new(
        verifier: SigningEngine,
        signer: Option<SigningEngine>,
        variant: SignatureVariant,
    ) -> Self {
        Self {
            verifier: Arc::new(verifier),
            signer: signer.map(Arc::new),
            variant,
        }
    }
}

impl Service<http::Request<Incoming>> for SignetService {
    type Response = http::Response<SignetBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let (parts, incoming) = req.into_parts();

            let body = match read_body(incoming, MAX_BODY_BYTES, &request_id).await {
                Ok(body) => body,
                Err(response) => return Ok(add_common_headers(response, &request_id)),
            };

            let response = route(&service, &parts, &body, Utc::now(), &request_id);
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Collect at most `limit` bytes of `body`.
async fn read_body<B>(
    body: B,
    limit: usize,
    request_id: &str,
) -> Result<Bytes, http::Response<SignetBody>>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => {
            warn!(limit, request_id, "request body too large");
            Err(text_response(
                http::StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large",
            ))
        }
        Err(e) => {
            warn!(error = %e, request_id, "failed to read request body");
            Err(text_response(http::StatusCode::BAD_REQUEST, "Invalid body"))
        }
    }
}

/// Dispatch a fully-read request to its handler.
pub fn route(
    service: &SignetService,
    parts: &http::request::Parts,
    body: &[u8],
    now: DateTime<Utc>,
    request_id: &str,
) -> http::Response<SignetBody> {
    let method = &parts.method;
    let path = parts.uri.path();
    debug!(%method, path, request_id, "processing request");

    if is_health_check(method, path) {
        return health_check_response();
    }

    if *method == http::Method::GET && path == SERVER_TIME_PATH {
        return text_response(http::StatusCode::OK, server_time(now));
    }

    if *method == http::Method::GET && path == SIGN_PATH {
        return match service.signer.as_deref() {
            Some(signer) => sign_response(signer, service.variant, parts, now, request_id),
            None => {
                debug!(request_id, "signing endpoint disabled");
                text_response(http::StatusCode::NOT_FOUND, "Not Found")
            }
        };
    }

    let request = SigningRequest::from_parts(parts, body);
    match service.verifier.verify_request(&request, now) {
        Ok(result) => {
            info!(
                access_key_id = %result.access_key_id,
                variant = %result.variant,
                request_id,
                "request signature verified"
            );
            json_response(
                http::StatusCode::OK,
                &serde_json::json!({
                    "accessKeyId": result.access_key_id,
                    "variant": result.variant.to_string(),
                }),
            )
        }
        Err(e) => access_denied(&e, request_id),
    }
}

/// Sign the `to_sign` query parameter.
fn sign_response(
    engine: &SigningEngine,
    variant: SignatureVariant,
    parts: &http::request::Parts,
    now: DateTime<Utc>,
    request_id: &str,
) -> http::Response<SignetBody> {
    let query = parse_query(parts.uri.query().unwrap_or(""));
    let param = |name: &str| {
        query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    };

    let Some(to_sign) = param("to_sign") else {
        return text_response(http::StatusCode::BAD_REQUEST, "Missing to_sign parameter");
    };

    match engine.sign(to_sign, variant, param("access_key"), now) {
        Ok(token) => {
            info!(%variant, request_id, "signed string to sign");
            text_response(http::StatusCode::OK, token)
        }
        Err(e) => access_denied(&e, request_id),
    }
}

/// Format `now` as an RFC 1123 date.
fn server_time(now: DateTime<Utc>) -> String {
    now.format(RFC1123_FORMAT).to_string()
}

/// The uniform rejection for every signature error.
fn access_denied(err: &SignatureError, request_id: &str) -> http::Response<SignetBody> {
    // The precise cause stays in the log.
    warn!(error = %err, kind = err.kind(), request_id, "signature rejected");
    json_response(
        err.status_code(),
        &serde_json::json!({
            "error": "AccessDenied",
            "message": err.public_message(),
        }),
    )
}

/// Check if the request is a health check.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && (path == "/_health" || path == "/health")
}

fn health_check_response() -> http::Response<SignetBody> {
    json_response(
        http::StatusCode::OK,
        &serde_json::json!({ "status": "running" }),
    )
}

fn text_response(
    status: http::StatusCode,
    body: impl Into<String>,
) -> http::Response<SignetBody> {
    let mut response = http::Response::new(Full::new(Bytes::from(body.into())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn json_response(status: http::StatusCode, body: &serde_json::Value) -> http::Response<SignetBody> {
    let mut response = http::Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<SignetBody>,
    request_id: &str,
) -> http::Response<SignetBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.insert("x-request-id", hv);
    }

    headers.insert("Server", http::HeaderValue::from_static("Signet"));

    // Browsers call the signing endpoint directly.
    headers.insert(
        "Access-Control-Allow-Origin",
        http::HeaderValue::from_static("*"),
    );

    response
}
