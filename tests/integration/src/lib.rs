//! Integration tests for Signet server.
//!
//! These tests require a running server at `localhost:4577` started with
//! `ACCESS_KEY=test SECRET_KEY=test SIGN_AUTH_ENABLED=true
//! SIGNING_SECRET_KEY=signing-test` and the default `SIGNATURE_VERSION=4`.
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p signet-integration -- --ignored
//! ```

use std::sync::{Arc, Once};

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use signet_auth::{SigningEngine, StaticSecretProvider, VerifierConfig};

/// Access key the server under test is configured with.
pub const ACCESS_KEY: &str = "test";

/// Secret the server under test verifies with.
pub const SECRET_KEY: &str = "test";

/// Secret the server under test signs `/sign_auth` requests with.
pub const SIGNING_SECRET_KEY: &str = "signing-test";

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("SIGNET_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4577".to_owned())
}

/// Create a plain HTTP client.
#[must_use]
pub fn http_client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

/// Create an S3 client that signs its requests with the given credentials
/// and sends them to the local server.
#[must_use]
pub fn s3_client(access_key: &str, secret_key: &str) -> aws_sdk_s3::Client {
    init_tracing();

    let creds = Credentials::new(access_key, secret_key, None, None, "integration-test");

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(endpoint_url())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// An engine holding the same signing secret as the server under test, used
/// to compute expected `/sign_auth` signatures locally.
#[must_use]
pub fn local_engine() -> SigningEngine {
    SigningEngine::new(VerifierConfig::new(Arc::new(StaticSecretProvider::single(
        SIGNING_SECRET_KEY,
    ))))
}

/// Build a scoped string to sign for `at`, over an arbitrary canonical request.
#[must_use]
pub fn scoped_string_to_sign(at: DateTime<Utc>, canonical_request: &str) -> String {
    format!(
        "AWS4-HMAC-SHA256\n{}\n{}/us-east-1/s3/aws4_request\n{}",
        at.format("%Y%m%dT%H%M%SZ"),
        at.format("%Y%m%d"),
        hex::encode(Sha256::digest(canonical_request.as_bytes())),
    )
}

/// Generate a unique object key for a test.
#[must_use]
pub fn test_key(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

mod test_server_time;
mod test_sign;
mod test_verify;
