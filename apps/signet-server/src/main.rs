//! Signet Server - request-signature signing and verification over HTTP.
//!
//! Signed requests sent to any path are verified and answered with the
//! signer's access key. With `SIGN_AUTH_ENABLED` set, browsers and other
//! clients that must not hold a secret can also send their string to sign to
//! `/sign_auth` and receive the signature.
//!
//! `/sign_auth` signs whatever it is given, so its credential is separate
//! from the verifying one and startup fails if the two secrets are equal.
//! Never point the verify route at a credential the signing endpoint holds.
//!
//! # Usage
//!
//! ```text
//! SECRET_KEY=... GATEWAY_LISTEN=0.0.0.0:4577 signet-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:4577` | Bind address |
//! | `SIGNATURE_VERSION` | `4` | Variant used by `/sign_auth` (`2` or `4`) |
//! | `SKEW_FORWARD_SECS` | `900` | Accepted forward clock skew |
//! | `SKEW_BACKWARD_SECS` | `604800` | Accepted backward clock skew |
//! | `ACCESS_KEY` / `AWS_ACCESS_KEY_ID` | *(unset)* | Access key ID |
//! | `SECRET_KEY` / `AWS_SECRET_ACCESS_KEY` | *(unset)* | Secret |
//! | `SIGN_AUTH_ENABLED` | `false` | Serve `/sign_auth` |
//! | `SIGNING_ACCESS_KEY` | *(unset)* | Access key ID for `/sign_auth` |
//! | `SIGNING_SECRET_KEY` | *(unset)* | Secret for `/sign_auth`; required when enabled |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod service;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use signet_auth::{
    SecretProvider, SignatureVariant, SigningEngine, SkewWindow, StaticSecretProvider,
    VerifierConfig,
};
use signet_core::SignetConfig;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::service::SignetService;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

fn verifying_secret(lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    lookup("SECRET_KEY").or_else(|| lookup("AWS_SECRET_ACCESS_KEY"))
}

/// Build the verifying secret provider from `ACCESS_KEY` / `SECRET_KEY` (or
/// their `AWS_*` equivalents).
///
/// With both set, only requests signed under that access key resolve the
/// secret. With only the secret set, it answers every lookup.
fn build_secret_provider(lookup: impl Fn(&str) -> Option<String>) -> Arc<dyn SecretProvider> {
    let access_key = lookup("ACCESS_KEY").or_else(|| lookup("AWS_ACCESS_KEY_ID"));
    let secret_key = verifying_secret(&lookup);

    match (access_key, secret_key) {
        (Some(access_key), Some(secret_key)) => {
            info!(
                access_key = %access_key,
                "configured secret provider from environment"
            );
            Arc::new(StaticSecretProvider::new(vec![(access_key, secret_key)]))
        }
        (None, Some(secret_key)) => {
            info!("configured shared secret from environment");
            Arc::new(StaticSecretProvider::single(secret_key))
        }
        (_, None) => {
            warn!("no secret configured; every signature check will be rejected");
            Arc::new(StaticSecretProvider::default())
        }
    }
}

/// Build the `/sign_auth` secret provider from `SIGNING_ACCESS_KEY` /
/// `SIGNING_SECRET_KEY`.
///
/// The signing secret also answers lookups with no or an unknown access key.
fn build_signing_provider(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Arc<dyn SecretProvider>> {
    let Some(signing_secret) = lookup("SIGNING_SECRET_KEY") else {
        anyhow::bail!("SIGN_AUTH_ENABLED requires SIGNING_SECRET_KEY");
    };

    if verifying_secret(&lookup).as_deref() == Some(signing_secret.as_str()) {
        anyhow::bail!("SIGNING_SECRET_KEY must differ from the verifying SECRET_KEY");
    }

    let provider = match lookup("SIGNING_ACCESS_KEY") {
        Some(access_key) => {
            info!(access_key = %access_key, "configured signing credential from environment");
            StaticSecretProvider::new(vec![(access_key, signing_secret.clone())])
                .with_fallback(signing_secret)
        }
        None => {
            info!("configured shared signing secret from environment");
            StaticSecretProvider::single(signing_secret)
        }
    };

    Ok(Arc::new(provider))
}

/// Build a signing engine from the configuration and a secret provider.
fn build_engine(config: &SignetConfig, secret_provider: Arc<dyn SecretProvider>) -> SigningEngine {
    let skew = SkewWindow::from_secs(config.skew_forward_secs, config.skew_backward_secs);
    SigningEngine::new(VerifierConfig::new(secret_provider).with_skew(skew))
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: SignetService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Perform a health check by connecting to the server and requesting the health endpoint.
///
/// Exits with code 0 if healthy, 1 otherwise.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /_health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = SignetConfig::from_env().context("invalid configuration")?;

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level)?;

    let variant = SignatureVariant::from(config.signature_version);

    info!(
        gateway_listen = %config.gateway_listen,
        %variant,
        skew_forward_secs = config.skew_forward_secs,
        skew_backward_secs = config.skew_backward_secs,
        sign_auth_enabled = config.sign_auth_enabled,
        version = VERSION,
        "starting Signet Server",
    );

    let env = |name: &str| std::env::var(name).ok();
    let verifier = build_engine(&config, build_secret_provider(env));
    let signer = if config.sign_auth_enabled {
        let provider = build_signing_provider(env).context("invalid signing credential")?;
        warn!("signing endpoint enabled; it signs any string it is sent");
        Some(build_engine(&config, provider))
    } else {
        None
    };
    let service = SignetService::new(verifier, signer, variant);

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}
