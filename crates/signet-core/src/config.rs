//! Configuration management for Signet.
//!
//! All configuration is driven by environment variables. Secrets are not part
//! of this struct; the server resolves them separately so they never end up in
//! a serialized or logged config.

use crate::error::{SignetError, SignetResult};
use crate::types::SignatureVersion;

/// Default forward clock skew: 15 minutes.
const DEFAULT_SKEW_FORWARD_SECS: u64 = 15 * 60;

/// Default backward clock skew: 7 days.
const DEFAULT_SKEW_BACKWARD_SECS: u64 = 7 * 24 * 60 * 60;

/// Global configuration for Signet.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignetConfig {
    /// Bind address for the server.
    pub gateway_listen: String,
    /// Log level.
    pub log_level: String,
    /// Signature version used by the signing endpoint.
    pub signature_version: SignatureVersion,
    /// How far in the future (seconds) a signature's date may lie.
    pub skew_forward_secs: u64,
    /// How far in the past (seconds) a signature's date may lie.
    pub skew_backward_secs: u64,
    /// Whether the signing endpoint is served.
    pub sign_auth_enabled: bool,
}

impl Default for SignetConfig {
    fn default() -> Self {
        Self {
            gateway_listen: "0.0.0.0:4577".to_owned(),
            log_level: "info".to_owned(),
            signature_version: SignatureVersion::default(),
            skew_forward_secs: DEFAULT_SKEW_FORWARD_SECS,
            skew_backward_secs: DEFAULT_SKEW_BACKWARD_SECS,
            sign_auth_enabled: false,
        }
    }
}

impl SignetConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`SignetError::Config`] if a numeric or boolean variable does not
    /// parse, or [`SignetError::InvalidSignatureVersion`] for an unknown version.
    pub fn from_env() -> SignetResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`SignetConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SignetResult<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("SIGNATURE_VERSION") {
            config.signature_version = v.parse()?;
        }
        if let Some(v) = lookup("SKEW_FORWARD_SECS") {
            config.skew_forward_secs = parse_secs("SKEW_FORWARD_SECS", &v)?;
        }
        if let Some(v) = lookup("SKEW_BACKWARD_SECS") {
            config.skew_backward_secs = parse_secs("SKEW_BACKWARD_SECS", &v)?;
        }
        if let Some(v) = lookup("SIGN_AUTH_ENABLED") {
            config.sign_auth_enabled = parse_flag("SIGN_AUTH_ENABLED", &v)?;
        }

        Ok(config)
    }
}

fn parse_secs(name: &str, value: &str) -> SignetResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| SignetError::Config(format!("{name} must be a number of seconds, got {value:?}")))
}

fn parse_flag(name: &str, value: &str) -> SignetResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(SignetError::Config(format!(
            "{name} must be true or false, got {value:?}"
        ))),
    }
}
