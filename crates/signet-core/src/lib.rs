//! Core configuration and error types for Signet.
//!
//! This crate provides the building blocks shared by the signature core and
//! the host server: environment-driven configuration, the signature version
//! selector, and the infrastructure error type.

mod config;
mod error;
mod types;

pub use config::SignetConfig;
pub use error::{SignetError, SignetResult};
pub use types::SignatureVersion;
