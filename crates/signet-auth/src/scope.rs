//! Credential scope extraction and validity-window checks.
//!
//! A scoped string to sign has a fixed line layout:
//!
//! ```text
//! AWS4-HMAC-SHA256\n          <- line 0: algorithm
//! 20230101T120000Z\n          <- line 1: timestamp
//! 20230101/us-east-1/s3/aws4_request\n   <- line 2: scope
//! <hex(SHA256(canonical_request))>       <- line 3
//! ```
//!
//! The scope is located by position: line [`SCOPE_LINE_INDEX`], split on `/`.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

use crate::error::SignatureError;
use crate::variant::SignatureVariant;

/// Line of the string to sign holding the credential scope.
pub const SCOPE_LINE_INDEX: usize = 2;

/// Line of the string to sign holding the request timestamp.
pub const TIMESTAMP_LINE_INDEX: usize = 1;

/// Format of the scope date (`YYYYMMDD`).
pub const SCOPE_DATE_FORMAT: &str = "%Y%m%d";

/// Format of the request timestamp (`YYYYMMDDTHHMMSSZ`).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Skew settings are clamped to 100 years to keep date arithmetic in range.
const MAX_SKEW_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// The contextual fields narrowing what a derived key is valid for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    /// UTC calendar date, `YYYYMMDD`.
    pub date: String,
    /// Region name.
    pub region: String,
    /// Service name.
    pub service: String,
    /// Scope terminator, e.g. `aws4_request`.
    pub request_type: String,
}

impl Scope {
    /// Create a scope from its four fields.
    pub fn new(
        date: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
        request_type: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            region: region.into(),
            service: service.into(),
            request_type: request_type.into(),
        }
    }

    /// Parse a `date/region/service/request_type` string.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidScope`] unless there are exactly four
    /// non-empty components.
    pub fn parse(scope: &str) -> Result<Self, SignatureError> {
        let parts: Vec<&str> = scope.split('/').collect();
        let [date, region, service, request_type] = parts.as_slice() else {
            return Err(SignatureError::InvalidScope(format!(
                "expected 4 components, found {}",
                parts.len()
            )));
        };

        if parts.iter().any(|p| p.is_empty()) {
            return Err(SignatureError::InvalidScope("empty scope component".to_owned()));
        }

        Ok(Self::new(*date, *region, *service, *request_type))
    }

    /// The scope date as a calendar date.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidScope`] if the date is not eight digits
    /// forming a valid `YYYYMMDD` date.
    pub fn date_stamp(&self) -> Result<NaiveDate, SignatureError> {
        if self.date.len() != 8 || !self.date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SignatureError::InvalidScope(format!(
                "date {:?} is not YYYYMMDD",
                self.date
            )));
        }

        NaiveDate::parse_from_str(&self.date, SCOPE_DATE_FORMAT)
            .map_err(|_| SignatureError::InvalidScope(format!("date {:?} does not exist", self.date)))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.date, self.region, self.service, self.request_type
        )
    }
}

/// Tolerance around the current time within which a signature is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkewWindow {
    /// How far in the future a signature's date may lie.
    pub forward: TimeDelta,
    /// How far in the past a signature's date may lie.
    pub backward: TimeDelta,
}

impl Default for SkewWindow {
    /// 15 minutes forward, 7 days backward.
    fn default() -> Self {
        Self {
            forward: TimeDelta::minutes(15),
            backward: TimeDelta::days(7),
        }
    }
}

impl SkewWindow {
    /// Build a window from second counts, as found in configuration.
    #[must_use]
    pub fn from_secs(forward: u64, backward: u64) -> Self {
        Self {
            forward: clamp_secs(forward),
            backward: clamp_secs(backward),
        }
    }
}

fn clamp_secs(secs: u64) -> TimeDelta {
    let secs = i64::try_from(secs.min(MAX_SKEW_SECS)).unwrap_or_default();
    TimeDelta::seconds(secs)
}

/// Extract the credential scope from line [`SCOPE_LINE_INDEX`] of a string to sign.
///
/// # Errors
///
/// Returns [`SignatureError::MalformedInput`] if the string has too few lines
/// and [`SignatureError::InvalidScope`] if the scope line is malformed.
///
/// # Examples
///
/// ```
/// use signet_auth::scope::{Scope, extract_scope};
///
/// let scope = extract_scope("GET\n/\n20230101/us-east-1/s3/aws4_request\nhash").unwrap();
/// assert_eq!(scope, Scope::new("20230101", "us-east-1", "s3", "aws4_request"));
/// ```
pub fn extract_scope(string_to_sign: &str) -> Result<Scope, SignatureError> {
    let line = string_to_sign
        .split('\n')
        .nth(SCOPE_LINE_INDEX)
        .ok_or_else(|| {
            SignatureError::MalformedInput(format!("no scope at line {SCOPE_LINE_INDEX}"))
        })?;

    Scope::parse(line)
}

/// Check that `now` falls within the scope date, widened by the skew window.
///
/// The scope date covers `[date 00:00Z, date+1 00:00Z)`. The signature is
/// rejected when `now` is more than `window.forward` before that range or
/// more than `window.backward` after it.
///
/// # Errors
///
/// Returns [`SignatureError::InvalidScope`] if the date does not parse and
/// [`SignatureError::ExpiredSignature`] if `now` is outside the window.
pub fn validate(scope: &Scope, now: DateTime<Utc>, window: &SkewWindow) -> Result<(), SignatureError> {
    let day_start = scope
        .date_stamp()?
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| SignatureError::InvalidScope("date has no midnight".to_owned()))?
        .and_utc();
    let day_end = day_start + TimeDelta::days(1);

    if now < day_start - window.forward || now >= day_end + window.backward {
        return Err(SignatureError::ExpiredSignature);
    }

    Ok(())
}

/// Check the scope fields that depend on the variant: the terminator must be
/// the variant's, and region and service must be free of whitespace.
///
/// # Errors
///
/// Returns [`SignatureError::InvalidScope`] on any violation.
pub fn validate_terminator(scope: &Scope, variant: SignatureVariant) -> Result<(), SignatureError> {
    if let Some(terminator) = variant.scope_terminator() {
        if scope.request_type != terminator {
            return Err(SignatureError::InvalidScope(format!(
                "request type must be {terminator}"
            )));
        }
    }

    if [&scope.region, &scope.service]
        .iter()
        .any(|field| field.chars().any(char::is_whitespace))
    {
        return Err(SignatureError::InvalidScope(
            "region and service must not contain whitespace".to_owned(),
        ));
    }

    Ok(())
}

/// Read the timestamp at line [`TIMESTAMP_LINE_INDEX`] of a scoped string to sign.
///
/// # Errors
///
/// Returns [`SignatureError::MalformedInput`] if the line is absent or not a
/// `YYYYMMDDTHHMMSSZ` timestamp.
pub fn extract_timestamp(string_to_sign: &str) -> Result<DateTime<Utc>, SignatureError> {
    let line = string_to_sign
        .split('\n')
        .nth(TIMESTAMP_LINE_INDEX)
        .ok_or_else(|| SignatureError::MalformedInput("no timestamp line".to_owned()))?;

    parse_timestamp(line)
}

/// Parse a `YYYYMMDDTHHMMSSZ` timestamp.
///
/// # Errors
///
/// Returns [`SignatureError::MalformedInput`] if the value does not parse.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, SignatureError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|_| SignatureError::MalformedInput(format!("invalid timestamp {value:?}")))
}

/// Check a request timestamp against its scope and the current time.
///
/// The timestamp must fall on the scope date, must not be more than
/// `window.forward` ahead of `now` nor more than `window.backward` behind it,
/// and, for presigned requests, `now` must not be past `timestamp + expires`.
///
/// # Errors
///
/// Returns [`SignatureError::InvalidScope`] if the dates disagree and
/// [`SignatureError::ExpiredSignature`] if the timestamp is out of range.
pub fn validate_timestamp(
    timestamp: DateTime<Utc>,
    scope: &Scope,
    now: DateTime<Utc>,
    window: &SkewWindow,
    expires: Option<u64>,
) -> Result<(), SignatureError> {
    if timestamp.date_naive() != scope.date_stamp()? {
        return Err(SignatureError::InvalidScope(
            "timestamp date does not match scope date".to_owned(),
        ));
    }

    if timestamp - window.forward > now || now > timestamp + window.backward {
        return Err(SignatureError::ExpiredSignature);
    }

    if let Some(expires) = expires {
        if now > timestamp + clamp_secs(expires) {
            return Err(SignatureError::ExpiredSignature);
        }
    }

    Ok(())
}
