//! Error types for the CloudStack client
//!
//! CloudStack reports failures with an HTTP status plus an `errorcode` /
//! `errortext` pair inside the `<command>response` object. Those codes are
//! mapped onto [`CloudStackError`] variants so callers can branch on the kind
//! of failure without parsing messages.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by the CloudStack client
#[derive(Error, Debug)]
pub enum CloudStackError {
    /// Credentials rejected or signature mismatch (401 / 432)
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// A parameter was missing or invalid (431)
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// API request limit exceeded (429)
    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    /// Capacity or resource allocation problems (533, 534, 535)
    #[error("Resource unavailable ({code}): {message}")]
    ResourceUnavailable { code: u16, message: String },

    /// Resource is in use by another object (536)
    #[error("Resource in use: {message}")]
    ResourceInUse { message: String },

    /// Conflicting network rule (537)
    #[error("Network rule conflict: {message}")]
    NetworkRuleConflict { message: String },

    /// Internal server error (530 or a plain 5xx)
    #[error("Server error ({code}): {message}")]
    ServerError { code: u16, message: String },

    /// Any other API-level error
    #[error("API error {code}: {message}")]
    Api {
        code: u16,
        cs_error_code: Option<i64>,
        message: String,
    },

    /// An async job finished with a failure status
    #[error("Async job {job_id} failed ({code}): {message}")]
    JobFailed {
        job_id: String,
        code: i64,
        message: String,
    },

    /// An async job did not finish in time
    #[error("Async job {job_id} did not complete within {timeout:?}")]
    JobTimeout { job_id: String, timeout: Duration },

    /// A lookup by name or id matched nothing
    #[error("No {kind} found matching '{name}'")]
    NotFound { kind: &'static str, name: String },

    /// A lookup by name matched more than one object
    #[error("Found {count} {kind}s matching '{name}', expected exactly one")]
    Ambiguous {
        kind: &'static str,
        name: String,
        count: usize,
    },

    /// Could not reach the API endpoint
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Transport-level failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Client misconfiguration (missing URL, key or secret)
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for CloudStack operations
pub type Result<T> = std::result::Result<T, CloudStackError>;

impl From<serde_json::Error> for CloudStackError {
    fn from(err: serde_json::Error) -> Self {
        CloudStackError::Decode(err.to_string())
    }
}

impl CloudStackError {
    /// Map a CloudStack `errorcode` and `errortext` onto an error variant.
    ///
    /// `code` is CloudStack's own error code, which usually matches the HTTP
    /// status of the response.
    pub fn from_api(code: u16, cs_error_code: Option<i64>, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            401 | 432 => CloudStackError::AuthenticationFailed { message },
            429 => CloudStackError::RateLimited { message },
            431 => CloudStackError::InvalidParameter { message },
            533..=535 => CloudStackError::ResourceUnavailable { code, message },
            536 => CloudStackError::ResourceInUse { message },
            537 => CloudStackError::NetworkRuleConflict { message },
            530 | 500..=529 | 538..=599 => CloudStackError::ServerError { code, message },
            _ => CloudStackError::Api {
                code,
                cs_error_code,
                message,
            },
        }
    }

    /// Returns true if a lookup failed or CloudStack reported a missing object
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            CloudStackError::NotFound { .. } => true,
            CloudStackError::InvalidParameter { message }
            | CloudStackError::Api { message, .. } => {
                let lower = message.to_lowercase();
                lower.contains("unable to find") || lower.contains("does not exist")
            }
            _ => false,
        }
    }

    /// Returns true for authentication or signature failures
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CloudStackError::AuthenticationFailed { .. })
    }

    /// Returns true when the API limit was hit
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CloudStackError::RateLimited { .. })
    }

    /// Returns true for server-side failures
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        match self {
            CloudStackError::ServerError { .. } | CloudStackError::ResourceUnavailable { .. } => {
                true
            }
            CloudStackError::Request(e) => e.status().is_some_and(|s| s.is_server_error()),
            _ => false,
        }
    }

    /// Returns true for request or job timeouts
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CloudStackError::JobTimeout { .. } => true,
            CloudStackError::Request(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns true if the target is busy or conflicts with existing state
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CloudStackError::ResourceInUse { .. } | CloudStackError::NetworkRuleConflict { .. }
        )
    }

    /// Returns true if the request itself was malformed
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            CloudStackError::InvalidParameter { .. } | CloudStackError::Config(_)
        )
    }

    /// Returns true if retrying the same request may succeed
    ///
    /// CloudStack's 53x codes describe the state of the cloud rather than a
    /// transient fault, so only plain server errors, rate limiting and
    /// transport failures qualify.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CloudStackError::RateLimited { .. } | CloudStackError::ConnectionError(_) => true,
            CloudStackError::ServerError { code, .. } => *code != 530,
            CloudStackError::Request(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            _ => false,
        }
    }
}
