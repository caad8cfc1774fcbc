//! Unified error handling for cloudstackctl-core
//!
//! Wraps CloudStack API errors and adds the failure modes of multi-step
//! workflows, with the same helper predicates as the API error.
//!
//! # Example
//!
//! ```rust
//! use cloudstack::CloudStackError;
//! use cloudstackctl_core::CoreError;
//!
//! fn handle_error(err: CoreError) {
//!     if err.is_not_found() {
//!         println!("Resource not found");
//!     } else if err.is_retryable() {
//!         println!("Temporary error, can retry");
//!     }
//! }
//!
//! let api_err = CloudStackError::NotFound { kind: "zone", name: "zone9".to_string() };
//! let core_err: CoreError = api_err.into();
//! assert!(core_err.is_not_found());
//! ```

use crate::config::ConfigError;
use std::time::Duration;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// Error from the CloudStack API
    #[error("CloudStack API error: {0}")]
    Api(#[from] cloudstack::CloudStackError),

    /// Async job was still pending when the wait gave up
    #[error("Job {job_id} timed out after {timeout:?}")]
    JobTimeout { job_id: String, timeout: Duration },

    /// Async job finished with a failure
    #[error("Job {job_id} failed ({code}): {message}")]
    JobFailed {
        job_id: String,
        code: i64,
        message: String,
    },

    /// Validation error (e.g., a name that resolves to nothing usable)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}

impl CoreError {
    /// Lift job outcomes out of the API error so callers can match on them
    pub(crate) fn from_api(err: cloudstack::CloudStackError) -> Self {
        match err {
            cloudstack::CloudStackError::JobTimeout { job_id, timeout } => {
                CoreError::JobTimeout { job_id, timeout }
            }
            cloudstack::CloudStackError::JobFailed {
                job_id,
                code,
                message,
            } => CoreError::JobFailed {
                job_id,
                code,
                message,
            },
            other => CoreError::Api(other),
        }
    }

    /// Returns true if the resource or name lookup came back empty
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Returns true if the credentials were rejected
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_unauthorized(),
            _ => false,
        }
    }

    /// Returns true if this is a server-side error
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_server_error(),
            _ => false,
        }
    }

    /// Returns true if this is a timeout error
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_timeout(),
            CoreError::JobTimeout { .. } => true,
            _ => false,
        }
    }

    /// Returns true if the account hit the API rate limit
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_rate_limited(),
            _ => false,
        }
    }

    /// Returns true if the resource is in use or a rule conflicts
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_conflict(),
            _ => false,
        }
    }

    /// Returns true if a parameter was rejected
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_bad_request(),
            CoreError::Validation(_) => true,
            _ => false,
        }
    }

    /// Returns true if retrying the whole operation may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_retryable(),
            CoreError::JobTimeout { .. } => true,
            _ => false,
        }
    }
}
