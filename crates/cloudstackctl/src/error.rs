//! Error types for cloudstackctl
//!
//! Every failure is turned into a [`CloudStackCtlError`] before it reaches
//! `main`, which prints it as a diagnostic with tips.

use cloudstack::CloudStackError;
use cloudstackctl_core::{ConfigError, CoreError};
use colored::Colorize;
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Profile 'lab' not found
///
///   tip: List available profiles: cloudstackctl profile list
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<String>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip.
    pub fn tip(mut self, description: &str) -> Self {
        self.tips.push(description.to_string());
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for tip in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", tip);
        }
    }
}

/// Main error type for the cloudstackctl application
#[derive(Error, Debug)]
pub enum CloudStackCtlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. Use 'cloudstackctl profile set' to configure a profile.")]
    NoProfileConfigured,

    #[error("Missing credentials for profile '{name}': {message}")]
    MissingCredentials { name: String, message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("{message}")]
    ApiError { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("File error for '{path}': {message}")]
    FileError { path: String, message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Job {job_id} failed ({code}): {message}")]
    JobFailed {
        job_id: String,
        code: i64,
        message: String,
    },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for cloudstackctl operations
pub type Result<T> = std::result::Result<T, CloudStackCtlError>;

impl CloudStackCtlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            CloudStackCtlError::ProfileNotFound { name } => vec![
                "List available profiles: cloudstackctl profile list".to_string(),
                format!(
                    "Create profile '{}': cloudstackctl profile set {} --api-url <url> --api-key <key>",
                    name, name
                ),
            ],
            CloudStackCtlError::NoProfileConfigured => vec![
                "Create a profile: cloudstackctl profile set lab --api-url https://cloud.example.com/client/api --api-key <key>".to_string(),
                "Or set CLOUDSTACK_API_URL, CLOUDSTACK_API_KEY and CLOUDSTACK_SECRET_KEY".to_string(),
            ],
            CloudStackCtlError::MissingCredentials { name, .. } => vec![
                format!("Update profile credentials: cloudstackctl profile set {}", name),
                format!("Check profile details: cloudstackctl profile show {}", name),
            ],
            CloudStackCtlError::AuthenticationFailed { .. } => vec![
                "Check that the API key and secret key belong to the same user".to_string(),
                "Check the clock of this machine if signed requests carry an expiry".to_string(),
                "Validate the profile: cloudstackctl profile validate".to_string(),
            ],
            CloudStackCtlError::ConnectionError { message }
                if message.contains("certificate") || message.contains("SSL") =>
            {
                vec![
                    "For self-signed certificates, set the profile to insecure: cloudstackctl profile set <name> --insecure".to_string(),
                ]
            }
            CloudStackCtlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the API URL: cloudstackctl profile show <profile>".to_string(),
            ],
            CloudStackCtlError::NotFound { .. } => vec![
                "List the resources to find the correct name or id".to_string(),
                "Check that you're using the correct profile".to_string(),
            ],
            CloudStackCtlError::Timeout { .. } => vec![
                "The job may still be running: cloudstackctl job get <job-id>".to_string(),
                "Wait longer with --wait-timeout".to_string(),
            ],
            CloudStackCtlError::InvalidInput { .. } => vec![
                "Check the command syntax: cloudstackctl <command> --help".to_string(),
            ],
            CloudStackCtlError::FileError { path, .. } => vec![
                format!("Check that file exists: {}", path),
                "Verify file permissions are correct".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());

        if let CloudStackCtlError::JobFailed { job_id, .. } = self {
            diag = diag.detail(&format!("Inspect the job: cloudstackctl job get {}", job_id));
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion);
        }

        diag.print();
    }
}

impl From<CloudStackError> for CloudStackCtlError {
    fn from(err: CloudStackError) -> Self {
        match err {
            CloudStackError::AuthenticationFailed { message } => {
                CloudStackCtlError::AuthenticationFailed { message }
            }
            CloudStackError::ConnectionError(message) => {
                CloudStackCtlError::ConnectionError { message }
            }
            CloudStackError::Request(e) if e.is_connect() || e.is_timeout() => {
                CloudStackCtlError::ConnectionError {
                    message: e.to_string(),
                }
            }
            CloudStackError::InvalidParameter { message } => {
                CloudStackCtlError::InvalidInput { message }
            }
            CloudStackError::Config(message) => CloudStackCtlError::Configuration(message),
            CloudStackError::JobFailed {
                job_id,
                code,
                message,
            } => CloudStackCtlError::JobFailed {
                job_id,
                code,
                message,
            },
            CloudStackError::JobTimeout { job_id, timeout } => CloudStackCtlError::Timeout {
                message: format!(
                    "job {} still pending after {} seconds",
                    job_id,
                    timeout.as_secs()
                ),
            },
            err @ (CloudStackError::NotFound { .. } | CloudStackError::Ambiguous { .. }) => {
                CloudStackCtlError::NotFound {
                    message: err.to_string(),
                }
            }
            _ => CloudStackCtlError::ApiError {
                message: err.to_string(),
            },
        }
    }
}

impl From<CoreError> for CloudStackCtlError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Api(api_err) => CloudStackCtlError::from(api_err),
            CoreError::JobTimeout { job_id, timeout } => CloudStackCtlError::Timeout {
                message: format!(
                    "job {} still pending after {} seconds",
                    job_id,
                    timeout.as_secs()
                ),
            },
            CoreError::JobFailed {
                job_id,
                code,
                message,
            } => CloudStackCtlError::JobFailed {
                job_id,
                code,
                message,
            },
            CoreError::Validation(message) => CloudStackCtlError::InvalidInput { message },
            CoreError::Config(message) => CloudStackCtlError::Configuration(message),
        }
    }
}

impl From<ConfigError> for CloudStackCtlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => CloudStackCtlError::ProfileNotFound { name },
            ConfigError::NoProfiles { .. } => CloudStackCtlError::NoProfileConfigured,
            ConfigError::MissingField { profile, .. } => CloudStackCtlError::MissingCredentials {
                message: err_message(&profile),
                name: profile,
            },
            other => CloudStackCtlError::Configuration(other.to_string()),
        }
    }
}

fn err_message(profile: &str) -> String {
    format!("profile '{}' has no usable API URL, API key or secret key", profile)
}

impl From<serde_json::Error> for CloudStackCtlError {
    fn from(err: serde_json::Error) -> Self {
        CloudStackCtlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for CloudStackCtlError {
    fn from(err: std::io::Error) -> Self {
        CloudStackCtlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for CloudStackCtlError {
    fn from(err: anyhow::Error) -> Self {
        CloudStackCtlError::OutputError {
            message: format!("{:#}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_auth_error_has_tips() {
        let err: CloudStackCtlError =
            CloudStackError::from_api(401, None, "unable to verify user credentials").into();
        assert!(matches!(err, CloudStackCtlError::AuthenticationFailed { .. }));
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn test_lookup_errors_become_not_found() {
        let err: CloudStackCtlError = CloudStackError::NotFound {
            kind: "zone",
            name: "zone9".to_string(),
        }
        .into();
        assert!(matches!(err, CloudStackCtlError::NotFound { .. }));
        assert!(err.to_string().contains("zone9"));

        let err: CloudStackCtlError = CloudStackError::Ambiguous {
            kind: "template",
            name: "ubuntu".to_string(),
            count: 2,
        }
        .into();
        assert!(matches!(err, CloudStackCtlError::NotFound { .. }));
    }

    #[test]
    fn test_core_job_errors_map_through() {
        let err: CloudStackCtlError = CoreError::JobTimeout {
            job_id: "job-1".to_string(),
            timeout: Duration::from_secs(300),
        }
        .into();
        assert!(err.to_string().contains("300 seconds"));

        let err: CloudStackCtlError = CoreError::JobFailed {
            job_id: "job-2".to_string(),
            code: 530,
            message: "Insufficient capacity".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Job job-2 failed (530): Insufficient capacity");
    }

    #[test]
    fn test_config_errors_map_to_profile_variants() {
        let err: CloudStackCtlError = ConfigError::ProfileNotFound {
            name: "lab".to_string(),
        }
        .into();
        assert!(matches!(err, CloudStackCtlError::ProfileNotFound { ref name } if name == "lab"));

        let err: CloudStackCtlError = ConfigError::MissingField {
            profile: "lab".to_string(),
            field: "api_key",
        }
        .into();
        assert!(matches!(err, CloudStackCtlError::MissingCredentials { .. }));
    }
}
