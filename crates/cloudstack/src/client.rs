//! HTTP client for the CloudStack API
//!
//! [`CloudStackClient`] signs each request, sends it to the API endpoint and
//! unwraps the `<command>response` envelope CloudStack puts around every
//! result. Service handlers build on the typed helpers here:
//!
//! - [`CloudStackClient::request`] for commands returning a flat object
//! - [`CloudStackClient::request_object`] for commands wrapping one resource
//! - [`CloudStackClient::request_list`] for `list*` commands
//! - [`CloudStackClient::submit`] for async commands
//!
//! # Example
//!
//! ```rust,no_run
//! use cloudstack::{CloudStackClient, ZoneHandler};
//!
//! # async fn example() -> cloudstack::Result<()> {
//! let client = CloudStackClient::builder()
//!     .api_url("https://cloud.example.com/client/api")
//!     .api_key("my-api-key")
//!     .secret_key("my-secret-key")
//!     .build()?;
//!
//! let zones = ZoneHandler::new(client.clone()).list(Default::default()).await?;
//! for zone in zones {
//!     println!("{} {}", zone.id, zone.name);
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{CloudStackError, Result};
use crate::jobs::{AsyncJobHandler, PendingJob};
use crate::params::{ApiRequest, Params};
use crate::signer::Signer;
use crate::types::{JobSubmission, ListResponse};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default HTTP request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default time to wait for an async job
pub const DEFAULT_ASYNC_TIMEOUT: Duration = Duration::from_secs(300);

/// Default interval between async job polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Queries longer than this are sent as a POST body instead of a GET URL
pub const MAX_GET_QUERY_LEN: usize = 2048;

const DEFAULT_USER_AGENT: &str = concat!("cloudstack-rs/", env!("CARGO_PKG_VERSION"));

/// Retry behaviour for read-only commands
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for the exponential delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Builder for [`CloudStackClient`]
#[derive(Debug, Clone, Default)]
pub struct CloudStackClientBuilder {
    api_url: Option<String>,
    api_key: Option<String>,
    secret_key: Option<String>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    insecure: bool,
    async_timeout: Option<Duration>,
    poll_interval: Option<Duration>,
    retry: Option<RetryPolicy>,
}

impl CloudStackClientBuilder {
    /// API endpoint, e.g. `https://cloud.example.com/client/api`
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// API key of the calling user
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Secret key used to sign requests
    pub fn secret_key(mut self, secret: impl Into<String>) -> Self {
        self.secret_key = Some(secret.into());
        self
    }

    /// Override the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// HTTP request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Skip TLS certificate verification
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Default timeout when waiting for async jobs
    pub fn async_timeout(mut self, timeout: Duration) -> Self {
        self.async_timeout = Some(timeout);
        self
    }

    /// Default interval between async job polls
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Retry policy for read-only commands
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<CloudStackClient> {
        let api_url = self
            .api_url
            .ok_or_else(|| CloudStackError::Config("API URL is required".to_string()))?;
        let api_key = self
            .api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| CloudStackError::Config("API key is required".to_string()))?;
        let secret_key = self
            .secret_key
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CloudStackError::Config("secret key is required".to_string()))?;

        let parsed = url::Url::parse(&api_url)
            .map_err(|e| CloudStackError::Config(format!("invalid API URL '{}': {}", api_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CloudStackError::Config(format!(
                "API URL must use http or https: {}",
                api_url
            )));
        }

        let poll_interval = self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL);
        if poll_interval.is_zero() {
            return Err(CloudStackError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .user_agent(
                self.user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            )
            .danger_accept_invalid_certs(self.insecure)
            .build()?;

        Ok(CloudStackClient {
            inner: Arc::new(ClientInner {
                http,
                api_url: api_url.trim_end_matches(['?', '/']).to_string(),
                api_key,
                signer: Signer::new(secret_key),
                async_timeout: self.async_timeout.unwrap_or(DEFAULT_ASYNC_TIMEOUT),
                poll_interval,
                retry: self.retry.unwrap_or_default(),
            }),
        })
    }
}

#[derive(Debug)]
struct ClientInner {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    signer: Signer,
    async_timeout: Duration,
    poll_interval: Duration,
    retry: RetryPolicy,
}

/// Authenticated CloudStack API client
///
/// Cloning is cheap; handlers take their own clone.
#[derive(Debug, Clone)]
pub struct CloudStackClient {
    inner: Arc<ClientInner>,
}

impl CloudStackClient {
    /// Start building a client
    pub fn builder() -> CloudStackClientBuilder {
        CloudStackClientBuilder::default()
    }

    /// The API endpoint this client talks to
    pub fn api_url(&self) -> &str {
        &self.inner.api_url
    }

    /// Default async job timeout
    pub fn async_timeout(&self) -> Duration {
        self.inner.async_timeout
    }

    /// Default async job poll interval
    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    /// Handler for async job queries and polling
    pub fn jobs(&self) -> AsyncJobHandler {
        AsyncJobHandler::new(self.clone())
    }

    /// Execute a typed request and decode the unwrapped response
    pub async fn request<R, T>(&self, request: &R) -> Result<T>
    where
        R: ApiRequest,
        T: DeserializeOwned,
    {
        let value = self
            .execute(R::COMMAND, request.params(), R::PREFER_POST)
            .await?;
        decode(R::COMMAND, value)
    }

    /// Execute a typed request whose response wraps a single object under
    /// `key`, e.g. `{"network": {...}}`
    pub async fn request_object<R, T>(&self, request: &R, key: &str) -> Result<T>
    where
        R: ApiRequest,
        T: DeserializeOwned,
    {
        let mut value = self
            .execute(R::COMMAND, request.params(), R::PREFER_POST)
            .await?;
        let object = value.get_mut(key).map(Value::take).ok_or_else(|| {
            CloudStackError::Decode(format!("{} response has no '{}' field", R::COMMAND, key))
        })?;
        decode(R::COMMAND, object)
    }

    /// Execute a `list*` request; items are read from `key`
    pub async fn request_list<R, T>(&self, request: &R, key: &str) -> Result<ListResponse<T>>
    where
        R: ApiRequest,
        T: DeserializeOwned,
    {
        let value = self
            .execute(R::COMMAND, request.params(), R::PREFER_POST)
            .await?;
        decode_list(R::COMMAND, value, key)
    }

    /// Submit an async command and return a handle to its job
    ///
    /// `result_key` names the field of `jobresult` holding the final object;
    /// `None` decodes the whole `jobresult`.
    pub async fn submit<R, T>(
        &self,
        request: &R,
        result_key: Option<&'static str>,
    ) -> Result<PendingJob<T>>
    where
        R: ApiRequest,
        T: DeserializeOwned,
    {
        let submission: JobSubmission = self.request(request).await?;
        debug!(
            command = R::COMMAND,
            job_id = %submission.jobid,
            "Submitted async command"
        );
        Ok(PendingJob::new(
            self.clone(),
            R::COMMAND,
            submission,
            result_key,
        ))
    }

    /// Execute any command and return the unwrapped response
    ///
    /// Escape hatch for commands without a typed wrapper.
    pub async fn execute_raw(&self, command: &str, params: &Params) -> Result<Value> {
        self.execute(command, params, false).await
    }

    async fn execute(&self, command: &str, params: &Params, prefer_post: bool) -> Result<Value> {
        let retry = &self.inner.retry;
        let retryable_command = is_read_only(command);
        let mut attempt = 1;

        loop {
            match self.send(command, params, prefer_post).await {
                Ok(value) => return Ok(value),
                Err(e) if retryable_command && e.is_retryable() && attempt < retry.max_attempts => {
                    let delay = retry.backoff(attempt);
                    warn!(
                        command,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying after error: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send(&self, command: &str, params: &Params, prefer_post: bool) -> Result<Value> {
        trace!(command, ?params, "Building request");

        let query = self.inner.signer.signed_query(
            params
                .iter()
                .filter(|(k, _)| !matches!(*k, "command" | "response" | "apiKey" | "signature"))
                .chain([
                    ("command", command),
                    ("response", "json"),
                    ("apiKey", self.inner.api_key.as_str()),
                ]),
        );

        let use_post = prefer_post || query.len() > MAX_GET_QUERY_LEN;
        debug!(
            command,
            method = if use_post { "POST" } else { "GET" },
            "CloudStack API request"
        );

        let request = if use_post {
            self.inner
                .http
                .post(&self.inner.api_url)
                .header(
                    reqwest::header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(query)
        } else {
            self.inner
                .http
                .get(format!("{}?{}", self.inner.api_url, query))
        };

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                CloudStackError::ConnectionError(e.to_string())
            } else {
                CloudStackError::Request(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await?;
        trace!(command, status = status.as_u16(), body = %body, "CloudStack API response");

        let parsed: Option<Value> = serde_json::from_str(&body).ok();
        match parsed {
            Some(value) => unwrap_envelope(command, status.as_u16(), value),
            None if status.is_success() => Err(CloudStackError::Decode(format!(
                "{} returned a non-JSON body",
                command
            ))),
            None => Err(CloudStackError::from_api(
                status.as_u16(),
                None,
                if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                } else {
                    body
                },
            )),
        }
    }
}

fn is_read_only(command: &str) -> bool {
    let lower = command.to_ascii_lowercase();
    lower.starts_with("list") || lower.starts_with("get") || lower.starts_with("query")
}

/// Strip the `<command>response` envelope and turn embedded errors into
/// [`CloudStackError`]s.
pub(crate) fn unwrap_envelope(command: &str, status: u16, value: Value) -> Result<Value> {
    let expected = format!("{}response", command.to_lowercase());

    let inner = match value {
        Value::Object(mut map) => match map.remove(&expected) {
            Some(inner) => inner,
            None => {
                // Some error paths use a generic envelope name
                let key = map.keys().find(|k| k.ends_with("response")).cloned();
                match key.and_then(|k| map.remove(&k)) {
                    Some(inner) => inner,
                    None if (200..300).contains(&status) => {
                        return Err(CloudStackError::Decode(format!(
                            "{} response has no '{}' envelope",
                            command, expected
                        )));
                    }
                    None => {
                        return Err(CloudStackError::from_api(
                            status,
                            None,
                            Value::Object(map).to_string(),
                        ));
                    }
                }
            }
        },
        other => {
            return Err(CloudStackError::Decode(format!(
                "{} returned unexpected JSON: {}",
                command, other
            )));
        }
    };

    if let Some(code) = inner.get("errorcode").and_then(Value::as_u64) {
        let message = inner
            .get("errortext")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        let cs_error_code = inner.get("cserrorcode").and_then(Value::as_i64);
        debug!(command, code, ?cs_error_code, "CloudStack API error: {}", message);
        return Err(CloudStackError::from_api(
            u16::try_from(code).unwrap_or(u16::MAX),
            cs_error_code,
            message,
        ));
    }

    if !(200..300).contains(&status) {
        return Err(CloudStackError::from_api(status, None, inner.to_string()));
    }

    Ok(inner)
}

pub(crate) fn decode<T: DeserializeOwned>(command: &str, value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| CloudStackError::Decode(format!("{} response: {}", command, e)))
}

pub(crate) fn decode_list<T: DeserializeOwned>(
    command: &str,
    mut value: Value,
    key: &str,
) -> Result<ListResponse<T>> {
    let items: Vec<T> = match value.get_mut(key).map(Value::take) {
        Some(items) => decode(command, items)?,
        None => Vec::new(),
    };
    let count = value
        .get("count")
        .and_then(Value::as_u64)
        .map(|c| c as usize)
        .unwrap_or(items.len());
    Ok(ListResponse { count, items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_requires_credentials() {
        let err = CloudStackClient::builder()
            .api_url("https://cloud.example.com/client/api")
            .api_key("key")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("secret key"));

        let err = CloudStackClient::builder()
            .api_key("key")
            .secret_key("secret")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("API URL"));
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        let err = CloudStackClient::builder()
            .api_url("ftp://cloud.example.com")
            .api_key("key")
            .secret_key("secret")
            .build()
            .unwrap_err();
        assert!(matches!(err, CloudStackError::Config(_)));
    }

    #[test]
    fn test_builder_rejects_zero_poll_interval() {
        let err = CloudStackClient::builder()
            .api_url("https://cloud.example.com/client/api")
            .api_key("key")
            .secret_key("secret")
            .poll_interval(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, CloudStackError::Config(ref m) if m.contains("poll interval")));
    }

    #[test]
    fn test_builder_defaults() {
        let client = CloudStackClient::builder()
            .api_url("https://cloud.example.com/client/api?")
            .api_key("key")
            .secret_key("secret")
            .build()
            .unwrap();
        assert_eq!(client.api_url(), "https://cloud.example.com/client/api");
        assert_eq!(client.async_timeout(), DEFAULT_ASYNC_TIMEOUT);
        assert_eq!(client.poll_interval(), DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_retry_backoff_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(350));
        assert_eq!(RetryPolicy::none().max_attempts, 1);
    }

    #[test]
    fn test_read_only_detection() {
        assert!(is_read_only("listVirtualMachines"));
        assert!(is_read_only("queryAsyncJobResult"));
        assert!(is_read_only("getVMPassword"));
        assert!(!is_read_only("deployVirtualMachine"));
    }

    #[test]
    fn test_unwrap_envelope() {
        let body = json!({"listzonesresponse": {"count": 1, "zone": [{"id": "z1"}]}});
        let inner = unwrap_envelope("listZones", 200, body).unwrap();
        assert_eq!(inner["count"], 1);
    }

    #[test]
    fn test_unwrap_envelope_error() {
        let body = json!({
            "deployvirtualmachineresponse": {
                "uuidList": [],
                "errorcode": 431,
                "cserrorcode": 4350,
                "errortext": "Unable to find service offering"
            }
        });
        let err = unwrap_envelope("deployVirtualMachine", 431, body).unwrap_err();
        assert!(matches!(err, CloudStackError::InvalidParameter { .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unwrap_envelope_generic_error_name() {
        let body = json!({"errorresponse": {
            "errorcode": 401,
            "errortext": "unable to verify user credentials"
        }});
        let err = unwrap_envelope("listZones", 401, body).unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_decode_list_empty_response() {
        let list: ListResponse<Value> = decode_list("listZones", json!({}), "zone").unwrap();
        assert_eq!(list.count, 0);
        assert!(list.is_empty());
    }
}
