//! Async job tracking
//!
//! Mutating CloudStack commands usually return a job id instead of a result.
//! [`AsyncJobHandler`] queries and polls those jobs, and [`PendingJob`] ties a
//! job to the typed result its command eventually produces.

use crate::client::{CloudStackClient, decode};
use crate::error::{CloudStackError, Result};
use crate::params::{api_request, list_filters, param_setters};
use crate::types::{JobSubmission, ListResponse, flexible_i64};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

/// State of an async job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Map CloudStack's numeric `jobstatus`
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => JobStatus::Succeeded,
            2 => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }

    /// Returns true once the job has finished either way
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// An async job as returned by `queryAsyncJobResult` and `listAsyncJobs`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AsyncJob {
    pub jobid: String,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub jobstatus: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub jobresultcode: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub jobprocstatus: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobresulttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobresult: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobinstancetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobinstanceid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<String>,
}

impl AsyncJob {
    /// Current status
    pub fn status(&self) -> JobStatus {
        JobStatus::from_code(self.jobstatus.unwrap_or(0))
    }

    /// Error code and text of a failed job
    pub fn failure(&self) -> Option<(i64, String)> {
        if self.status() != JobStatus::Failed {
            return None;
        }
        let result = self.jobresult.as_ref();
        let code = result
            .and_then(|r| r.get("errorcode"))
            .and_then(Value::as_i64)
            .or(self.jobresultcode)
            .unwrap_or(530);
        let message = result
            .and_then(|r| r.get("errortext"))
            .and_then(Value::as_str)
            .unwrap_or("job failed without an error message")
            .to_string();
        Some((code, message))
    }

    /// Convert a failed job into an error
    pub fn into_result(self) -> Result<Self> {
        match self.failure() {
            Some((code, message)) => Err(CloudStackError::JobFailed {
                job_id: self.jobid,
                code,
                message,
            }),
            None => Ok(self),
        }
    }
}

api_request!(
    /// Parameters for `queryAsyncJobResult`
    QueryAsyncJobResultRequest => "queryAsyncJobResult"
);

impl QueryAsyncJobResultRequest {
    pub fn new(job_id: impl Into<String>) -> Self {
        let mut request = Self::default();
        request.params.set("jobid", job_id);
        request
    }
}

api_request!(
    /// Parameters for `listAsyncJobs`
    ListAsyncJobsRequest => "listAsyncJobs"
);

impl ListAsyncJobsRequest {
    list_filters!();
    param_setters! {
        /// Only jobs created after this date (`yyyy-MM-dd'T'HH:mm:ssZ`)
        start_date => "startdate",
    }
}

/// Query and poll async jobs
pub struct AsyncJobHandler {
    client: CloudStackClient,
}

impl AsyncJobHandler {
    pub fn new(client: CloudStackClient) -> Self {
        Self { client }
    }

    /// Fetch the current state of a job
    pub async fn query(&self, job_id: &str) -> Result<AsyncJob> {
        self.client
            .request(&QueryAsyncJobResultRequest::new(job_id))
            .await
    }

    /// List async jobs visible to the caller
    pub async fn list(&self, request: ListAsyncJobsRequest) -> Result<ListResponse<AsyncJob>> {
        self.client.request_list(&request, "asyncjobs").await
    }

    /// Poll a job until it finishes, using the client's default timeout and
    /// interval
    pub async fn wait(&self, job_id: &str) -> Result<AsyncJob> {
        self.wait_with(
            job_id,
            self.client.async_timeout(),
            self.client.poll_interval(),
            |_| {},
        )
        .await
    }

    /// Poll a job until it finishes, calling `observer` after every poll
    ///
    /// Returns the finished job on success, [`CloudStackError::JobFailed`] if
    /// CloudStack reports a failure and [`CloudStackError::JobTimeout`] if the
    /// job is still pending after `timeout`.
    pub async fn wait_with<F>(
        &self,
        job_id: &str,
        timeout: Duration,
        interval: Duration,
        mut observer: F,
    ) -> Result<AsyncJob>
    where
        F: FnMut(&AsyncJob),
    {
        let start = Instant::now();
        let mut polls = 0u32;

        loop {
            polls += 1;
            let job = self.query(job_id).await?;
            trace!(job_id, polls, status = %job.status(), "Polled async job");
            observer(&job);

            if job.status().is_terminal() {
                debug!(
                    job_id,
                    status = %job.status(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Async job finished"
                );
                return job.into_result();
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(CloudStackError::JobTimeout {
                    job_id: job_id.to_string(),
                    timeout,
                });
            }

            // The last poll lands on the deadline
            sleep(interval.min(timeout - elapsed)).await;
        }
    }
}

/// A submitted async command whose result has not been collected yet
#[derive(Debug)]
#[must_use = "the job keeps running, call wait() to collect its result"]
pub struct PendingJob<T> {
    client: CloudStackClient,
    command: &'static str,
    job_id: String,
    resource_id: Option<String>,
    result_key: Option<&'static str>,
    _result: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> PendingJob<T> {
    pub(crate) fn new(
        client: CloudStackClient,
        command: &'static str,
        submission: JobSubmission,
        result_key: Option<&'static str>,
    ) -> Self {
        Self {
            client,
            command,
            job_id: submission.jobid,
            resource_id: submission.id,
            result_key,
            _result: PhantomData,
        }
    }

    /// Id of the async job
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Id of the resource being created or changed, when CloudStack returns
    /// it up front
    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    /// The command that started the job
    pub fn command(&self) -> &'static str {
        self.command
    }

    /// Wait with the client's defaults and decode the result
    pub async fn wait(self) -> Result<T> {
        let timeout = self.client.async_timeout();
        let interval = self.client.poll_interval();
        self.wait_with(timeout, interval, |_| {}).await
    }

    /// Wait with explicit timing, reporting every poll to `observer`
    pub async fn wait_with<F>(self, timeout: Duration, interval: Duration, observer: F) -> Result<T>
    where
        F: FnMut(&AsyncJob),
    {
        let job = self
            .client
            .jobs()
            .wait_with(&self.job_id, timeout, interval, observer)
            .await?;
        extract_result(self.command, job, self.result_key)
    }
}

/// Pull the typed result out of a finished job's `jobresult`
pub fn extract_result<T: DeserializeOwned>(
    command: &str,
    job: AsyncJob,
    result_key: Option<&str>,
) -> Result<T> {
    let mut result = job.jobresult.unwrap_or(Value::Object(Default::default()));
    let value = match result_key {
        Some(key) => result.get_mut(key).map(Value::take).ok_or_else(|| {
            CloudStackError::Decode(format!(
                "{} job {} result has no '{}' field",
                command, job.jobid, key
            ))
        })?,
        None => result,
    };
    decode(command, value)
}
