//! Progress tracking for CloudStack async jobs
//!
//! Async commands return a job id that has to be polled through
//! `queryAsyncJobResult`. The SDK's poller does the polling; this module
//! turns each poll into a [`ProgressEvent`] so a CLI can drive a spinner.

use crate::error::{CoreError, Result};
use cloudstack::{AsyncJob, CloudStackClient, JobStatus, PendingJob};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::info;

/// Progress events emitted while waiting for a job
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Waiting has begun
    Started { job_id: String },
    /// One poll came back
    Polling {
        job_id: String,
        status: JobStatus,
        elapsed: Duration,
    },
    /// Job finished successfully
    Completed {
        job_id: String,
        resource_id: Option<String>,
    },
    /// Job failed or the wait gave up
    Failed { job_id: String, error: String },
}

/// Callback type for progress updates
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Poll a job until it finishes
///
/// # Arguments
///
/// * `client` - The CloudStack client
/// * `job_id` - The job to poll
/// * `timeout` - Maximum time to wait for completion
/// * `interval` - Time between polls
/// * `on_progress` - Optional callback for progress updates
///
/// # Example
///
/// ```rust,ignore
/// use cloudstackctl_core::{poll_job, ProgressEvent};
/// use std::time::Duration;
///
/// let job = poll_job(
///     &client,
///     "1e2b7a1c-6c1d-4d0f-9b50-6f0f3f8e9a11",
///     Duration::from_secs(600),
///     Duration::from_secs(2),
///     Some(Box::new(|event| {
///         if let ProgressEvent::Polling { status, elapsed, .. } = event {
///             println!("{} ({:.0}s)", status, elapsed.as_secs());
///         }
///     })),
/// ).await?;
/// ```
pub async fn poll_job(
    client: &CloudStackClient,
    job_id: &str,
    timeout: Duration,
    interval: Duration,
    on_progress: Option<ProgressCallback>,
) -> Result<AsyncJob> {
    let start = Instant::now();
    emit(
        &on_progress,
        ProgressEvent::Started {
            job_id: job_id.to_string(),
        },
    );

    let outcome = client
        .jobs()
        .wait_with(job_id, timeout, interval, |job| {
            emit(&on_progress, polling_event(job_id, job, start));
        })
        .await;

    match outcome {
        Ok(job) => {
            let resource_id = job.jobinstanceid.clone();
            finish_ok(&on_progress, job_id, resource_id);
            Ok(job)
        }
        Err(e) => Err(finish_err(&on_progress, job_id, e)),
    }
}

/// Wait for a submitted command and decode its result
///
/// Same events as [`poll_job`], but the typed result of the command is
/// returned instead of the raw job.
pub async fn wait_for<T: DeserializeOwned>(
    pending: PendingJob<T>,
    timeout: Duration,
    interval: Duration,
    on_progress: Option<ProgressCallback>,
) -> Result<T> {
    let start = Instant::now();
    let job_id = pending.job_id().to_string();
    let resource_id = pending.resource_id().map(str::to_string);

    emit(
        &on_progress,
        ProgressEvent::Started {
            job_id: job_id.clone(),
        },
    );

    let outcome = pending
        .wait_with(timeout, interval, |job| {
            emit(&on_progress, polling_event(&job_id, job, start));
        })
        .await;

    match outcome {
        Ok(result) => {
            finish_ok(&on_progress, &job_id, resource_id);
            Ok(result)
        }
        Err(e) => Err(finish_err(&on_progress, &job_id, e)),
    }
}

fn polling_event(job_id: &str, job: &AsyncJob, start: Instant) -> ProgressEvent {
    ProgressEvent::Polling {
        job_id: job_id.to_string(),
        status: job.status(),
        elapsed: start.elapsed(),
    }
}

fn finish_ok(on_progress: &Option<ProgressCallback>, job_id: &str, resource_id: Option<String>) {
    info!(job_id, resource_id = ?resource_id, "Async job completed");
    emit(
        on_progress,
        ProgressEvent::Completed {
            job_id: job_id.to_string(),
            resource_id,
        },
    );
}

fn finish_err(
    on_progress: &Option<ProgressCallback>,
    job_id: &str,
    err: cloudstack::CloudStackError,
) -> CoreError {
    let err = CoreError::from_api(err);
    emit(
        on_progress,
        ProgressEvent::Failed {
            job_id: job_id.to_string(),
            error: err.to_string(),
        },
    );
    err
}

/// Helper to emit progress events
fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudstack::testing::{AsyncJobFixture, MockCloudStackServer};
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<ProgressEvent>>>, ProgressCallback) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let callback: ProgressCallback = Box::new(move |event| sink.lock().unwrap().push(event));
        (events, callback)
    }

    #[tokio::test]
    async fn test_poll_job_emits_events() {
        let server = MockCloudStackServer::start().await;
        server
            .mock_job(
                "job-1",
                2,
                AsyncJobFixture::success("job-1")
                    .instance("VirtualMachine", "vm-1")
                    .build(),
            )
            .await;

        let (events, callback) = recorder();
        let job = poll_job(
            &server.client(),
            "job-1",
            Duration::from_secs(5),
            Duration::from_millis(5),
            Some(callback),
        )
        .await
        .unwrap();
        assert_eq!(job.status(), JobStatus::Succeeded);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(
            events[0],
            ProgressEvent::Started {
                job_id: "job-1".to_string()
            }
        );
        assert!(matches!(
            events[1],
            ProgressEvent::Polling {
                status: JobStatus::Pending,
                ..
            }
        ));
        assert!(matches!(
            events[3],
            ProgressEvent::Polling {
                status: JobStatus::Succeeded,
                ..
            }
        ));
        assert_eq!(
            events[4],
            ProgressEvent::Completed {
                job_id: "job-1".to_string(),
                resource_id: Some("vm-1".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_poll_job_failure() {
        let server = MockCloudStackServer::start().await;
        server
            .mock_job(
                "job-2",
                0,
                AsyncJobFixture::failed("job-2", 530, "Insufficient capacity").build(),
            )
            .await;

        let (events, callback) = recorder();
        let err = poll_job(
            &server.client(),
            "job-2",
            Duration::from_secs(5),
            Duration::from_millis(5),
            Some(callback),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CoreError::JobFailed { code: 530, .. }));
        let events = events.lock().unwrap();
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::Failed { error, .. }) if error.contains("Insufficient capacity")
        ));
    }

    #[tokio::test]
    async fn test_poll_job_timeout() {
        let server = MockCloudStackServer::start().await;
        server
            .mock_job("job-3", 1000, AsyncJobFixture::success("job-3").build())
            .await;

        let err = poll_job(
            &server.client(),
            "job-3",
            Duration::from_millis(40),
            Duration::from_millis(10),
            None,
        )
        .await
        .unwrap_err();

        assert!(err.is_timeout());
        assert!(matches!(err, CoreError::JobTimeout { ref job_id, .. } if job_id == "job-3"));
    }
}
