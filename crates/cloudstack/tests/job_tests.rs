//! Async job polling

use cloudstack::jobs::ListAsyncJobsRequest;
use cloudstack::testing::{AsyncJobFixture, MockCloudStackServer, VolumeFixture};
use cloudstack::{CloudStackError, JobStatus, VolumeHandler};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test]
async fn test_query_job() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_job(
            "job-1",
            0,
            AsyncJobFixture::pending("job-1")
                .command("org.apache.cloudstack.api.command.user.vm.DeployVMCmd")
                .instance("VirtualMachine", "vm-1")
                .build(),
        )
        .await;

    let job = server.client().jobs().query("job-1").await.unwrap();
    assert_eq!(job.jobid, "job-1");
    assert_eq!(job.status(), JobStatus::Pending);
    assert_eq!(job.jobinstanceid.as_deref(), Some("vm-1"));
}

#[tokio::test]
async fn test_wait_polls_until_done() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_job(
            "job-1",
            3,
            AsyncJobFixture::succeeded(
                "job-1",
                "volume",
                VolumeFixture::new("vol-1", "data").build(),
            )
            .build(),
        )
        .await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let observed = seen.clone();
    let job = server
        .client()
        .jobs()
        .wait_with(
            "job-1",
            Duration::from_secs(5),
            Duration::from_millis(5),
            move |job| observed.lock().unwrap().push(job.status()),
        )
        .await
        .unwrap();

    assert_eq!(job.status(), JobStatus::Succeeded);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            JobStatus::Pending,
            JobStatus::Pending,
            JobStatus::Pending,
            JobStatus::Succeeded
        ]
    );
}

#[tokio::test]
async fn test_wait_reports_failure() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_async_command(
            "attachVolume",
            "job-2",
            Some("vol-1"),
            1,
            AsyncJobFixture::failed("job-2", 431, "Volume is already attached").build(),
        )
        .await;

    let err = VolumeHandler::new(server.client())
        .attach(cloudstack::services::volumes::AttachVolumeRequest::new("vol-1", "vm-1"))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap_err();

    match err {
        CloudStackError::JobFailed {
            job_id,
            code,
            message,
        } => {
            assert_eq!(job_id, "job-2");
            assert_eq!(code, 431);
            assert_eq!(message, "Volume is already attached");
        }
        other => panic!("expected JobFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_wait_times_out() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_job("job-3", 1000, AsyncJobFixture::success("job-3").build())
        .await;

    let err = server
        .client()
        .jobs()
        .wait_with(
            "job-3",
            Duration::from_millis(50),
            Duration::from_millis(10),
            |_| {},
        )
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(matches!(err, CloudStackError::JobTimeout { ref job_id, .. } if job_id == "job-3"));
}

#[tokio::test]
async fn test_wait_polls_again_at_deadline_when_interval_exceeds_timeout() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_job("job-5", 1, AsyncJobFixture::success("job-5").build())
        .await;

    let mut polls = 0;
    let job = server
        .client()
        .jobs()
        .wait_with(
            "job-5",
            Duration::from_millis(200),
            Duration::from_millis(300),
            |_| polls += 1,
        )
        .await
        .unwrap();

    assert_eq!(job.status(), JobStatus::Succeeded);
    assert_eq!(polls, 2);
}

#[tokio::test]
async fn test_pending_job_exposes_ids() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_async_command(
            "createVolume",
            "job-4",
            Some("vol-9"),
            0,
            AsyncJobFixture::succeeded(
                "job-4",
                "volume",
                VolumeFixture::new("vol-9", "data").build(),
            )
            .build(),
        )
        .await;

    let pending = VolumeHandler::new(server.client())
        .create(cloudstack::services::volumes::CreateVolumeRequest::new("data").zone_id("zone-1"))
        .await
        .unwrap();
    assert_eq!(pending.job_id(), "job-4");
    assert_eq!(pending.resource_id(), Some("vol-9"));
    assert_eq!(pending.command(), "createVolume");

    let volume = pending.wait().await.unwrap();
    assert_eq!(volume.id, "vol-9");
}

#[tokio::test]
async fn test_list_jobs() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_list(
            "listAsyncJobs",
            "asyncjobs",
            vec![
                AsyncJobFixture::success("job-1").build(),
                AsyncJobFixture::pending("job-2").build(),
            ],
        )
        .await;

    let jobs = server
        .client()
        .jobs()
        .list(ListAsyncJobsRequest::default().list_all(true))
        .await
        .unwrap();
    assert_eq!(jobs.count, 2);
    assert_eq!(jobs.items[0].status(), JobStatus::Succeeded);
    assert_eq!(jobs.items[1].status(), JobStatus::Pending);
}
