//! Multi-step workflows against a mock CloudStack endpoint

use cloudstack::services::snapshots::CreateSnapshotRequest;
use cloudstack::services::virtual_machines::DeployVirtualMachineRequest;
use cloudstack::services::volumes::CreateVolumeRequest;
use cloudstack::testing::{
    AsyncJobFixture, MockCloudStackServer, PublicIpFixture, SnapshotFixture,
    VirtualMachineFixture, VolumeFixture,
};
use cloudstackctl_core::{
    CoreError, ProgressCallback, ProgressEvent, acquire_ip_and_forward_port,
    create_volume_and_attach, deploy_vm_and_wait, destroy_vm_and_wait, snapshot_volume_and_wait,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);
const INTERVAL: Duration = Duration::from_millis(10);

fn recorder() -> (Arc<Mutex<Vec<ProgressEvent>>>, ProgressCallback) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    (
        events,
        Box::new(move |event| sink.lock().unwrap().push(event)),
    )
}

fn started(events: &[ProgressEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Started { job_id } => Some(job_id.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_deploy_vm_and_wait() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_async_command(
            "deployVirtualMachine",
            "job-deploy",
            Some("vm-1"),
            2,
            AsyncJobFixture::succeeded(
                "job-deploy",
                "virtualmachine",
                VirtualMachineFixture::new("vm-1", "web-1").build(),
            )
            .build(),
        )
        .await;

    let (events, callback) = recorder();
    let vm = deploy_vm_and_wait(
        &server.client(),
        DeployVirtualMachineRequest::new("so-1", "tpl-1", "zone-1").name("web-1"),
        TIMEOUT,
        INTERVAL,
        Some(callback),
    )
    .await
    .unwrap();

    assert_eq!(vm.id, "vm-1");
    assert_eq!(vm.state.as_deref(), Some("Running"));

    let events = events.lock().unwrap();
    assert_eq!(
        events.last(),
        Some(&ProgressEvent::Completed {
            job_id: "job-deploy".to_string(),
            resource_id: Some("vm-1".to_string()),
        })
    );
}

#[tokio::test]
async fn test_deploy_failure_surfaces_job_error() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_async_command(
            "deployVirtualMachine",
            "job-deploy",
            Some("vm-1"),
            0,
            AsyncJobFixture::failed("job-deploy", 533, "Insufficient capacity in zone").build(),
        )
        .await;

    let err = deploy_vm_and_wait(
        &server.client(),
        DeployVirtualMachineRequest::new("so-1", "tpl-1", "zone-1"),
        TIMEOUT,
        INTERVAL,
        None,
    )
    .await
    .unwrap_err();

    match err {
        CoreError::JobFailed { job_id, code, .. } => {
            assert_eq!(job_id, "job-deploy");
            assert_eq!(code, 533);
        }
        other => panic!("expected JobFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_destroy_vm_and_wait() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_async_command(
            "destroyVirtualMachine",
            "job-destroy",
            None,
            1,
            AsyncJobFixture::success("job-destroy").build(),
        )
        .await;

    destroy_vm_and_wait(&server.client(), "vm-1", true, TIMEOUT, INTERVAL, None)
        .await
        .unwrap();

    let sent = server.received_params("destroyVirtualMachine").await;
    assert!(sent[0].contains(&("expunge".to_string(), "true".to_string())));
}

#[tokio::test]
async fn test_create_volume_and_attach() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_async_command(
            "createVolume",
            "job-create",
            Some("vol-1"),
            1,
            AsyncJobFixture::succeeded(
                "job-create",
                "volume",
                VolumeFixture::new("vol-1", "data").build(),
            )
            .build(),
        )
        .await;
    server
        .mock_async_command(
            "attachVolume",
            "job-attach",
            None,
            1,
            AsyncJobFixture::succeeded(
                "job-attach",
                "volume",
                VolumeFixture::new("vol-1", "data").attached_to("vm-1", 1).build(),
            )
            .build(),
        )
        .await;

    let (events, callback) = recorder();
    let volume = create_volume_and_attach(
        &server.client(),
        CreateVolumeRequest::new("data")
            .zone_id("zone-1")
            .disk_offering_id("do-1"),
        "vm-1",
        TIMEOUT,
        INTERVAL,
        Some(callback),
    )
    .await
    .unwrap();

    assert_eq!(volume.virtualmachineid.as_deref(), Some("vm-1"));

    let events = events.lock().unwrap();
    assert_eq!(started(&events), vec!["job-create", "job-attach"]);

    let attach = server.received_params("attachVolume").await;
    assert!(attach[0].contains(&("id".to_string(), "vol-1".to_string())));
    assert!(attach[0].contains(&("virtualmachineid".to_string(), "vm-1".to_string())));
}

#[tokio::test]
async fn test_snapshot_volume_and_wait() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_async_command(
            "createSnapshot",
            "job-snap",
            Some("snap-1"),
            3,
            AsyncJobFixture::succeeded(
                "job-snap",
                "snapshot",
                SnapshotFixture::new("snap-1", "vol-1").build(),
            )
            .build(),
        )
        .await;

    let snapshot = snapshot_volume_and_wait(
        &server.client(),
        CreateSnapshotRequest::new("vol-1"),
        TIMEOUT,
        INTERVAL,
        None,
    )
    .await
    .unwrap();

    assert_eq!(snapshot.id, "snap-1");
}

#[tokio::test]
async fn test_snapshot_polls_at_requested_interval() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_async_command(
            "createSnapshot",
            "job-snap",
            Some("snap-1"),
            3,
            AsyncJobFixture::succeeded(
                "job-snap",
                "snapshot",
                SnapshotFixture::new("snap-1", "vol-1").build(),
            )
            .build(),
        )
        .await;

    // The client polls every 10ms; a 2s interval leaves room for one more
    // poll at the 300ms deadline only
    let err = snapshot_volume_and_wait(
        &server.client(),
        CreateSnapshotRequest::new("vol-1"),
        Duration::from_millis(300),
        Duration::from_secs(2),
        None,
    )
    .await
    .unwrap_err();

    assert!(err.is_timeout());
    let polls = server
        .received_commands()
        .await
        .into_iter()
        .filter(|c| c == "queryAsyncJobResult")
        .count();
    assert_eq!(polls, 2);
}

#[tokio::test]
async fn test_acquire_ip_and_forward_port() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_async_command(
            "associateIpAddress",
            "job-ip",
            Some("ip-1"),
            0,
            AsyncJobFixture::succeeded(
                "job-ip",
                "ipaddress",
                PublicIpFixture::new("ip-1", "203.0.113.10").build(),
            )
            .build(),
        )
        .await;
    server
        .mock_async_command(
            "createPortForwardingRule",
            "job-pf",
            Some("pf-1"),
            0,
            AsyncJobFixture::succeeded(
                "job-pf",
                "portforwardingrule",
                json!({
                    "id": "pf-1",
                    "protocol": "tcp",
                    "publicport": "2222",
                    "privateport": "22",
                    "ipaddressid": "ip-1",
                    "ipaddress": "203.0.113.10",
                    "virtualmachineid": "vm-1",
                    "state": "Active"
                }),
            )
            .build(),
        )
        .await;

    let forward = acquire_ip_and_forward_port(
        &server.client(),
        "net-1",
        "vm-1",
        "TCP",
        2222,
        22,
        TIMEOUT,
        INTERVAL,
        None,
    )
    .await
    .unwrap();

    assert_eq!(forward.ip_address.ipaddress, "203.0.113.10");
    assert_eq!(forward.rule.id, "pf-1");

    let sent = server.received_params("createPortForwardingRule").await;
    assert!(sent[0].contains(&("ipaddressid".to_string(), "ip-1".to_string())));
    assert!(sent[0].contains(&("protocol".to_string(), "tcp".to_string())));
    assert!(sent[0].contains(&("openfirewall".to_string(), "true".to_string())));
}

#[tokio::test]
async fn test_failed_forward_releases_ip() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_async_command(
            "associateIpAddress",
            "job-ip",
            Some("ip-1"),
            0,
            AsyncJobFixture::succeeded(
                "job-ip",
                "ipaddress",
                PublicIpFixture::new("ip-1", "203.0.113.10").build(),
            )
            .build(),
        )
        .await;
    server
        .mock_error(
            "createPortForwardingRule",
            537,
            "The range specified conflicts with rule 42",
        )
        .await;
    server
        .mock_async_command(
            "disassociateIpAddress",
            "job-release",
            None,
            0,
            AsyncJobFixture::success("job-release").build(),
        )
        .await;

    let err = acquire_ip_and_forward_port(
        &server.client(),
        "net-1",
        "vm-1",
        "tcp",
        22,
        22,
        TIMEOUT,
        INTERVAL,
        None,
    )
    .await
    .unwrap_err();

    assert!(err.is_conflict());
    let released = server.received_params("disassociateIpAddress").await;
    assert_eq!(released.len(), 1);
    assert!(released[0].contains(&("id".to_string(), "ip-1".to_string())));
}

#[tokio::test]
async fn test_forward_rejects_bad_input_before_calling_api() {
    let server = MockCloudStackServer::start().await;
    let client = server.client();

    let err = acquire_ip_and_forward_port(
        &client, "net-1", "vm-1", "icmp", 22, 22, TIMEOUT, INTERVAL, None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = acquire_ip_and_forward_port(
        &client, "net-1", "vm-1", "tcp", 0, 22, TIMEOUT, INTERVAL, None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    assert!(server.received_commands().await.is_empty());
}
