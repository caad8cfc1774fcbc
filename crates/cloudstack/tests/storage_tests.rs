//! Volumes and snapshots

use cloudstack::services::snapshots::{CreateSnapshotRequest, ListSnapshotsRequest};
use cloudstack::services::volumes::{
    AttachVolumeRequest, CreateVolumeRequest, ListVolumesRequest, ResizeVolumeRequest,
};
use cloudstack::testing::{AsyncJobFixture, MockCloudStackServer, SnapshotFixture, VolumeFixture};
use cloudstack::{SnapshotHandler, VolumeHandler};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_create_attach_detach_volume() {
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
            0,
            AsyncJobFixture::succeeded(
                "job-attach",
                "volume",
                VolumeFixture::new("vol-1", "data").attached_to("vm-1", 1).build(),
            )
            .build(),
        )
        .await;
    server
        .mock_async_command(
            "detachVolume",
            "job-detach",
            None,
            0,
            AsyncJobFixture::succeeded(
                "job-detach",
                "volume",
                VolumeFixture::new("vol-1", "data").build(),
            )
            .build(),
        )
        .await;

    let volumes = VolumeHandler::new(server.client());

    let volume = volumes
        .create(
            CreateVolumeRequest::new("data")
                .zone_id("zone-1")
                .disk_offering_id("do-1")
                .size(10),
        )
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(volume.size_gib(), Some(10));
    assert_eq!(volume.volume_type.as_deref(), Some("DATADISK"));

    let volume = volumes
        .attach(AttachVolumeRequest::new("vol-1", "vm-1"))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(volume.virtualmachineid.as_deref(), Some("vm-1"));
    assert_eq!(volume.deviceid, Some(1));

    let volume = volumes.detach("vol-1").await.unwrap().wait().await.unwrap();
    assert_eq!(volume.virtualmachineid, None);

    let sent = server.received_params("createVolume").await;
    assert!(sent[0].contains(&("size".to_string(), "10".to_string())));
}

#[tokio::test]
async fn test_resize_volume() {
    let server = MockCloudStackServer::start().await;
    let mut resized = VolumeFixture::new("vol-1", "data").build();
    resized["size"] = json!(21_474_836_480u64);
    server
        .mock_async_command(
            "resizeVolume",
            "job-resize",
            None,
            0,
            AsyncJobFixture::succeeded("job-resize", "volume", resized).build(),
        )
        .await;

    let volume = VolumeHandler::new(server.client())
        .resize(ResizeVolumeRequest::new("vol-1").size(20))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(volume.size_gib(), Some(20));
}

#[tokio::test]
async fn test_list_get_delete_volume() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_list(
            "listVolumes",
            "volume",
            vec![VolumeFixture::new("vol-1", "data").attached_to("vm-1", 1).build()],
        )
        .await;
    server
        .mock_command("deleteVolume", json!({"success": "true"}))
        .await;

    let volumes = VolumeHandler::new(server.client());
    let list = volumes
        .list(ListVolumesRequest::new().virtual_machine_id("vm-1"))
        .await
        .unwrap();
    assert_eq!(list.count, 1);

    let volume = volumes.get("vol-1").await.unwrap();
    assert_eq!(volume.name, "data");

    let result = volumes.delete("vol-1").await.unwrap();
    assert!(result.success);
}

#[tokio::test]
async fn test_snapshot_lifecycle() {
    let server = MockCloudStackServer::start().await;
    server
        .mock_async_command(
            "createSnapshot",
            "job-snap",
            Some("snap-1"),
            2,
            AsyncJobFixture::succeeded(
                "job-snap",
                "snapshot",
                SnapshotFixture::new("snap-1", "vol-1").build(),
            )
            .build(),
        )
        .await;
    server
        .mock_async_command(
            "revertSnapshot",
            "job-revert",
            None,
            0,
            AsyncJobFixture::succeeded(
                "job-revert",
                "snapshot",
                SnapshotFixture::new("snap-1", "vol-1").build(),
            )
            .build(),
        )
        .await;
    server
        .mock_async_command(
            "deleteSnapshot",
            "job-delete",
            None,
            0,
            AsyncJobFixture::success("job-delete").build(),
        )
        .await;
    server
        .mock_list(
            "listSnapshots",
            "snapshot",
            vec![SnapshotFixture::new("snap-1", "vol-1").build()],
        )
        .await;

    let snapshots = SnapshotHandler::new(server.client());

    let snapshot = snapshots
        .create(CreateSnapshotRequest::new("vol-1").name("nightly"))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(snapshot.id, "snap-1");
    assert_eq!(snapshot.state.as_deref(), Some("BackedUp"));

    let reverted = snapshots.revert("snap-1").await.unwrap().wait().await.unwrap();
    assert_eq!(reverted.volumeid.as_deref(), Some("vol-1"));

    let list = snapshots
        .list(ListSnapshotsRequest::new().volume_id("vol-1"))
        .await
        .unwrap();
    assert_eq!(list.items.len(), 1);

    let result = snapshots.delete("snap-1").await.unwrap().wait().await.unwrap();
    assert!(result.success);
}
