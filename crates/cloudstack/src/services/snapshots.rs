//! Volume snapshots

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::jobs::PendingJob;
use crate::params::{
    api_request, bool_setters, id_constructor, list_filters, param_setters, tag_filter,
};
use crate::types::{Extra, ListResponse, SuccessResponse, Tag, flexible_i64};
use serde::{Deserialize, Serialize};

/// A point-in-time copy of a volume
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumeid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumetype: Option<String>,
    /// `MANUAL`, `HOURLY`, `DAILY`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshottype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervaltype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoneid: Option<String>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub physicalsize: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub extra: Extra,
}

api_request!(
    /// Parameters for `createSnapshot`
    CreateSnapshotRequest => "createSnapshot"
);

impl CreateSnapshotRequest {
    /// Snapshot the given volume
    pub fn new(volume_id: impl Into<String>) -> Self {
        let mut request = Self::default();
        request.params.set("volumeid", volume_id);
        request
    }

    param_setters! {
        name => "name",
        policy_id => "policyid",
        account => "account",
        domain_id => "domainid",
    }
    bool_setters! {
        /// Quiesce the VM before taking the snapshot
        quiesce_vm => "quiescevm",
        async_backup => "asyncbackup",
    }
}

api_request!(
    /// Parameters for `revertSnapshot`
    RevertSnapshotRequest => "revertSnapshot"
);

impl RevertSnapshotRequest {
    id_constructor!("id");
}

api_request!(
    /// Parameters for `deleteSnapshot`
    DeleteSnapshotRequest => "deleteSnapshot"
);

impl DeleteSnapshotRequest {
    id_constructor!("id");
}

api_request!(
    /// Parameters for `listSnapshots`
    ListSnapshotsRequest => "listSnapshots"
);

impl ListSnapshotsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        id => "id",
        name => "name",
        volume_id => "volumeid",
        zone_id => "zoneid",
        snapshot_type => "snapshottype",
        interval_type => "intervaltype",
    }
    list_filters!();
    tag_filter!();
}

/// Handler for snapshots
pub struct SnapshotHandler {
    client: CloudStackClient,
}

impl SnapshotHandler {
    pub fn new(client: CloudStackClient) -> Self {
        Self { client }
    }

    /// Take a snapshot of a volume
    pub async fn create(&self, request: CreateSnapshotRequest) -> Result<PendingJob<Snapshot>> {
        self.client.submit(&request, Some("snapshot")).await
    }

    /// Revert its volume to a snapshot
    pub async fn revert(&self, id: &str) -> Result<PendingJob<Snapshot>> {
        self.client
            .submit(&RevertSnapshotRequest::new(id), Some("snapshot"))
            .await
    }

    /// Delete a snapshot
    pub async fn delete(&self, id: &str) -> Result<PendingJob<SuccessResponse>> {
        self.client
            .submit(&DeleteSnapshotRequest::new(id), None)
            .await
    }

    /// List snapshots
    pub async fn list(&self, request: ListSnapshotsRequest) -> Result<ListResponse<Snapshot>> {
        self.client.request_list(&request, "snapshot").await
    }
}
