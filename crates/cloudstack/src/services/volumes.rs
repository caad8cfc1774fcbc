//! Volumes

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::jobs::PendingJob;
use crate::params::{
    api_request, bool_setters, id_constructor, int_setters, list_filters, param_setters,
    tag_filter,
};
use crate::services::first_or_not_found;
use crate::types::{Extra, ListResponse, SuccessResponse, Tag, flexible_i64};
use serde::{Deserialize, Serialize};

/// A root or data disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Volume {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// `ROOT` or `DATADISK`
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
    /// Bytes
    #[serde(default, deserialize_with = "flexible_i64")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoneid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zonename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtualmachineid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vmname: Option<String>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub deviceid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diskofferingid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diskofferingname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Volume {
    /// Size in GiB, rounded down
    pub fn size_gib(&self) -> Option<i64> {
        self.size.map(|bytes| bytes / (1024 * 1024 * 1024))
    }
}

api_request!(
    /// Parameters for `createVolume`
    CreateVolumeRequest => "createVolume"
);

impl CreateVolumeRequest {
    pub fn new(name: impl Into<String>) -> Self {
        let mut request = Self::default();
        request.params.set("name", name);
        request
    }

    param_setters! {
        zone_id => "zoneid",
        disk_offering_id => "diskofferingid",
        /// Create from a volume snapshot instead of an offering
        snapshot_id => "snapshotid",
        /// Attach to this VM once created
        virtual_machine_id => "virtualmachineid",
        account => "account",
        domain_id => "domainid",
        project_id => "projectid",
    }
    int_setters! {
        /// GiB, for custom disk offerings
        size => "size",
        min_iops => "miniops",
        max_iops => "maxiops",
    }
}

api_request!(
    /// Parameters for `attachVolume`
    AttachVolumeRequest => "attachVolume"
);

impl AttachVolumeRequest {
    pub fn new(id: impl Into<String>, virtual_machine_id: impl Into<String>) -> Self {
        let mut request = Self::default();
        request
            .params
            .set("id", id)
            .set("virtualmachineid", virtual_machine_id);
        request
    }

    int_setters! {
        device_id => "deviceid",
    }
}

api_request!(
    /// Parameters for `detachVolume`
    DetachVolumeRequest => "detachVolume"
);

impl DetachVolumeRequest {
    id_constructor!("id");
}

api_request!(
    /// Parameters for `resizeVolume`
    ResizeVolumeRequest => "resizeVolume"
);

impl ResizeVolumeRequest {
    id_constructor!("id");

    param_setters! {
        disk_offering_id => "diskofferingid",
    }
    int_setters! {
        /// New size in GiB
        size => "size",
    }
    bool_setters! {
        /// Allow the new size to be smaller
        shrink_ok => "shrinkok",
    }
}

api_request!(
    /// Parameters for `deleteVolume`
    DeleteVolumeRequest => "deleteVolume"
);

impl DeleteVolumeRequest {
    id_constructor!("id");
}

api_request!(
    /// Parameters for `listVolumes`
    ListVolumesRequest => "listVolumes"
);

impl ListVolumesRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        id => "id",
        name => "name",
        /// `ROOT` or `DATADISK`
        volume_type => "type",
        virtual_machine_id => "virtualmachineid",
        zone_id => "zoneid",
        disk_offering_id => "diskofferingid",
        state => "state",
    }
    list_filters!();
    tag_filter!();
}

/// Handler for volumes
pub struct VolumeHandler {
    client: CloudStackClient,
}

impl VolumeHandler {
    pub fn new(client: CloudStackClient) -> Self {
        Self { client }
    }

    /// Create a data volume
    pub async fn create(&self, request: CreateVolumeRequest) -> Result<PendingJob<Volume>> {
        self.client.submit(&request, Some("volume")).await
    }

    /// Attach a volume to a VM
    pub async fn attach(&self, request: AttachVolumeRequest) -> Result<PendingJob<Volume>> {
        self.client.submit(&request, Some("volume")).await
    }

    /// Detach a volume from its VM
    pub async fn detach(&self, id: &str) -> Result<PendingJob<Volume>> {
        self.client
            .submit(&DetachVolumeRequest::new(id), Some("volume"))
            .await
    }

    /// Resize a volume
    pub async fn resize(&self, request: ResizeVolumeRequest) -> Result<PendingJob<Volume>> {
        self.client.submit(&request, Some("volume")).await
    }

    /// List volumes
    pub async fn list(&self, request: ListVolumesRequest) -> Result<ListResponse<Volume>> {
        self.client.request_list(&request, "volume").await
    }

    /// Get a volume by id
    pub async fn get(&self, id: &str) -> Result<Volume> {
        let volumes = self.list(ListVolumesRequest::new().id(id)).await?;
        first_or_not_found("volume", id, volumes)
    }

    /// Delete a detached volume
    pub async fn delete(&self, id: &str) -> Result<SuccessResponse> {
        self.client.request(&DeleteVolumeRequest::new(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_gib() {
        let volume = Volume {
            size: Some(21_474_836_480),
            ..Default::default()
        };
        assert_eq!(volume.size_gib(), Some(20));
        assert_eq!(Volume::default().size_gib(), None);
    }
}
