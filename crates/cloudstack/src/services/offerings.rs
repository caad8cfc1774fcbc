//! Service and disk offerings

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::params::{api_request, bool_setters, list_filters, param_setters};
use crate::services::{exactly_one, first_or_not_found};
use crate::types::{Extra, ListResponse, flexible_bool, flexible_i64};
use serde::{Deserialize, Serialize};

/// A compute offering
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceOffering {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displaytext: Option<String>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub cpunumber: Option<i64>,
    /// MHz per core
    #[serde(default, deserialize_with = "flexible_i64")]
    pub cpuspeed: Option<i64>,
    /// MiB
    #[serde(default, deserialize_with = "flexible_i64")]
    pub memory: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storagetype: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub iscustomized: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub offerha: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A data disk offering
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiskOffering {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displaytext: Option<String>,
    /// GiB, zero for custom-sized offerings
    #[serde(default, deserialize_with = "flexible_i64")]
    pub disksize: Option<i64>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub iscustomized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storagetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

api_request!(
    /// Parameters for `listServiceOfferings`
    ListServiceOfferingsRequest => "listServiceOfferings"
);

impl ListServiceOfferingsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        id => "id",
        name => "name",
        zone_id => "zoneid",
        /// Only offerings a given VM can be scaled to
        virtual_machine_id => "virtualmachineid",
    }
    bool_setters! {
        is_system => "issystem",
    }
    list_filters!();
}

api_request!(
    /// Parameters for `listDiskOfferings`
    ListDiskOfferingsRequest => "listDiskOfferings"
);

impl ListDiskOfferingsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        id => "id",
        name => "name",
        zone_id => "zoneid",
    }
    list_filters!();
}

/// Handler for compute offerings
pub struct ServiceOfferingHandler {
    client: CloudStackClient,
}

impl ServiceOfferingHandler {
    pub fn new(client: CloudStackClient) -> Self {
        Self { client }
    }

    /// List compute offerings
    pub async fn list(
        &self,
        request: ListServiceOfferingsRequest,
    ) -> Result<ListResponse<ServiceOffering>> {
        self.client.request_list(&request, "serviceoffering").await
    }

    /// Get a compute offering by id
    pub async fn get(&self, id: &str) -> Result<ServiceOffering> {
        let offerings = self.list(ListServiceOfferingsRequest::new().id(id)).await?;
        first_or_not_found("service offering", id, offerings)
    }

    /// Resolve a compute offering name to its id
    pub async fn get_id(&self, name: &str) -> Result<String> {
        let offerings = self
            .list(ListServiceOfferingsRequest::new().name(name))
            .await?;
        Ok(exactly_one("service offering", name, offerings, |o| o.name.as_str())?.id)
    }
}

/// Handler for disk offerings
pub struct DiskOfferingHandler {
    client: CloudStackClient,
}

impl DiskOfferingHandler {
    pub fn new(client: CloudStackClient) -> Self {
        Self { client }
    }

    /// List disk offerings
    pub async fn list(
        &self,
        request: ListDiskOfferingsRequest,
    ) -> Result<ListResponse<DiskOffering>> {
        self.client.request_list(&request, "diskoffering").await
    }

    /// Resolve a disk offering name to its id
    pub async fn get_id(&self, name: &str) -> Result<String> {
        let offerings = self.list(ListDiskOfferingsRequest::new().name(name)).await?;
        Ok(exactly_one("disk offering", name, offerings, |o| o.name.as_str())?.id)
    }
}
