//! Zones
//!
//! ```rust,no_run
//! # use cloudstack::{CloudStackClient, ZoneHandler, services::zones::ListZonesRequest};
//! # async fn example(client: CloudStackClient) -> cloudstack::Result<()> {
//! let zones = ZoneHandler::new(client)
//!     .list(ListZonesRequest::new().available(true))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::params::{api_request, bool_setters, int_setters, param_setters};
use crate::services::{exactly_one, first_or_not_found};
use crate::types::{Extra, ListResponse, Tag, flexible_bool};
use serde::{Deserialize, Serialize};

/// An availability zone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Zone {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networktype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocationstate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub securitygroupsenabled: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub localstorageenabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub extra: Extra,
}

api_request!(
    /// Parameters for `listZones`
    ListZonesRequest => "listZones"
);

impl ListZonesRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        id => "id",
        name => "name",
        keyword => "keyword",
        domain_id => "domainid",
        /// `Basic` or `Advanced`
        network_type => "networktype",
    }
    bool_setters! {
        /// Only zones the caller may deploy into
        available => "available",
        show_capacities => "showcapacities",
    }
    int_setters! {
        page => "page",
        page_size => "pagesize",
    }
}

/// Handler for zone queries
pub struct ZoneHandler {
    client: CloudStackClient,
}

impl ZoneHandler {
    pub fn new(client: CloudStackClient) -> Self {
        Self { client }
    }

    /// List zones
    pub async fn list(&self, request: ListZonesRequest) -> Result<ListResponse<Zone>> {
        self.client.request_list(&request, "zone").await
    }

    /// Get a zone by id
    pub async fn get(&self, id: &str) -> Result<Zone> {
        let zones = self.list(ListZonesRequest::new().id(id)).await?;
        first_or_not_found("zone", id, zones)
    }

    /// Get a zone by exact name
    pub async fn get_by_name(&self, name: &str) -> Result<Zone> {
        let zones = self.list(ListZonesRequest::new().name(name)).await?;
        exactly_one("zone", name, zones, |z| z.name.as_str())
    }

    /// Resolve a zone name to its id
    pub async fn get_id(&self, name: &str) -> Result<String> {
        Ok(self.get_by_name(name).await?.id)
    }
}
