//! Guest networks and network offerings

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::jobs::PendingJob;
use crate::params::{
    api_request, bool_setters, id_constructor, list_filters, param_setters, tag_filter,
};
use crate::services::{exactly_one, first_or_not_found};
use crate::types::{Extra, ListResponse, SuccessResponse, Tag, flexible_bool};
use serde::{Deserialize, Serialize};

/// A guest network
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displaytext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// `Isolated`, `Shared` or `L2`
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub network_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoneid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zonename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networkofferingid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networkofferingname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpcid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub isdefault: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub restartrequired: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A network offering
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkOffering {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displaytext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guestiptype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffictype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub isdefault: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub forvpc: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

api_request!(
    /// Parameters for `createNetwork`
    CreateNetworkRequest => "createNetwork"
);

impl CreateNetworkRequest {
    pub fn new(
        name: impl Into<String>,
        network_offering_id: impl Into<String>,
        zone_id: impl Into<String>,
    ) -> Self {
        let mut request = Self::default();
        request
            .params
            .set("name", name)
            .set("networkofferingid", network_offering_id)
            .set("zoneid", zone_id);
        request
    }

    param_setters! {
        display_text => "displaytext",
        gateway => "gateway",
        netmask => "netmask",
        start_ip => "startip",
        end_ip => "endip",
        vlan => "vlan",
        network_domain => "networkdomain",
        vpc_id => "vpcid",
        acl_id => "aclid",
        account => "account",
        domain_id => "domainid",
        project_id => "projectid",
    }
}

api_request!(
    /// Parameters for `listNetworks`
    ListNetworksRequest => "listNetworks"
);

impl ListNetworksRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        id => "id",
        zone_id => "zoneid",
        vpc_id => "vpcid",
        /// `Isolated`, `Shared` or `L2`
        network_type => "type",
        traffic_type => "traffictype",
        network_offering_id => "networkofferingid",
    }
    bool_setters! {
        is_system => "issystem",
        can_use_for_deploy => "canusefordeploy",
    }
    list_filters!();
    tag_filter!();
}

api_request!(
    /// Parameters for `updateNetwork`
    UpdateNetworkRequest => "updateNetwork"
);

impl UpdateNetworkRequest {
    id_constructor!("id");

    param_setters! {
        name => "name",
        display_text => "displaytext",
        network_domain => "networkdomain",
        /// Move the network to another offering
        network_offering_id => "networkofferingid",
        guest_vm_cidr => "guestvmcidr",
    }
}

api_request!(
    /// Parameters for `deleteNetwork`
    DeleteNetworkRequest => "deleteNetwork"
);

impl DeleteNetworkRequest {
    id_constructor!("id");

    bool_setters! {
        forced => "forced",
    }
}

api_request!(
    /// Parameters for `restartNetwork`
    RestartNetworkRequest => "restartNetwork"
);

impl RestartNetworkRequest {
    id_constructor!("id");

    bool_setters! {
        /// Recreate the network elements
        cleanup => "cleanup",
        make_redundant => "makeredundant",
    }
}

api_request!(
    /// Parameters for `listNetworkOfferings`
    ListNetworkOfferingsRequest => "listNetworkOfferings"
);

impl ListNetworkOfferingsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        id => "id",
        name => "name",
        zone_id => "zoneid",
        /// `Isolated` or `Shared`
        guest_ip_type => "guestiptype",
        state => "state",
    }
    bool_setters! {
        for_vpc => "forvpc",
        is_default => "isdefault",
    }
    list_filters!();
}

/// Handler for networks
pub struct NetworkHandler {
    client: CloudStackClient,
}

impl NetworkHandler {
    pub fn new(client: CloudStackClient) -> Self {
        Self { client }
    }

    /// Create a guest network
    pub async fn create(&self, request: CreateNetworkRequest) -> Result<Network> {
        self.client.request_object(&request, "network").await
    }

    /// List networks
    pub async fn list(&self, request: ListNetworksRequest) -> Result<ListResponse<Network>> {
        self.client.request_list(&request, "network").await
    }

    /// Get a network by id
    pub async fn get(&self, id: &str) -> Result<Network> {
        let networks = self.list(ListNetworksRequest::new().id(id)).await?;
        first_or_not_found("network", id, networks)
    }

    /// Resolve a network name to its id
    ///
    /// `listNetworks` has no name filter, so this searches by keyword.
    pub async fn get_id(&self, name: &str) -> Result<String> {
        let networks = self.list(ListNetworksRequest::new().keyword(name)).await?;
        Ok(exactly_one("network", name, networks, |n| n.name.as_str())?.id)
    }

    /// Update a network
    pub async fn update(&self, request: UpdateNetworkRequest) -> Result<PendingJob<Network>> {
        self.client.submit(&request, Some("network")).await
    }

    /// Delete a network
    pub async fn delete(
        &self,
        request: DeleteNetworkRequest,
    ) -> Result<PendingJob<SuccessResponse>> {
        self.client.submit(&request, None).await
    }

    /// Restart a network
    pub async fn restart(
        &self,
        request: RestartNetworkRequest,
    ) -> Result<PendingJob<SuccessResponse>> {
        self.client.submit(&request, None).await
    }

    /// List network offerings
    pub async fn list_offerings(
        &self,
        request: ListNetworkOfferingsRequest,
    ) -> Result<ListResponse<NetworkOffering>> {
        self.client.request_list(&request, "networkoffering").await
    }
}
