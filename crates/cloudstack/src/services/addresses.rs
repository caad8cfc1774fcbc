//! Public IP addresses

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::jobs::PendingJob;
use crate::params::{
    api_request, bool_setters, id_constructor, list_filters, param_setters, tag_filter,
};
use crate::types::{Extra, ListResponse, SuccessResponse, Tag, flexible_bool};
use serde::{Deserialize, Serialize};

/// A public IP address
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublicIpAddress {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub ipaddress: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoneid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zonename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associatednetworkid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associatednetworkname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpcid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtualmachineid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtualmachinename: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub issourcenat: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub isstaticnat: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub extra: Extra,
}

api_request!(
    /// Parameters for `associateIpAddress`
    AssociateIpAddressRequest => "associateIpAddress"
);

impl AssociateIpAddressRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        /// Network to acquire the address for
        network_id => "networkid",
        vpc_id => "vpcid",
        zone_id => "zoneid",
        /// Request a specific address
        ip_address => "ipaddress",
        account => "account",
        domain_id => "domainid",
        project_id => "projectid",
    }
    bool_setters! {
        is_portable => "isportable",
    }
}

api_request!(
    /// Parameters for `disassociateIpAddress`
    DisassociateIpAddressRequest => "disassociateIpAddress"
);

impl DisassociateIpAddressRequest {
    id_constructor!("id");
}

api_request!(
    /// Parameters for `listPublicIpAddresses`
    ListPublicIpAddressesRequest => "listPublicIpAddresses"
);

impl ListPublicIpAddressesRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        id => "id",
        ip_address => "ipaddress",
        associated_network_id => "associatednetworkid",
        vpc_id => "vpcid",
        zone_id => "zoneid",
        state => "state",
    }
    bool_setters! {
        is_source_nat => "issourcenat",
        is_static_nat => "isstaticnat",
        /// Only addresses acquired by an account
        allocated_only => "allocatedonly",
    }
    list_filters!();
    tag_filter!();
}

/// Handler for public IP addresses
pub struct AddressHandler {
    client: CloudStackClient,
}

impl AddressHandler {
    pub fn new(client: CloudStackClient) -> Self {
        Self { client }
    }

    /// Acquire a public IP address
    pub async fn associate(
        &self,
        request: AssociateIpAddressRequest,
    ) -> Result<PendingJob<PublicIpAddress>> {
        self.client.submit(&request, Some("ipaddress")).await
    }

    /// Release a public IP address
    pub async fn disassociate(&self, id: &str) -> Result<PendingJob<SuccessResponse>> {
        self.client
            .submit(&DisassociateIpAddressRequest::new(id), None)
            .await
    }

    /// List public IP addresses
    pub async fn list(
        &self,
        request: ListPublicIpAddressesRequest,
    ) -> Result<ListResponse<PublicIpAddress>> {
        self.client.request_list(&request, "publicipaddress").await
    }
}
