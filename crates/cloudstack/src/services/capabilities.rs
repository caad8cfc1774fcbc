//! Cloud capabilities

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::params::api_request;
use crate::types::{Extra, flexible_bool, flexible_i64};
use serde::{Deserialize, Serialize};

/// Feature flags and limits of the cloud
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudstackversion: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub securitygroupsenabled: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub userpublictemplateenabled: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub kvmsnapshotenabled: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub allowusercreateprojects: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub supportelb: bool,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub customdiskofferingminsize: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub customdiskofferingmaxsize: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub apilimitmax: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub apilimitinterval: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

api_request!(
    /// Parameters for `listCapabilities`
    ListCapabilitiesRequest => "listCapabilities"
);

/// Handler for `listCapabilities`
pub struct CapabilitiesHandler {
    client: CloudStackClient,
}

impl CapabilitiesHandler {
    pub fn new(client: CloudStackClient) -> Self {
        Self { client }
    }

    /// Fetch the cloud's capabilities
    pub async fn get(&self) -> Result<Capabilities> {
        self.client
            .request_object(&ListCapabilitiesRequest::default(), "capability")
            .await
    }
}
