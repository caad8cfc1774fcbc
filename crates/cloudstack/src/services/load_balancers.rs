//! Load balancer rules

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::jobs::PendingJob;
use crate::params::{
    api_request, bool_setters, id_constructor, list_filters, list_setters, param_setters,
    tag_filter,
};
use crate::services::virtual_machines::VirtualMachine;
use crate::types::{Extra, ListResponse, SuccessResponse, Tag};
use serde::{Deserialize, Serialize};

/// A load balancer rule on a public IP
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadBalancerRule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `roundrobin`, `leastconn` or `source`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Ports are strings in this response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publicport: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privateport: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publicipid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publicip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networkid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoneid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidrlist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub extra: Extra,
}

api_request!(
    /// Parameters for `createLoadBalancerRule`
    CreateLoadBalancerRuleRequest => "createLoadBalancerRule"
);

impl CreateLoadBalancerRuleRequest {
    pub fn new(
        name: impl Into<String>,
        algorithm: impl Into<String>,
        public_port: i64,
        private_port: i64,
    ) -> Self {
        let mut request = Self::default();
        request
            .params
            .set("name", name)
            .set("algorithm", algorithm)
            .set_int("publicport", public_port)
            .set_int("privateport", private_port);
        request
    }

    param_setters! {
        public_ip_id => "publicipid",
        network_id => "networkid",
        zone_id => "zoneid",
        description => "description",
        /// `tcp`, `udp` or `tcp-proxy`
        protocol => "protocol",
        account => "account",
        domain_id => "domainid",
    }
    list_setters! {
        cidr_list => "cidrlist",
    }
    bool_setters! {
        open_firewall => "openfirewall",
    }
}

api_request!(
    /// Parameters for `updateLoadBalancerRule`
    UpdateLoadBalancerRuleRequest => "updateLoadBalancerRule"
);

impl UpdateLoadBalancerRuleRequest {
    id_constructor!("id");

    param_setters! {
        name => "name",
        algorithm => "algorithm",
        description => "description",
        protocol => "protocol",
    }
}

api_request!(
    /// Parameters for `deleteLoadBalancerRule`
    DeleteLoadBalancerRuleRequest => "deleteLoadBalancerRule"
);

impl DeleteLoadBalancerRuleRequest {
    id_constructor!("id");
}

api_request!(
    /// Parameters for `assignToLoadBalancerRule`
    AssignToLoadBalancerRuleRequest => "assignToLoadBalancerRule"
);

impl AssignToLoadBalancerRuleRequest {
    pub fn new<I, S>(id: impl Into<String>, virtual_machine_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut request = Self::default();
        request
            .params
            .set("id", id)
            .set_list("virtualmachineids", virtual_machine_ids);
        request
    }
}

api_request!(
    /// Parameters for `removeFromLoadBalancerRule`
    RemoveFromLoadBalancerRuleRequest => "removeFromLoadBalancerRule"
);

impl RemoveFromLoadBalancerRuleRequest {
    pub fn new<I, S>(id: impl Into<String>, virtual_machine_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut request = Self::default();
        request
            .params
            .set("id", id)
            .set_list("virtualmachineids", virtual_machine_ids);
        request
    }
}

api_request!(
    /// Parameters for `listLoadBalancerRules`
    ListLoadBalancerRulesRequest => "listLoadBalancerRules"
);

impl ListLoadBalancerRulesRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        id => "id",
        name => "name",
        public_ip_id => "publicipid",
        network_id => "networkid",
        virtual_machine_id => "virtualmachineid",
        zone_id => "zoneid",
    }
    list_filters!();
    tag_filter!();
}

api_request!(
    /// Parameters for `listLoadBalancerRuleInstances`
    ListLoadBalancerRuleInstancesRequest => "listLoadBalancerRuleInstances"
);

impl ListLoadBalancerRuleInstancesRequest {
    id_constructor!("id");

    bool_setters! {
        /// List VMs that could be assigned rather than assigned ones
        applied => "applied",
    }
    list_filters!();
}

/// Handler for load balancer rules
pub struct LoadBalancerHandler {
    client: CloudStackClient,
}

impl LoadBalancerHandler {
    pub fn new(client: CloudStackClient) -> Self {
        Self { client }
    }

    /// Create a load balancer rule
    pub async fn create(
        &self,
        request: CreateLoadBalancerRuleRequest,
    ) -> Result<PendingJob<LoadBalancerRule>> {
        self.client.submit(&request, Some("loadbalancer")).await
    }

    /// Update a load balancer rule
    pub async fn update(
        &self,
        request: UpdateLoadBalancerRuleRequest,
    ) -> Result<PendingJob<LoadBalancerRule>> {
        self.client.submit(&request, Some("loadbalancer")).await
    }

    /// Delete a load balancer rule
    pub async fn delete(&self, id: &str) -> Result<PendingJob<SuccessResponse>> {
        self.client
            .submit(&DeleteLoadBalancerRuleRequest::new(id), None)
            .await
    }

    /// Add VMs to a rule
    pub async fn assign(
        &self,
        request: AssignToLoadBalancerRuleRequest,
    ) -> Result<PendingJob<SuccessResponse>> {
        self.client.submit(&request, None).await
    }

    /// Remove VMs from a rule
    pub async fn remove(
        &self,
        request: RemoveFromLoadBalancerRuleRequest,
    ) -> Result<PendingJob<SuccessResponse>> {
        self.client.submit(&request, None).await
    }

    /// List load balancer rules
    pub async fn list(
        &self,
        request: ListLoadBalancerRulesRequest,
    ) -> Result<ListResponse<LoadBalancerRule>> {
        self.client
            .request_list(&request, "loadbalancerrule")
            .await
    }

    /// List the VMs behind a rule
    pub async fn list_instances(
        &self,
        request: ListLoadBalancerRuleInstancesRequest,
    ) -> Result<ListResponse<VirtualMachine>> {
        self.client
            .request_list(&request, "loadbalancerruleinstance")
            .await
    }
}
