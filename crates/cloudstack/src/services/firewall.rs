//! Firewall and port forwarding rules

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::jobs::PendingJob;
use crate::params::{
    api_request, bool_setters, id_constructor, int_setters, list_filters, list_setters,
    param_setters, tag_filter,
};
use crate::types::{Extra, ListResponse, SuccessResponse, Tag, flexible_i64};
use serde::{Deserialize, Serialize};

/// An ingress firewall rule on a public IP
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirewallRule {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub startport: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub endport: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidrlist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipaddressid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipaddress: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A port forwarding rule from a public IP to a VM
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortForwardingRule {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub publicport: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub publicendport: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub privateport: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub privateendport: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipaddressid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipaddress: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtualmachineid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtualmachinename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidrlist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub extra: Extra,
}

api_request!(
    /// Parameters for `createFirewallRule`
    CreateFirewallRuleRequest => "createFirewallRule"
);

impl CreateFirewallRuleRequest {
    /// `protocol` is `TCP`, `UDP`, `ICMP` or `ALL`
    pub fn new(ip_address_id: impl Into<String>, protocol: impl Into<String>) -> Self {
        let mut request = Self::default();
        request
            .params
            .set("ipaddressid", ip_address_id)
            .set("protocol", protocol);
        request
    }

    int_setters! {
        start_port => "startport",
        end_port => "endport",
        icmp_type => "icmptype",
        icmp_code => "icmpcode",
    }
    list_setters! {
        /// Source CIDRs, defaults to `0.0.0.0/0`
        cidr_list => "cidrlist",
    }
}

api_request!(
    /// Parameters for `deleteFirewallRule`
    DeleteFirewallRuleRequest => "deleteFirewallRule"
);

impl DeleteFirewallRuleRequest {
    id_constructor!("id");
}

api_request!(
    /// Parameters for `listFirewallRules`
    ListFirewallRulesRequest => "listFirewallRules"
);

impl ListFirewallRulesRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        id => "id",
        ip_address_id => "ipaddressid",
        network_id => "networkid",
    }
    list_filters!();
    tag_filter!();
}

api_request!(
    /// Parameters for `createPortForwardingRule`
    CreatePortForwardingRuleRequest => "createPortForwardingRule"
);

impl CreatePortForwardingRuleRequest {
    pub fn new(
        ip_address_id: impl Into<String>,
        protocol: impl Into<String>,
        public_port: i64,
        private_port: i64,
        virtual_machine_id: impl Into<String>,
    ) -> Self {
        let mut request = Self::default();
        request
            .params
            .set("ipaddressid", ip_address_id)
            .set("protocol", protocol)
            .set_int("publicport", public_port)
            .set_int("privateport", private_port)
            .set("virtualmachineid", virtual_machine_id);
        request
    }

    int_setters! {
        public_end_port => "publicendport",
        private_end_port => "privateendport",
    }
    param_setters! {
        network_id => "networkid",
        /// Guest IP of the VM when it has several
        vm_guest_ip => "vmguestip",
    }
    list_setters! {
        cidr_list => "cidrlist",
    }
    bool_setters! {
        /// Also open the public port in the firewall
        open_firewall => "openfirewall",
    }
}

api_request!(
    /// Parameters for `deletePortForwardingRule`
    DeletePortForwardingRuleRequest => "deletePortForwardingRule"
);

impl DeletePortForwardingRuleRequest {
    id_constructor!("id");
}

api_request!(
    /// Parameters for `listPortForwardingRules`
    ListPortForwardingRulesRequest => "listPortForwardingRules"
);

impl ListPortForwardingRulesRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        id => "id",
        ip_address_id => "ipaddressid",
        network_id => "networkid",
    }
    list_filters!();
    tag_filter!();
}

/// Handler for firewall and port forwarding rules
pub struct FirewallHandler {
    client: CloudStackClient,
}

impl FirewallHandler {
    pub fn new(client: CloudStackClient) -> Self {
        Self { client }
    }

    /// Open ports on a public IP
    pub async fn create_rule(
        &self,
        request: CreateFirewallRuleRequest,
    ) -> Result<PendingJob<FirewallRule>> {
        self.client.submit(&request, Some("firewallrule")).await
    }

    /// Delete a firewall rule
    pub async fn delete_rule(&self, id: &str) -> Result<PendingJob<SuccessResponse>> {
        self.client
            .submit(&DeleteFirewallRuleRequest::new(id), None)
            .await
    }

    /// List firewall rules
    pub async fn list_rules(
        &self,
        request: ListFirewallRulesRequest,
    ) -> Result<ListResponse<FirewallRule>> {
        self.client.request_list(&request, "firewallrule").await
    }

    /// Forward a public port to a VM
    pub async fn create_port_forwarding(
        &self,
        request: CreatePortForwardingRuleRequest,
    ) -> Result<PendingJob<PortForwardingRule>> {
        self.client.submit(&request, Some("portforwardingrule")).await
    }

    /// Delete a port forwarding rule
    pub async fn delete_port_forwarding(&self, id: &str) -> Result<PendingJob<SuccessResponse>> {
        self.client
            .submit(&DeletePortForwardingRuleRequest::new(id), None)
            .await
    }

    /// List port forwarding rules
    pub async fn list_port_forwarding(
        &self,
        request: ListPortForwardingRulesRequest,
    ) -> Result<ListResponse<PortForwardingRule>> {
        self.client
            .request_list(&request, "portforwardingrule")
            .await
    }
}
