//! Security groups

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::jobs::PendingJob;
use crate::params::{
    api_request, id_constructor, int_setters, list_filters, list_setters, param_setters,
    tag_filter,
};
use crate::types::{Extra, ListResponse, SuccessResponse, Tag, flexible_i64};
use serde::{Deserialize, Serialize};

/// A security group and its rules
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityGroup {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingressrule: Vec<SecurityGroupRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub egressrule: Vec<SecurityGroupRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One ingress or egress rule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityGroupRule {
    #[serde(default)]
    pub ruleid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub startport: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub endport: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub securitygroupname: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

api_request!(
    /// Parameters for `createSecurityGroup`
    CreateSecurityGroupRequest => "createSecurityGroup"
);

impl CreateSecurityGroupRequest {
    pub fn new(name: impl Into<String>) -> Self {
        let mut request = Self::default();
        request.params.set("name", name);
        request
    }

    param_setters! {
        description => "description",
        account => "account",
        domain_id => "domainid",
        project_id => "projectid",
    }
}

api_request!(
    /// Parameters for `deleteSecurityGroup`
    DeleteSecurityGroupRequest => "deleteSecurityGroup"
);

impl DeleteSecurityGroupRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        id => "id",
        name => "name",
        account => "account",
        domain_id => "domainid",
        project_id => "projectid",
    }
}

api_request!(
    /// Parameters for `listSecurityGroups`
    ListSecurityGroupsRequest => "listSecurityGroups"
);

impl ListSecurityGroupsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        id => "id",
        security_group_name => "securitygroupname",
        virtual_machine_id => "virtualmachineid",
    }
    list_filters!();
    tag_filter!();
}

api_request!(
    /// Parameters for `authorizeSecurityGroupIngress`
    AuthorizeIngressRequest => "authorizeSecurityGroupIngress"
);

impl AuthorizeIngressRequest {
    /// `protocol` is `TCP`, `UDP`, `ICMP` or `ALL`
    pub fn new(protocol: impl Into<String>) -> Self {
        let mut request = Self::default();
        request.params.set("protocol", protocol);
        request
    }

    param_setters! {
        security_group_id => "securitygroupid",
        security_group_name => "securitygroupname",
        account => "account",
        domain_id => "domainid",
        project_id => "projectid",
    }
    int_setters! {
        start_port => "startport",
        end_port => "endport",
        icmp_type => "icmptype",
        icmp_code => "icmpcode",
    }
    list_setters! {
        cidr_list => "cidrlist",
    }

    /// Allow traffic from other groups, given as `account -> group name`
    #[must_use]
    pub fn user_security_groups(
        mut self,
        groups: &std::collections::HashMap<String, String>,
    ) -> Self {
        let mut entries: Vec<_> = groups.iter().collect();
        entries.sort();
        for (i, (account, group)) in entries.into_iter().enumerate() {
            self.params
                .set(&format!("usersecuritygrouplist[{}].account", i), account.as_str())
                .set(&format!("usersecuritygrouplist[{}].group", i), group.as_str());
        }
        self
    }
}

api_request!(
    /// Parameters for `revokeSecurityGroupIngress`
    RevokeIngressRequest => "revokeSecurityGroupIngress"
);

impl RevokeIngressRequest {
    id_constructor!("id");
}

/// Handler for security groups
pub struct SecurityGroupHandler {
    client: CloudStackClient,
}

impl SecurityGroupHandler {
    pub fn new(client: CloudStackClient) -> Self {
        Self { client }
    }

    /// Create a security group
    pub async fn create(&self, request: CreateSecurityGroupRequest) -> Result<SecurityGroup> {
        self.client.request_object(&request, "securitygroup").await
    }

    /// Delete a security group by id or name
    pub async fn delete(&self, request: DeleteSecurityGroupRequest) -> Result<SuccessResponse> {
        self.client.request(&request).await
    }

    /// List security groups
    pub async fn list(
        &self,
        request: ListSecurityGroupsRequest,
    ) -> Result<ListResponse<SecurityGroup>> {
        self.client.request_list(&request, "securitygroup").await
    }

    /// Add an ingress rule
    pub async fn authorize_ingress(
        &self,
        request: AuthorizeIngressRequest,
    ) -> Result<PendingJob<SecurityGroup>> {
        self.client.submit(&request, Some("securitygroup")).await
    }

    /// Remove an ingress rule by rule id
    pub async fn revoke_ingress(&self, rule_id: &str) -> Result<PendingJob<SuccessResponse>> {
        self.client
            .submit(&RevokeIngressRequest::new(rule_id), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ApiRequest;
    use std::collections::HashMap;

    #[test]
    fn test_authorize_ingress_params() {
        let groups = HashMap::from([("admin".to_string(), "web".to_string())]);
        let request = AuthorizeIngressRequest::new("TCP")
            .security_group_name("default")
            .start_port(22)
            .end_port(22)
            .cidr_list(["10.0.0.0/8", "192.168.0.0/16"])
            .user_security_groups(&groups);

        let params = request.params();
        assert_eq!(params.get("protocol"), Some("TCP"));
        assert_eq!(params.get("startport"), Some("22"));
        assert_eq!(params.get("cidrlist"), Some("10.0.0.0/8,192.168.0.0/16"));
        assert_eq!(params.get("usersecuritygrouplist[0].account"), Some("admin"));
        assert_eq!(params.get("usersecuritygrouplist[0].group"), Some("web"));
    }
}
