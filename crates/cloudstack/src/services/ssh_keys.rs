//! SSH key pairs

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::params::{api_request, list_filters, param_setters};
use crate::types::{Extra, ListResponse, SuccessResponse};
use serde::{Deserialize, Serialize};

/// An SSH key pair registered with CloudStack
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SshKeyPair {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub fingerprint: String,
    /// Only returned by `createSSHKeyPair`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privatekey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

api_request!(
    /// Parameters for `createSSHKeyPair`
    CreateSshKeyPairRequest => "createSSHKeyPair"
);

impl CreateSshKeyPairRequest {
    pub fn new(name: impl Into<String>) -> Self {
        let mut request = Self::default();
        request.params.set("name", name);
        request
    }

    param_setters! {
        account => "account",
        domain_id => "domainid",
        project_id => "projectid",
    }
}

api_request!(
    /// Parameters for `registerSSHKeyPair`
    RegisterSshKeyPairRequest => "registerSSHKeyPair", post = true
);

impl RegisterSshKeyPairRequest {
    pub fn new(name: impl Into<String>, public_key: impl Into<String>) -> Self {
        let mut request = Self::default();
        request
            .params
            .set("name", name)
            .set("publickey", public_key);
        request
    }

    param_setters! {
        account => "account",
        domain_id => "domainid",
        project_id => "projectid",
    }
}

api_request!(
    /// Parameters for `listSSHKeyPairs`
    ListSshKeyPairsRequest => "listSSHKeyPairs"
);

impl ListSshKeyPairsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        name => "name",
        fingerprint => "fingerprint",
    }
    list_filters!();
}

api_request!(
    /// Parameters for `deleteSSHKeyPair`
    DeleteSshKeyPairRequest => "deleteSSHKeyPair"
);

impl DeleteSshKeyPairRequest {
    pub fn new(name: impl Into<String>) -> Self {
        let mut request = Self::default();
        request.params.set("name", name);
        request
    }

    param_setters! {
        account => "account",
        domain_id => "domainid",
        project_id => "projectid",
    }
}

/// Handler for SSH key pairs
pub struct SshKeyPairHandler {
    client: CloudStackClient,
}

impl SshKeyPairHandler {
    pub fn new(client: CloudStackClient) -> Self {
        Self { client }
    }

    /// Generate a key pair server-side; the private key is only returned once
    pub async fn create(&self, request: CreateSshKeyPairRequest) -> Result<SshKeyPair> {
        self.client.request_object(&request, "keypair").await
    }

    /// Register an existing public key
    pub async fn register(&self, request: RegisterSshKeyPairRequest) -> Result<SshKeyPair> {
        self.client.request_object(&request, "keypair").await
    }

    /// List key pairs
    pub async fn list(&self, request: ListSshKeyPairsRequest) -> Result<ListResponse<SshKeyPair>> {
        self.client.request_list(&request, "sshkeypair").await
    }

    /// Delete a key pair by name
    pub async fn delete(&self, request: DeleteSshKeyPairRequest) -> Result<SuccessResponse> {
        self.client.request(&request).await
    }
}
