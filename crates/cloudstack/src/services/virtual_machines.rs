//! Virtual machines
//!
//! Lifecycle commands (`deploy`, `start`, `stop`, `reboot`, `destroy`, ...)
//! are async and return a [`PendingJob`]; wait on it to get the updated
//! [`VirtualMachine`].
//!
//! ```rust,no_run
//! # use cloudstack::{CloudStackClient, VirtualMachineHandler};
//! # use cloudstack::services::virtual_machines::DeployVirtualMachineRequest;
//! # async fn example(client: CloudStackClient) -> cloudstack::Result<()> {
//! let vms = VirtualMachineHandler::new(client);
//! let job = vms
//!     .deploy(
//!         DeployVirtualMachineRequest::new("offering-id", "template-id", "zone-id")
//!             .name("web-1")
//!             .user_data("#cloud-config\n"),
//!     )
//!     .await?;
//! let vm = job.wait().await?;
//! println!("{} is {}", vm.name, vm.state.unwrap_or_default());
//! # Ok(())
//! # }
//! ```

use crate::client::CloudStackClient;
use crate::error::Result;
use crate::jobs::PendingJob;
use crate::params::{
    api_request, bool_setters, id_constructor, int_setters, list_filters, list_setters,
    param_setters, tag_filter,
};
use crate::services::{exactly_one, first_or_not_found};
use crate::types::{Extra, ListResponse, SuccessResponse, Tag, flexible_bool, flexible_i64};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A virtual machine instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VirtualMachine {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displayname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoneid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zonename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templateid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templatename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serviceofferingid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serviceofferingname: Option<String>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub cpunumber: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub memory: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domainid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypair: Option<String>,
    /// Only present right after deploy or password reset on
    /// password-enabled templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub passwordenabled: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub haenable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publicip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nic: Vec<Nic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl VirtualMachine {
    /// The default NIC, or the first one if none is flagged
    pub fn default_nic(&self) -> Option<&Nic> {
        self.nic
            .iter()
            .find(|n| n.isdefault)
            .or_else(|| self.nic.first())
    }

    /// IP address of the default NIC
    pub fn ip_address(&self) -> Option<&str> {
        self.default_nic().and_then(|n| n.ipaddress.as_deref())
    }
}

/// A network interface attached to a VM
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Nic {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networkid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networkname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipaddress: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip6address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macaddress: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub nic_type: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub isdefault: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Deserialize)]
struct VmPassword {
    #[serde(default)]
    encryptedpassword: String,
}

api_request!(
    /// Parameters for `deployVirtualMachine`
    ///
    /// Sent as POST since user data can be large.
    DeployVirtualMachineRequest => "deployVirtualMachine", post = true
);

impl DeployVirtualMachineRequest {
    pub fn new(
        service_offering_id: impl Into<String>,
        template_id: impl Into<String>,
        zone_id: impl Into<String>,
    ) -> Self {
        let mut request = Self::default();
        request
            .params
            .set("serviceofferingid", service_offering_id)
            .set("templateid", template_id)
            .set("zoneid", zone_id);
        request
    }

    param_setters! {
        /// Host name of the VM
        name => "name",
        display_name => "displayname",
        group => "group",
        /// SSH key pair to install
        key_pair => "keypair",
        /// Data disk to create along with the VM
        disk_offering_id => "diskofferingid",
        hypervisor => "hypervisor",
        host_id => "hostid",
        ip_address => "ipaddress",
        account => "account",
        domain_id => "domainid",
        project_id => "projectid",
    }
    list_setters! {
        network_ids => "networkids",
        security_group_ids => "securitygroupids",
        security_group_names => "securitygroupnames",
        affinity_group_ids => "affinitygroupids",
    }
    int_setters! {
        /// Data disk size in GiB for custom disk offerings
        size => "size",
        /// Root disk size in GiB
        root_disk_size => "rootdisksize",
    }
    bool_setters! {
        /// Set to false to create the VM without starting it
        start_vm => "startvm",
    }

    /// User data, base64-encoded before sending
    #[must_use]
    pub fn user_data(mut self, data: impl AsRef<[u8]>) -> Self {
        self.params.set("userdata", STANDARD.encode(data));
        self
    }

    /// Custom offering details such as `cpuNumber` or `memory`
    #[must_use]
    pub fn details(mut self, details: &HashMap<String, String>) -> Self {
        self.params.set_detail_map("details", details);
        self
    }
}

api_request!(
    /// Parameters for `listVirtualMachines`
    ListVirtualMachinesRequest => "listVirtualMachines"
);

impl ListVirtualMachinesRequest {
    pub fn new() -> Self {
        Self::default()
    }

    param_setters! {
        id => "id",
        name => "name",
        /// e.g. `Running`, `Stopped`
        state => "state",
        zone_id => "zoneid",
        template_id => "templateid",
        network_id => "networkid",
        host_id => "hostid",
        group_id => "groupid",
        service_offering_id => "serviceofferingid",
    }
    list_setters! {
        ids => "ids",
        /// Detail groups to include, e.g. `nics`, `stats`
        details => "details",
    }
    list_filters!();
    tag_filter!();
}

api_request!(
    /// Parameters for `startVirtualMachine`
    StartVirtualMachineRequest => "startVirtualMachine"
);

impl StartVirtualMachineRequest {
    id_constructor!("id");

    param_setters! {
        /// Admin only: start on a specific host
        host_id => "hostid",
    }
}

api_request!(
    /// Parameters for `stopVirtualMachine`
    StopVirtualMachineRequest => "stopVirtualMachine"
);

impl StopVirtualMachineRequest {
    id_constructor!("id");

    bool_setters! {
        /// Power off instead of a clean shutdown
        forced => "forced",
    }
}

api_request!(
    /// Parameters for `rebootVirtualMachine`
    RebootVirtualMachineRequest => "rebootVirtualMachine"
);

impl RebootVirtualMachineRequest {
    id_constructor!("id");
}

api_request!(
    /// Parameters for `destroyVirtualMachine`
    DestroyVirtualMachineRequest => "destroyVirtualMachine"
);

impl DestroyVirtualMachineRequest {
    id_constructor!("id");

    bool_setters! {
        /// Expunge immediately instead of keeping the VM recoverable
        expunge => "expunge",
    }
    list_setters! {
        /// Data volumes to delete along with the VM
        volume_ids => "volumeids",
    }
}

api_request!(
    /// Parameters for `resetPasswordForVirtualMachine`
    ResetPasswordRequest => "resetPasswordForVirtualMachine"
);

impl ResetPasswordRequest {
    id_constructor!("id");
}

api_request!(
    /// Parameters for `scaleVirtualMachine`
    ScaleVirtualMachineRequest => "scaleVirtualMachine"
);

impl ScaleVirtualMachineRequest {
    pub fn new(id: impl Into<String>, service_offering_id: impl Into<String>) -> Self {
        let mut request = Self::default();
        request
            .params
            .set("id", id)
            .set("serviceofferingid", service_offering_id);
        request
    }

    /// Custom offering details such as `cpuNumber` or `memory`
    #[must_use]
    pub fn details(mut self, details: &HashMap<String, String>) -> Self {
        self.params.set_detail_map("details", details);
        self
    }
}

api_request!(
    /// Parameters for `expungeVirtualMachine`
    ExpungeVirtualMachineRequest => "expungeVirtualMachine"
);

impl ExpungeVirtualMachineRequest {
    id_constructor!("id");
}

api_request!(
    /// Parameters for `recoverVirtualMachine`
    RecoverVirtualMachineRequest => "recoverVirtualMachine"
);

impl RecoverVirtualMachineRequest {
    id_constructor!("id");
}

api_request!(
    /// Parameters for `updateVirtualMachine`
    UpdateVirtualMachineRequest => "updateVirtualMachine", post = true
);

impl UpdateVirtualMachineRequest {
    id_constructor!("id");

    param_setters! {
        name => "name",
        display_name => "displayname",
        group => "group",
        os_type_id => "ostypeid",
    }
    bool_setters! {
        ha_enable => "haenable",
    }

    /// Replace the user data, base64-encoded before sending
    #[must_use]
    pub fn user_data(mut self, data: impl AsRef<[u8]>) -> Self {
        self.params.set("userdata", STANDARD.encode(data));
        self
    }
}

api_request!(
    /// Parameters for `changeServiceForVirtualMachine`
    ChangeServiceRequest => "changeServiceForVirtualMachine"
);

impl ChangeServiceRequest {
    pub fn new(id: impl Into<String>, service_offering_id: impl Into<String>) -> Self {
        let mut request = Self::default();
        request
            .params
            .set("id", id)
            .set("serviceofferingid", service_offering_id);
        request
    }

    /// Custom offering details such as `cpuNumber` or `memory`
    #[must_use]
    pub fn details(mut self, details: &HashMap<String, String>) -> Self {
        self.params.set_detail_map("details", details);
        self
    }
}

api_request!(
    /// Parameters for `getVMPassword`
    GetVmPasswordRequest => "getVMPassword"
);

impl GetVmPasswordRequest {
    id_constructor!("id");
}

/// Handler for virtual machines
pub struct VirtualMachineHandler {
    client: CloudStackClient,
}

impl VirtualMachineHandler {
    pub fn new(client: CloudStackClient) -> Self {
        Self { client }
    }

    /// Deploy a new VM
    pub async fn deploy(
        &self,
        request: DeployVirtualMachineRequest,
    ) -> Result<PendingJob<VirtualMachine>> {
        self.client.submit(&request, Some("virtualmachine")).await
    }

    /// List VMs
    pub async fn list(
        &self,
        request: ListVirtualMachinesRequest,
    ) -> Result<ListResponse<VirtualMachine>> {
        self.client.request_list(&request, "virtualmachine").await
    }

    /// Get a VM by id
    pub async fn get(&self, id: &str) -> Result<VirtualMachine> {
        let vms = self.list(ListVirtualMachinesRequest::new().id(id)).await?;
        first_or_not_found("virtual machine", id, vms)
    }

    /// Get a VM by exact name
    pub async fn get_by_name(&self, name: &str) -> Result<VirtualMachine> {
        let vms = self.list(ListVirtualMachinesRequest::new().name(name)).await?;
        exactly_one("virtual machine", name, vms, |vm| vm.name.as_str())
    }

    /// Resolve a VM name to its id
    pub async fn get_id(&self, name: &str) -> Result<String> {
        Ok(self.get_by_name(name).await?.id)
    }

    /// Start a stopped VM
    pub async fn start(
        &self,
        request: StartVirtualMachineRequest,
    ) -> Result<PendingJob<VirtualMachine>> {
        self.client.submit(&request, Some("virtualmachine")).await
    }

    /// Stop a running VM
    pub async fn stop(
        &self,
        request: StopVirtualMachineRequest,
    ) -> Result<PendingJob<VirtualMachine>> {
        self.client.submit(&request, Some("virtualmachine")).await
    }

    /// Reboot a VM
    pub async fn reboot(&self, id: &str) -> Result<PendingJob<VirtualMachine>> {
        self.client
            .submit(&RebootVirtualMachineRequest::new(id), Some("virtualmachine"))
            .await
    }

    /// Destroy a VM
    pub async fn destroy(
        &self,
        request: DestroyVirtualMachineRequest,
    ) -> Result<PendingJob<VirtualMachine>> {
        self.client.submit(&request, Some("virtualmachine")).await
    }

    /// Reset the password of a password-enabled VM
    ///
    /// The VM must be stopped. The new password is in
    /// [`VirtualMachine::password`] of the job result.
    pub async fn reset_password(&self, id: &str) -> Result<PendingJob<VirtualMachine>> {
        self.client
            .submit(&ResetPasswordRequest::new(id), Some("virtualmachine"))
            .await
    }

    /// Change the offering of a running VM
    pub async fn scale(
        &self,
        request: ScaleVirtualMachineRequest,
    ) -> Result<PendingJob<SuccessResponse>> {
        self.client.submit(&request, None).await
    }

    /// Permanently remove a destroyed VM
    pub async fn expunge(&self, id: &str) -> Result<PendingJob<SuccessResponse>> {
        self.client
            .submit(&ExpungeVirtualMachineRequest::new(id), None)
            .await
    }

    /// Recover a destroyed but not yet expunged VM
    pub async fn recover(&self, id: &str) -> Result<VirtualMachine> {
        self.client
            .request_object(&RecoverVirtualMachineRequest::new(id), "virtualmachine")
            .await
    }

    /// Update VM attributes
    pub async fn update(&self, request: UpdateVirtualMachineRequest) -> Result<VirtualMachine> {
        self.client
            .request_object(&request, "virtualmachine")
            .await
    }

    /// Change the offering of a stopped VM
    pub async fn change_service(&self, request: ChangeServiceRequest) -> Result<VirtualMachine> {
        self.client
            .request_object(&request, "virtualmachine")
            .await
    }

    /// Fetch the encrypted password of a VM deployed with a key pair
    ///
    /// The value is base64 and must be decrypted with the key pair's private
    /// key.
    pub async fn get_password(&self, id: &str) -> Result<String> {
        let password: VmPassword = self
            .client
            .request_object(&GetVmPasswordRequest::new(id), "password")
            .await?;
        Ok(password.encryptedpassword)
    }
}
