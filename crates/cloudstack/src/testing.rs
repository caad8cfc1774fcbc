//! Test helpers for code built on this crate
//!
//! Enabled with the `testing` feature. [`MockCloudStackServer`] runs a
//! wiremock server that speaks the CloudStack envelope format, and the
//! fixture builders produce realistic response objects.
//!
//! ```rust,ignore
//! use cloudstack::testing::{MockCloudStackServer, VirtualMachineFixture};
//! use cloudstack::VirtualMachineHandler;
//!
//! #[tokio::test]
//! async fn test_get_vm() {
//!     let server = MockCloudStackServer::start().await;
//!     server
//!         .mock_list(
//!             "listVirtualMachines",
//!             "virtualmachine",
//!             vec![VirtualMachineFixture::new("vm-1", "web-1").build()],
//!         )
//!         .await;
//!
//!     let vm = VirtualMachineHandler::new(server.client()).get("vm-1").await.unwrap();
//!     assert_eq!(vm.name, "web-1");
//! }
//! ```

use crate::client::{CloudStackClient, RetryPolicy};
use crate::signer::{Signer, canonical_query};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::path;
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// API key the mock server's client signs with
pub const TEST_API_KEY: &str = "test-api-key";

/// Secret key the mock server's client signs with
pub const TEST_SECRET_KEY: &str = "test-secret-key";

/// Path the client posts to
pub const API_PATH: &str = "/client/api";

/// A wiremock server preloaded with CloudStack conventions
pub struct MockCloudStackServer {
    server: MockServer,
}

impl MockCloudStackServer {
    /// Start a server on a random local port
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Full API endpoint URL
    pub fn api_url(&self) -> String {
        format!("{}{}", self.server.uri(), API_PATH)
    }

    /// A client pointed at this server with fast polling and retries
    pub fn client(&self) -> CloudStackClient {
        self.client_builder()
            .build()
            .unwrap_or_else(|e| panic!("mock client configuration is valid: {}", e))
    }

    /// Builder preconfigured for this server, for tests that need to tweak
    /// timeouts
    pub fn client_builder(&self) -> crate::client::CloudStackClientBuilder {
        CloudStackClient::builder()
            .api_url(self.api_url())
            .api_key(TEST_API_KEY)
            .secret_key(TEST_SECRET_KEY)
            .poll_interval(Duration::from_millis(10))
            .async_timeout(Duration::from_secs(5))
            .retry(RetryPolicy {
                max_attempts: 3,
                initial_backoff: Duration::from_millis(5),
                max_backoff: Duration::from_millis(20),
            })
    }

    /// The underlying wiremock server, for custom mocks
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    /// Respond to `command` with `inner` wrapped in its envelope
    pub async fn mock_command(&self, command: &str, inner: Value) {
        Mock::given(path(API_PATH))
            .and(CommandMatcher::new(command))
            .respond_with(envelope(command, 200, inner))
            .mount(&self.server)
            .await;
    }

    /// Respond to `command` with a list response
    pub async fn mock_list(&self, command: &str, key: &str, items: Vec<Value>) {
        self.mock_command(command, list_response(key, items)).await;
    }

    /// Respond to `command` with a CloudStack error
    pub async fn mock_error(&self, command: &str, errorcode: u16, errortext: &str) {
        Mock::given(path(API_PATH))
            .and(CommandMatcher::new(command))
            .respond_with(envelope(
                command,
                errorcode,
                json!({
                    "uuidList": [],
                    "errorcode": errorcode,
                    "cserrorcode": 4350,
                    "errortext": errortext,
                }),
            ))
            .mount(&self.server)
            .await;
    }

    /// Mock an async command that finishes after `pending_polls` pending
    /// responses
    ///
    /// `final_job` is the job returned once the pending polls are used up,
    /// usually built with [`AsyncJobFixture`].
    pub async fn mock_async_command(
        &self,
        command: &str,
        job_id: &str,
        resource_id: Option<&str>,
        pending_polls: u64,
        final_job: Value,
    ) {
        let mut submission = json!({ "jobid": job_id });
        if let Some(id) = resource_id {
            submission["id"] = json!(id);
        }
        self.mock_command(command, submission).await;
        self.mock_job(job_id, pending_polls, final_job).await;
    }

    /// Mock `queryAsyncJobResult` for one job
    pub async fn mock_job(&self, job_id: &str, pending_polls: u64, final_job: Value) {
        if pending_polls > 0 {
            Mock::given(path(API_PATH))
                .and(CommandMatcher::new("queryAsyncJobResult"))
                .and(ParamMatcher::new("jobid", job_id))
                .respond_with(envelope(
                    "queryAsyncJobResult",
                    200,
                    AsyncJobFixture::pending(job_id).build(),
                ))
                .up_to_n_times(pending_polls)
                .with_priority(1)
                .mount(&self.server)
                .await;
        }

        Mock::given(path(API_PATH))
            .and(CommandMatcher::new("queryAsyncJobResult"))
            .and(ParamMatcher::new("jobid", job_id))
            .respond_with(envelope("queryAsyncJobResult", 200, final_job))
            .with_priority(2)
            .mount(&self.server)
            .await;
    }

    /// Commands received so far, in order
    pub async fn received_commands(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|r| request_params(r).into_iter().find(|(k, _)| k == "command"))
            .map(|(_, v)| v)
            .collect()
    }

    /// Parameters of every request for `command`, in order
    pub async fn received_params(&self, command: &str) -> Vec<Vec<(String, String)>> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(request_params)
            .filter(|params| params.iter().any(|(k, v)| k == "command" && v == command))
            .collect()
    }
}

/// Wrap `inner` in the `<command>response` envelope
pub fn envelope(command: &str, status: u16, inner: Value) -> ResponseTemplate {
    let key = format!("{}response", command.to_lowercase());
    ResponseTemplate::new(status).set_body_json(json!({ key: inner }))
}

/// Build a list response body
pub fn list_response(key: &str, items: Vec<Value>) -> Value {
    if items.is_empty() {
        return json!({});
    }
    json!({ "count": items.len(), key: items })
}

/// Decoded parameters of a request, from its query string or form body
pub fn request_params(request: &Request) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = request
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if params.is_empty() {
        params = url::form_urlencoded::parse(&request.body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
    }
    params
}

/// Matches requests carrying `key=value`, in the query or a form body
pub struct ParamMatcher {
    key: String,
    value: String,
}

impl ParamMatcher {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Match for ParamMatcher {
    fn matches(&self, request: &Request) -> bool {
        request_params(request)
            .iter()
            .any(|(k, v)| *k == self.key && *v == self.value)
    }
}

/// Matches requests for one CloudStack command
pub struct CommandMatcher(ParamMatcher);

impl CommandMatcher {
    pub fn new(command: impl Into<String>) -> Self {
        Self(ParamMatcher::new("command", command))
    }
}

impl Match for CommandMatcher {
    fn matches(&self, request: &Request) -> bool {
        self.0.matches(request)
    }
}

/// Matches requests whose signature verifies against a secret key
pub struct SignatureMatcher {
    signer: Signer,
}

impl SignatureMatcher {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            signer: Signer::new(secret_key),
        }
    }
}

impl Match for SignatureMatcher {
    fn matches(&self, request: &Request) -> bool {
        let params = request_params(request);
        let Some((_, signature)) = params.iter().find(|(k, _)| k == "signature") else {
            return false;
        };
        let query = canonical_query(
            params
                .iter()
                .filter(|(k, _)| k != "signature")
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        self.signer.signature(&query) == *signature
    }
}

/// Builder for `queryAsyncJobResult` bodies
pub struct AsyncJobFixture {
    job: Value,
}

impl AsyncJobFixture {
    /// A job that is still running
    pub fn pending(job_id: &str) -> Self {
        Self {
            job: json!({
                "jobid": job_id,
                "jobstatus": 0,
                "jobprocstatus": 0,
                "jobresultcode": 0,
                "created": "2024-05-01T10:00:00+0000",
            }),
        }
    }

    /// A finished job whose result holds `object` under `key`
    pub fn succeeded(job_id: &str, key: &str, object: Value) -> Self {
        let mut fixture = Self::pending(job_id);
        fixture.job["jobstatus"] = json!(1);
        fixture.job["jobresulttype"] = json!("object");
        fixture.job["jobresult"] = json!({ key: object });
        fixture
    }

    /// A finished job with a bare `{"success": true}` result
    pub fn success(job_id: &str) -> Self {
        let mut fixture = Self::pending(job_id);
        fixture.job["jobstatus"] = json!(1);
        fixture.job["jobresulttype"] = json!("object");
        fixture.job["jobresult"] = json!({ "success": true });
        fixture
    }

    /// A failed job
    pub fn failed(job_id: &str, errorcode: i64, errortext: &str) -> Self {
        let mut fixture = Self::pending(job_id);
        fixture.job["jobstatus"] = json!(2);
        fixture.job["jobresultcode"] = json!(530);
        fixture.job["jobresulttype"] = json!("object");
        fixture.job["jobresult"] = json!({ "errorcode": errorcode, "errortext": errortext });
        fixture
    }

    pub fn command(mut self, cmd: &str) -> Self {
        self.job["cmd"] = json!(cmd);
        self
    }

    pub fn instance(mut self, instance_type: &str, instance_id: &str) -> Self {
        self.job["jobinstancetype"] = json!(instance_type);
        self.job["jobinstanceid"] = json!(instance_id);
        self
    }

    pub fn build(self) -> Value {
        self.job
    }
}

/// Builder for zone objects
pub struct ZoneFixture {
    zone: Value,
}

impl ZoneFixture {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            zone: json!({
                "id": id,
                "name": name,
                "networktype": "Advanced",
                "allocationstate": "Enabled",
                "securitygroupsenabled": false,
                "localstorageenabled": false,
                "dns1": "8.8.8.8",
            }),
        }
    }

    pub fn network_type(mut self, network_type: &str) -> Self {
        self.zone["networktype"] = json!(network_type);
        self
    }

    pub fn build(self) -> Value {
        self.zone
    }
}

/// Builder for virtual machine objects
pub struct VirtualMachineFixture {
    vm: Value,
}

impl VirtualMachineFixture {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            vm: json!({
                "id": id,
                "name": name,
                "displayname": name,
                "state": "Running",
                "zoneid": "zone-1",
                "zonename": "zone1",
                "templateid": "tpl-1",
                "templatename": "Ubuntu 22.04",
                "serviceofferingid": "so-1",
                "serviceofferingname": "Small Instance",
                "cpunumber": 1,
                "memory": 1024,
                "hypervisor": "KVM",
                "account": "admin",
                "domain": "ROOT",
                "passwordenabled": false,
                "haenable": false,
                "created": "2024-05-01T10:00:00+0000",
                "nic": [{
                    "id": format!("{}-nic-0", id),
                    "networkid": "net-1",
                    "networkname": "default-net",
                    "ipaddress": "10.1.1.10",
                    "macaddress": "02:00:11:22:33:44",
                    "gateway": "10.1.1.1",
                    "netmask": "255.255.255.0",
                    "type": "Isolated",
                    "isdefault": true,
                }],
                "tags": [],
            }),
        }
    }

    pub fn state(mut self, state: &str) -> Self {
        self.vm["state"] = json!(state);
        self
    }

    pub fn zone(mut self, id: &str, name: &str) -> Self {
        self.vm["zoneid"] = json!(id);
        self.vm["zonename"] = json!(name);
        self
    }

    pub fn ip_address(mut self, ip: &str) -> Self {
        self.vm["nic"][0]["ipaddress"] = json!(ip);
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.vm["passwordenabled"] = json!(true);
        self.vm["password"] = json!(password);
        self
    }

    pub fn build(self) -> Value {
        self.vm
    }
}

/// Builder for volume objects
pub struct VolumeFixture {
    volume: Value,
}

impl VolumeFixture {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            volume: json!({
                "id": id,
                "name": name,
                "state": "Allocated",
                "type": "DATADISK",
                "size": 10_737_418_240u64,
                "zoneid": "zone-1",
                "zonename": "zone1",
                "diskofferingid": "do-1",
                "diskofferingname": "Small",
                "account": "admin",
                "created": "2024-05-01T10:00:00+0000",
            }),
        }
    }

    pub fn attached_to(mut self, vm_id: &str, device_id: i64) -> Self {
        self.volume["state"] = json!("Ready");
        self.volume["virtualmachineid"] = json!(vm_id);
        self.volume["deviceid"] = json!(device_id);
        self
    }

    pub fn build(self) -> Value {
        self.volume
    }
}

/// Builder for snapshot objects
pub struct SnapshotFixture {
    snapshot: Value,
}

impl SnapshotFixture {
    pub fn new(id: &str, volume_id: &str) -> Self {
        Self {
            snapshot: json!({
                "id": id,
                "name": format!("{}_{}", volume_id, id),
                "state": "BackedUp",
                "volumeid": volume_id,
                "volumetype": "DATADISK",
                "snapshottype": "MANUAL",
                "intervaltype": "MANUAL",
                "account": "admin",
                "created": "2024-05-01T10:00:00+0000",
            }),
        }
    }

    pub fn build(self) -> Value {
        self.snapshot
    }
}

/// Builder for network objects
pub struct NetworkFixture {
    network: Value,
}

impl NetworkFixture {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            network: json!({
                "id": id,
                "name": name,
                "displaytext": name,
                "state": "Implemented",
                "type": "Isolated",
                "cidr": "10.1.1.0/24",
                "gateway": "10.1.1.1",
                "netmask": "255.255.255.0",
                "zoneid": "zone-1",
                "networkofferingid": "no-1",
                "isdefault": false,
                "restartrequired": false,
            }),
        }
    }

    pub fn build(self) -> Value {
        self.network
    }
}

/// Builder for public IP objects
pub struct PublicIpFixture {
    address: Value,
}

impl PublicIpFixture {
    pub fn new(id: &str, ip: &str) -> Self {
        Self {
            address: json!({
                "id": id,
                "ipaddress": ip,
                "state": "Allocated",
                "zoneid": "zone-1",
                "associatednetworkid": "net-1",
                "issourcenat": false,
                "isstaticnat": false,
                "allocated": "2024-05-01T10:00:00+0000",
            }),
        }
    }

    pub fn build(self) -> Value {
        self.address
    }
}

/// Builder for template objects
pub struct TemplateFixture {
    template: Value,
}

impl TemplateFixture {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            template: json!({
                "id": id,
                "name": name,
                "displaytext": name,
                "ostypename": "Ubuntu 22.04 LTS",
                "zoneid": "zone-1",
                "zonename": "zone-a",
                "hypervisor": "KVM",
                "format": "QCOW2",
                "templatetype": "USER",
                "status": "Download Complete",
                "size": 10737418240_i64,
                "isready": true,
            }),
        }
    }

    pub fn zone(mut self, id: &str, name: &str) -> Self {
        self.template["zoneid"] = json!(id);
        self.template["zonename"] = json!(name);
        self
    }

    pub fn not_ready(mut self) -> Self {
        self.template["isready"] = json!(false);
        self.template["status"] = json!("Downloading");
        self
    }

    pub fn build(self) -> Value {
        self.template
    }
}

/// Builder for service and disk offering objects
pub struct OfferingFixture {
    offering: Value,
}

impl OfferingFixture {
    /// A fixed-size compute offering
    pub fn service(id: &str, name: &str, cpus: i64, memory_mb: i64) -> Self {
        Self {
            offering: json!({
                "id": id,
                "name": name,
                "displaytext": name,
                "cpunumber": cpus,
                "cpuspeed": 1000,
                "memory": memory_mb,
                "storagetype": "shared",
                "iscustomized": false,
                "offerha": false,
            }),
        }
    }

    pub fn disk(id: &str, name: &str, size_gb: i64) -> Self {
        Self {
            offering: json!({
                "id": id,
                "name": name,
                "displaytext": name,
                "disksize": size_gb,
                "iscustomized": false,
                "storagetype": "shared",
            }),
        }
    }

    pub fn customized(mut self) -> Self {
        self.offering["iscustomized"] = json!(true);
        self
    }

    pub fn build(self) -> Value {
        self.offering
    }
}
