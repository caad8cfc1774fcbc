//! Rust client for the Apache CloudStack API
//!
//! Every CloudStack command is an HTTP GET (or POST) against a single
//! endpoint, signed with the caller's secret key. This crate provides:
//!
//! - [`CloudStackClient`]: signing, transport, envelope unwrapping, error
//!   mapping and retries for read-only commands
//! - typed request builders and handlers per API category in [`services`]
//! - [`PendingJob`] and [`AsyncJobHandler`] for async commands, which return
//!   a job id that has to be polled until it completes
//!
//! # Example
//!
//! ```rust,no_run
//! use cloudstack::{CloudStackClient, VirtualMachineHandler};
//! use cloudstack::services::virtual_machines::{
//!     DeployVirtualMachineRequest, ListVirtualMachinesRequest,
//! };
//!
//! # async fn example() -> cloudstack::Result<()> {
//! let client = CloudStackClient::builder()
//!     .api_url("https://cloud.example.com/client/api")
//!     .api_key("api-key")
//!     .secret_key("secret-key")
//!     .build()?;
//!
//! let vms = VirtualMachineHandler::new(client.clone());
//! for vm in vms.list(ListVirtualMachinesRequest::new().state("Running")).await? {
//!     println!("{} {:?}", vm.name, vm.ip_address());
//! }
//!
//! let vm = vms
//!     .deploy(DeployVirtualMachineRequest::new("offering", "template", "zone").name("web-2"))
//!     .await?
//!     .wait()
//!     .await?;
//! println!("deployed {}", vm.id);
//! # Ok(())
//! # }
//! ```
//!
//! Commands without a typed wrapper can be issued with
//! [`CloudStackClient::execute_raw`].

pub mod client;
pub mod error;
pub mod jobs;
pub mod params;
pub mod services;
pub mod signer;
pub mod types;

#[cfg(feature = "testing")]
pub mod testing;

pub use client::{
    CloudStackClient, CloudStackClientBuilder, DEFAULT_ASYNC_TIMEOUT, DEFAULT_POLL_INTERVAL,
    DEFAULT_TIMEOUT, RetryPolicy,
};
pub use error::{CloudStackError, Result};
pub use jobs::{AsyncJob, AsyncJobHandler, JobStatus, PendingJob};
pub use params::{ApiRequest, Params};
pub use services::{
    AddressHandler, CapabilitiesHandler, DiskOfferingHandler, FirewallHandler,
    LoadBalancerHandler, NetworkHandler, SecurityGroupHandler, ServiceOfferingHandler,
    SnapshotHandler, SshKeyPairHandler, TagHandler, TemplateHandler, VirtualMachineHandler,
    VolumeHandler, ZoneHandler,
};
pub use types::{ListResponse, SuccessResponse, Tag};
