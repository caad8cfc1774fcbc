//! Shared engine for CloudStack command-line tools
//!
//! Sits between the `cloudstack` SDK and front ends such as `cloudstackctl`:
//!
//! - [`config`]: named profiles in a TOML file, credential resolution with
//!   environment overrides and optional keyring storage
//! - [`progress`]: job polling that reports [`ProgressEvent`]s
//! - [`workflows`]: multi-step operations such as "deploy and wait" or
//!   "acquire an IP and forward a port"
//!
//! ```rust,ignore
//! use cloudstackctl_core::{Config, workflows};
//!
//! let config = Config::load()?;
//! let name = config.resolve_profile(None)?;
//! let creds = config.get_profile(&name)?.resolve_credentials(&name, true)?;
//! ```

pub mod config;
pub mod error;
pub mod progress;
pub mod workflows;

pub use config::{Config, ConfigError, CredentialStore, Profile, ResolvedCredentials, RetryConfig};
pub use error::{CoreError, Result};
pub use progress::{ProgressCallback, ProgressEvent, poll_job, wait_for};
pub use workflows::{
    PortForward, acquire_ip_and_forward_port, create_volume_and_attach, deploy_vm_and_wait,
    destroy_vm_and_wait, snapshot_volume_and_wait,
};
