//! Command implementations

pub mod api;
pub mod async_utils;
pub mod catalog;
pub mod job;
pub mod network;
pub mod profile;
pub mod resolve;
pub mod snapshot;
pub mod utils;
pub mod vm;
pub mod volume;

use cloudstack::CloudStackClient;

use crate::cli::OutputFormat;
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;

/// Everything a resource command needs from the global flags
pub struct CommandContext<'a> {
    pub conn_mgr: &'a ConnectionManager,
    pub profile: Option<&'a str>,
    pub output: OutputFormat,
    pub query: Option<&'a str>,
}

impl CommandContext<'_> {
    pub fn client(&self) -> CliResult<CloudStackClient> {
        self.conn_mgr.create_client(self.profile)
    }

    pub fn default_zone(&self) -> Option<String> {
        self.conn_mgr.default_zone(self.profile)
    }

    pub fn project_id(&self) -> Option<String> {
        self.conn_mgr.project_id(self.profile)
    }
}
