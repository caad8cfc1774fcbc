//! Connection management for CloudStack clients

use crate::error::Result as CliResult;
use anyhow::Context;
use cloudstack::CloudStackClient;
use cloudstackctl_core::{Config, Profile, ResolvedCredentials};
use std::path::PathBuf;
use tracing::{debug, info, trace};

/// User agent string for cloudstackctl HTTP requests
const CLOUDSTACKCTL_USER_AGENT: &str = concat!("cloudstackctl/", env!("CARGO_PKG_VERSION"));

/// Connection manager for creating authenticated clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with the given configuration
    #[cfg(test)]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            config_path: None,
        }
    }

    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Save the configuration to the appropriate location
    pub fn save_config(&self) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            self.config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            self.config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Environment variables only apply when no config file was given
    /// explicitly, so `--config-file` runs are isolated from the shell.
    fn use_env_vars(&self) -> bool {
        self.config_path.is_none()
    }

    /// A complete credential set from the environment, used instead of any
    /// profile when no `--profile` was given
    fn env_credentials(&self, profile_name: Option<&str>) -> Option<ResolvedCredentials> {
        if self.use_env_vars() && profile_name.is_none() {
            ResolvedCredentials::from_env()
        } else {
            None
        }
    }

    /// The profile a command runs against, if one can be resolved
    ///
    /// `None` when the client is built from environment credentials, so
    /// zone and project settings of an unrelated profile are not applied.
    pub fn active_profile(&self, profile_name: Option<&str>) -> Option<(String, &Profile)> {
        if self.env_credentials(profile_name).is_some() {
            return None;
        }
        let name = self.config.resolve_profile(profile_name).ok()?;
        let profile = self.config.profiles.get(&name)?;
        Some((name, profile))
    }

    /// Zone to use when a command was not given one
    pub fn default_zone(&self, profile_name: Option<&str>) -> Option<String> {
        self.active_profile(profile_name)
            .and_then(|(_, profile)| profile.zone.clone())
    }

    /// Project the profile scopes commands to
    pub fn project_id(&self, profile_name: Option<&str>) -> Option<String> {
        self.active_profile(profile_name)
            .and_then(|(_, profile)| profile.project_id.clone())
    }

    /// Create a CloudStack client
    ///
    /// Credentials come from, in order: a complete set of `CLOUDSTACK_*`
    /// environment variables, then the selected profile (whose fields can
    /// still be overridden one by one from the environment).
    pub fn create_client(&self, profile_name: Option<&str>) -> CliResult<CloudStackClient> {
        debug!("Creating CloudStack client");
        trace!("Profile name: {:?}", profile_name);

        let use_env_vars = self.use_env_vars();
        debug!(
            "Config path: {:?}, use_env_vars: {}",
            self.config_path, use_env_vars
        );
        if !use_env_vars {
            info!("--config-file specified explicitly, ignoring environment variables");
        }

        let (credentials, profile) = match self.env_credentials(profile_name) {
            Some(credentials) => {
                info!("Using CloudStack credentials from environment variables");
                (credentials, None)
            }
            None => {
                let name = self.config.resolve_profile(profile_name)?;
                info!("Using CloudStack profile: {}", name);
                let profile = self.config.get_profile(&name)?;
                let credentials = profile.resolve_credentials(&name, use_env_vars)?;
                (credentials, Some(profile))
            }
        };

        let mut builder = CloudStackClient::builder()
            .api_url(credentials.api_url)
            .api_key(credentials.api_key)
            .secret_key(credentials.secret_key)
            .user_agent(CLOUDSTACKCTL_USER_AGENT);

        if let Some(profile) = profile {
            builder = builder.insecure(profile.insecure);
            if let Some(timeout) = profile.timeout() {
                builder = builder.timeout(timeout);
            }
            if let Some(timeout) = profile.async_timeout() {
                builder = builder.async_timeout(timeout);
            }
            if let Some(interval) = profile.poll_interval() {
                builder = builder.poll_interval(interval);
            }
            if let Some(retry) = &profile.retry {
                builder = builder.retry(retry.to_policy());
            }
        }

        Ok(builder.build()?)
    }
}
