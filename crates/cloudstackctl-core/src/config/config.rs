//! Configuration management for CloudStack CLI tools
//!
//! Configuration is stored in TOML format with support for multiple named
//! profiles, environment variable expansion and keyring-backed secrets.

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use super::retry::RetryConfig;

/// Environment variable overriding a profile's API endpoint
pub const ENV_API_URL: &str = "CLOUDSTACK_API_URL";

/// Environment variable overriding a profile's API key
pub const ENV_API_KEY: &str = "CLOUDSTACK_API_KEY";

/// Environment variable overriding a profile's secret key
pub const ENV_SECRET_KEY: &str = "CLOUDSTACK_SECRET_KEY";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Profile used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,

    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// Connection settings for one CloudStack endpoint and account
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Profile {
    /// API endpoint, e.g. `https://cloud.example.com/client/api`
    #[serde(default)]
    pub api_url: String,

    /// API key, or a `keyring:` reference
    #[serde(default)]
    pub api_key: String,

    /// Secret key, or a `keyring:` reference
    #[serde(default)]
    pub secret_key: String,

    /// Skip TLS certificate verification
    #[serde(default, skip_serializing_if = "is_false")]
    pub insecure: bool,

    /// HTTP request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// How long to wait for async jobs, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub async_timeout_secs: Option<u64>,

    /// Delay between job polls, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_secs: Option<u64>,

    /// Zone used by commands that need one and were not given one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,

    /// Project every command is scoped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Retry settings for read-only commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
}

/// Credentials with environment overrides and keyring references applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub api_url: String,
    pub api_key: String,
    pub secret_key: String,
}

impl ResolvedCredentials {
    /// Credentials taken entirely from the environment, if all three are set
    pub fn from_env() -> Option<Self> {
        Some(Self {
            api_url: std::env::var(ENV_API_URL).ok()?,
            api_key: std::env::var(ENV_API_KEY).ok()?,
            secret_key: std::env::var(ENV_SECRET_KEY).ok()?,
        })
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Profile {
    /// A profile with just the connection triple set
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            ..Self::default()
        }
    }

    /// Resolve the endpoint and key pair (with keyring support)
    ///
    /// When `use_env` is set, `CLOUDSTACK_API_URL`, `CLOUDSTACK_API_KEY` and
    /// `CLOUDSTACK_SECRET_KEY` take precedence over the stored values.
    pub fn resolve_credentials(&self, name: &str, use_env: bool) -> Result<ResolvedCredentials> {
        let store = CredentialStore::new();
        let env = |var: &'static str| use_env.then_some(var);

        let api_url = store
            .get_credential(&self.api_url, env(ENV_API_URL))
            .map_err(|e| {
                ConfigError::CredentialError(format!("Failed to resolve API URL: {}", e))
            })?;
        let api_key = store
            .get_credential(&self.api_key, env(ENV_API_KEY))
            .map_err(|e| {
                ConfigError::CredentialError(format!("Failed to resolve API key: {}", e))
            })?;
        let secret_key = store
            .get_credential(&self.secret_key, env(ENV_SECRET_KEY))
            .map_err(|e| {
                ConfigError::CredentialError(format!("Failed to resolve secret key: {}", e))
            })?;

        for (field, value) in [
            ("api_url", &api_url),
            ("api_key", &api_key),
            ("secret_key", &secret_key),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    profile: name.to_string(),
                    field,
                });
            }
        }

        Ok(ResolvedCredentials {
            api_url,
            api_key,
            secret_key,
        })
    }

    /// True if either key is held in the keyring
    pub fn uses_keyring(&self) -> bool {
        CredentialStore::is_keyring_reference(&self.api_key)
            || CredentialStore::is_keyring_reference(&self.secret_key)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn async_timeout(&self) -> Option<Duration> {
        self.async_timeout_secs.map(Duration::from_secs)
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Resolve the profile to use
    ///
    /// Order: the explicit name, the configured default, then the first
    /// profile alphabetically.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(profile_name) = explicit_profile {
            return Ok(profile_name.to_string());
        }

        if let Some(ref default) = self.default_profile {
            return Ok(default.clone());
        }

        if let Some((name, _)) = self.list_profiles().first() {
            return Ok((*name).clone());
        }

        Err(ConfigError::NoProfiles {
            suggestion: "Use 'cloudstackctl profile set' to create a profile, or set \
                         CLOUDSTACK_API_URL, CLOUDSTACK_API_KEY and CLOUDSTACK_SECRET_KEY."
                .to_string(),
        })
    }

    /// Look up a profile by name
    pub fn get_profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// A missing file is an empty configuration.
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);
        let config: Config = toml::from_str(&expanded_content)?;

        debug!(
            path = %config_path.display(),
            profiles = config.profiles.len(),
            "Loaded config"
        );
        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        debug!(path = %config_path.display(), "Saved config");
        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name, clearing the default if it pointed there
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On macOS, `~/.config/cloudstackctl/config.toml` is used when it (or its
    /// directory) exists, falling back to
    /// `~/Library/Application Support/org.apache.cloudstackctl/config.toml`.
    ///
    /// On Linux: ~/.config/cloudstackctl/config.toml
    /// On Windows: %APPDATA%\apache\cloudstackctl\config\config.toml
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("cloudstackctl")
                    .join("config.toml");

                if linux_style_path.exists()
                    || linux_style_path.parent().is_some_and(|p| p.exists())
                {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs = ProjectDirs::from("org", "apache", "cloudstackctl")
            .ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references
    ///
    /// Unset variables without a default are left as written, so profiles
    /// that are not in use do not need their variables set.
    ///
    /// ```toml
    /// api_key = "${CS_LAB_KEY}"
    /// api_url = "${CS_LAB_URL:-https://lab.example.com/client/api}"
    /// ```
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lab_profile() -> Profile {
        Profile::new(
            "https://lab.example.com/client/api",
            "lab-key",
            "lab-secret",
        )
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        let mut profile = lab_profile();
        profile.zone = Some("zone1".to_string());
        profile.retry = Some(RetryConfig::default());

        config.set_profile("lab".to_string(), profile);
        config.default_profile = Some("lab".to_string());

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(config, deserialized);
        assert!(!serialized.contains("insecure"));
    }

    #[test]
    fn test_minimal_profile_parses() {
        let config: Config = toml::from_str(
            r#"
[profiles.lab]
api_url = "https://lab.example.com/client/api"
api_key = "k"
secret_key = "s"
"#,
        )
        .unwrap();

        let profile = config.get_profile("lab").unwrap();
        assert!(!profile.insecure);
        assert_eq!(profile.timeout(), None);
        assert_eq!(profile.retry, None);
    }

    #[test]
    fn test_durations() {
        let mut profile = lab_profile();
        profile.timeout_secs = Some(30);
        profile.async_timeout_secs = Some(600);
        profile.poll_interval_secs = Some(5);

        assert_eq!(profile.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(profile.async_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(profile.poll_interval(), Some(Duration::from_secs(5)));
    }

    #[test]
    #[serial_test::serial]
    fn test_resolve_credentials_plaintext() {
        unsafe {
            std::env::remove_var(ENV_API_KEY);
        }
        let creds = lab_profile().resolve_credentials("lab", true).unwrap();
        assert_eq!(creds.api_key, "lab-key");
        assert_eq!(creds.secret_key, "lab-secret");
    }

    #[test]
    #[serial_test::serial]
    fn test_resolve_credentials_env_override() {
        unsafe {
            std::env::set_var(ENV_API_KEY, "env-key");
        }

        let with_env = lab_profile().resolve_credentials("lab", true).unwrap();
        let without_env = lab_profile().resolve_credentials("lab", false).unwrap();

        unsafe {
            std::env::remove_var(ENV_API_KEY);
        }

        assert_eq!(with_env.api_key, "env-key");
        assert_eq!(without_env.api_key, "lab-key");
    }

    #[test]
    fn test_resolve_credentials_missing_field() {
        let profile = Profile::new("https://lab.example.com/client/api", "k", "");
        let err = profile.resolve_credentials("lab", false).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                field: "secret_key",
                ..
            }
        ));
        assert_eq!(err.to_string(), "Profile 'lab' is missing secret_key");
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_expansion() {
        unsafe {
            std::env::set_var("CS_TEST_API_KEY", "test-key-value");
            std::env::set_var("CS_TEST_SECRET_KEY", "test-secret-value");
        }

        let content = r#"
[profiles.test]
api_url = "https://lab.example.com/client/api"
api_key = "${CS_TEST_API_KEY}"
secret_key = "${CS_TEST_SECRET_KEY}"
"#;

        let expanded = Config::expand_env_vars(content);
        assert!(expanded.contains("test-key-value"));
        assert!(expanded.contains("test-secret-value"));

        unsafe {
            std::env::remove_var("CS_TEST_API_KEY");
            std::env::remove_var("CS_TEST_SECRET_KEY");
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_expansion_with_defaults() {
        unsafe {
            std::env::remove_var("CS_NONEXISTENT_VAR");
        }

        let content = r#"api_url = "${CS_NONEXISTENT_VAR:-https://default.example.com/client/api}""#;
        let expanded = Config::expand_env_vars(content);
        assert!(expanded.contains("https://default.example.com/client/api"));

        let content = r#"api_key = "${CS_NONEXISTENT_VAR}""#;
        let expanded = Config::expand_env_vars(content);
        assert!(expanded.contains("${CS_NONEXISTENT_VAR}"));
    }

    #[test]
    fn test_profile_resolution_order() {
        let mut config = Config::default();
        config.set_profile("zeta".to_string(), lab_profile());
        config.set_profile("alpha".to_string(), lab_profile());

        assert_eq!(config.resolve_profile(Some("zeta")).unwrap(), "zeta");
        assert_eq!(config.resolve_profile(None).unwrap(), "alpha");

        config.default_profile = Some("zeta".to_string());
        assert_eq!(config.resolve_profile(None).unwrap(), "zeta");
    }

    #[test]
    fn test_no_profile_errors() {
        let config = Config::default();
        let err = config.resolve_profile(None).unwrap_err();
        assert!(matches!(err, ConfigError::NoProfiles { .. }));
        assert!(err.to_string().contains("cloudstackctl profile set"));

        assert!(matches!(
            config.get_profile("missing"),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn test_remove_profile_clears_default() {
        let mut config = Config::default();
        config.set_profile("lab".to_string(), lab_profile());
        config.default_profile = Some("lab".to_string());

        assert!(config.remove_profile("lab").is_some());
        assert_eq!(config.default_profile, None);
        assert!(config.remove_profile("lab").is_none());
    }

    #[test]
    fn test_uses_keyring() {
        let mut profile = lab_profile();
        assert!(!profile.uses_keyring());
        profile.secret_key = "keyring:lab.secret_key".to_string();
        assert!(profile.uses_keyring());
    }
}
