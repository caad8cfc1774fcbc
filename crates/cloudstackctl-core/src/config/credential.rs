//! Credential storage with optional keyring support
//!
//! A stored API key or secret key is one of:
//! - `keyring:<profile>.<field>`, resolved from the OS keyring (feature `secure-storage`)
//! - any other string, used as-is
//!
//! An environment variable, when one is supplied, takes precedence over both.

use super::error::{ConfigError, Result};
use std::env;
use tracing::debug;

/// Prefix that marks a value as a keyring reference
const KEYRING_PREFIX: &str = "keyring:";

/// Service name for keyring entries
#[cfg(feature = "secure-storage")]
const SERVICE_NAME: &str = "cloudstackctl";

/// Storage backend for credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStorage {
    /// Store in OS keyring
    #[cfg(feature = "secure-storage")]
    Keyring,
    /// Store in the config file as written
    Plaintext,
}

/// Reads and writes profile secrets
#[derive(Debug)]
pub struct CredentialStore {
    storage: CredentialStorage,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Pick the keyring when it is compiled in and reachable, plaintext otherwise
    pub fn new() -> Self {
        #[cfg(feature = "secure-storage")]
        {
            if Self::is_keyring_available() {
                return Self {
                    storage: CredentialStorage::Keyring,
                };
            }
        }
        Self::plaintext()
    }

    /// A store that never touches the keyring
    pub fn plaintext() -> Self {
        Self {
            storage: CredentialStorage::Plaintext,
        }
    }

    #[cfg(feature = "secure-storage")]
    fn is_keyring_available() -> bool {
        match keyring::Entry::new(SERVICE_NAME, "__probe__") {
            Ok(entry) => {
                let _ = entry.get_password();
                true
            }
            Err(_) => false,
        }
    }

    /// Keyring account name for one field of a profile
    pub fn entry_name(profile: &str, field: &str) -> String {
        format!("{}.{}", profile, field)
    }

    /// Store `value` and return what should be written to the config file
    ///
    /// With the keyring backend this is a `keyring:` reference; with the
    /// plaintext backend it is the value itself.
    pub fn store_credential(&self, profile: &str, field: &str, value: &str) -> Result<String> {
        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => {
                let name = Self::entry_name(profile, field);
                let entry = keyring::Entry::new(SERVICE_NAME, &name)
                    .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
                entry.set_password(value).map_err(|e| {
                    ConfigError::KeyringError(format!(
                        "Failed to store '{}' in keyring: {}",
                        name, e
                    ))
                })?;
                debug!(profile, field, "Stored credential in keyring");
                Ok(format!("{}{}", KEYRING_PREFIX, name))
            }
            CredentialStorage::Plaintext => {
                debug!(profile, field, "Storing credential in plaintext");
                Ok(value.to_string())
            }
        }
    }

    /// Resolve a configured credential value
    ///
    /// Resolution order:
    /// 1. The environment variable `env_var`, if given and set
    /// 2. The keyring, if `value` is a `keyring:` reference
    /// 3. `value` itself
    pub fn get_credential(&self, value: &str, env_var: Option<&str>) -> Result<String> {
        if let Some(var) = env_var
            && let Ok(env_value) = env::var(var)
        {
            debug!(var, "Credential taken from environment");
            return Ok(env_value);
        }

        let Some(name) = value.strip_prefix(KEYRING_PREFIX) else {
            return Ok(value.to_string());
        };

        #[cfg(feature = "secure-storage")]
        {
            let entry = keyring::Entry::new(SERVICE_NAME, name)
                .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
            entry.get_password().map_err(|e| {
                ConfigError::KeyringError(format!(
                    "Failed to read '{}' from keyring: {}",
                    name, e
                ))
            })
        }
        #[cfg(not(feature = "secure-storage"))]
        {
            Err(ConfigError::CredentialError(format!(
                "'{}' references the keyring but secure-storage support is not compiled in",
                name
            )))
        }
    }

    /// Remove a stored keyring reference; plaintext values need no cleanup
    pub fn delete_credential(&self, value: &str) -> Result<()> {
        let Some(name) = value.strip_prefix(KEYRING_PREFIX) else {
            return Ok(());
        };

        #[cfg(feature = "secure-storage")]
        {
            let entry = keyring::Entry::new(SERVICE_NAME, name)
                .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(ConfigError::KeyringError(format!(
                    "Failed to delete '{}' from keyring: {}",
                    name, e
                ))),
            }
        }
        #[cfg(not(feature = "secure-storage"))]
        {
            debug!(name, "Keyring support not compiled in, leaving entry alone");
            Ok(())
        }
    }

    /// Check if a value is a keyring reference
    pub fn is_keyring_reference(value: &str) -> bool {
        value.starts_with(KEYRING_PREFIX)
    }

    /// Name of the active backend
    pub fn storage_backend(&self) -> &'static str {
        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => "keyring",
            CredentialStorage::Plaintext => "plaintext",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plaintext_passthrough() {
        let store = CredentialStore::plaintext();
        let result = store.get_credential("my-api-key", None).unwrap();
        assert_eq!(result, "my-api-key");
    }

    #[test]
    fn test_plaintext_store_returns_value() {
        let store = CredentialStore::plaintext();
        let stored = store.store_credential("lab", "secret_key", "s3cr3t").unwrap();
        assert_eq!(stored, "s3cr3t");
        assert_eq!(store.storage_backend(), "plaintext");
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_override() {
        unsafe {
            env::set_var("CLOUDSTACKCTL_TEST_CREDENTIAL", "env-value");
        }

        let store = CredentialStore::plaintext();
        let result = store
            .get_credential("config-value", Some("CLOUDSTACKCTL_TEST_CREDENTIAL"))
            .unwrap();
        assert_eq!(result, "env-value");

        unsafe {
            env::remove_var("CLOUDSTACKCTL_TEST_CREDENTIAL");
        }
    }

    #[test]
    fn test_keyring_reference_detection() {
        assert!(CredentialStore::is_keyring_reference("keyring:lab.api_key"));
        assert!(!CredentialStore::is_keyring_reference("my-key"));
        assert!(!CredentialStore::is_keyring_reference(""));
        assert_eq!(CredentialStore::entry_name("lab", "api_key"), "lab.api_key");
    }

    #[test]
    fn test_delete_plaintext_is_noop() {
        CredentialStore::plaintext()
            .delete_credential("not-a-reference")
            .unwrap();
    }

    #[cfg(not(feature = "secure-storage"))]
    #[test]
    fn test_keyring_reference_without_feature() {
        let err = CredentialStore::plaintext()
            .get_credential("keyring:lab.api_key", None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::CredentialError(_)));
    }

    #[cfg(feature = "secure-storage")]
    #[test]
    #[ignore = "Requires keyring service to be available"]
    fn test_keyring_storage() {
        let store = CredentialStore::new();

        let reference = store
            .store_credential("cloudstackctl-test", "api_key", "test-value")
            .unwrap();
        assert!(reference.starts_with(KEYRING_PREFIX));

        let retrieved = store.get_credential(&reference, None).unwrap();
        assert_eq!(retrieved, "test-value");

        store.delete_credential(&reference).unwrap();
    }
}
