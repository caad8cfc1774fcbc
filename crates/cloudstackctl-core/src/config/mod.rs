//! Configuration and profile management for CloudStack CLI tools
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! Profiles hold an API endpoint plus the key pair used to sign requests,
//! along with per-profile client tuning.
//!
//! # Features
//!
//! - Multiple named profiles for different CloudStack clouds or accounts
//! - Secure credential storage using OS keyring (optional)
//! - Environment variable expansion in config files
//! - Platform-specific config file locations
//! - Per-profile retry settings for read-only commands

pub mod config;
pub mod credential;
pub mod error;
pub mod retry;

// Re-export main types for convenience
pub use config::{Config, Profile, ResolvedCredentials};
pub use credential::{CredentialStorage, CredentialStore};
pub use error::{ConfigError, Result};
pub use retry::RetryConfig;
