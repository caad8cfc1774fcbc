//! Profile management command implementations

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use cloudstack::{CapabilitiesHandler, CloudStackError};
use cloudstackctl_core::{Config, CredentialStore, Profile};
use colored::Colorize;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, trace};

use super::utils::confirm_action;
use crate::cli::{OutputFormat, ProfileCommands};
use crate::connection::ConnectionManager;
use crate::error::{CloudStackCtlError, Result as CliResult};
use crate::output;

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<()> {
    use ProfileCommands::*;

    match profile_cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name, output_format),
        Set {
            name,
            api_url,
            api_key,
            secret_key,
            insecure,
            timeout,
            async_timeout,
            poll_interval,
            zone,
            project_id,
            #[cfg(feature = "secure-storage")]
            use_keyring,
        } => {
            let settings = ProfileSettings {
                api_url,
                api_key,
                secret_key: secret_key.as_deref(),
                insecure: *insecure,
                timeout: *timeout,
                async_timeout: *async_timeout,
                poll_interval: *poll_interval,
                zone: zone.as_deref(),
                project_id: project_id.as_deref(),
                #[cfg(feature = "secure-storage")]
                use_keyring: *use_keyring,
            };
            handle_set(conn_mgr, name, settings)
        }
        Remove { name } => handle_remove(conn_mgr, name),
        Default { name } => handle_default(conn_mgr, name),
        Validate { connect } => handle_validate(conn_mgr, *connect, output_format).await,
    }
}

fn structured(output_format: OutputFormat) -> Option<output::OutputFormat> {
    match output_format {
        OutputFormat::Json => Some(output::OutputFormat::Json),
        OutputFormat::Yaml => Some(output::OutputFormat::Yaml),
        OutputFormat::Auto | OutputFormat::Table => None,
    }
}

fn config_path(conn_mgr: &ConnectionManager) -> Option<PathBuf> {
    conn_mgr
        .config_path
        .clone()
        .or_else(|| Config::config_path().ok())
}

/// First characters of a credential, enough to tell keys apart
fn preview(value: &str) -> String {
    if CredentialStore::is_keyring_reference(value) {
        return value.to_string();
    }
    let shown: String = value.chars().take(8).collect();
    if shown.len() < value.len() {
        format!("{}...", shown)
    } else {
        shown
    }
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    debug!("Listing all configured profiles");
    let profiles = conn_mgr.config.list_profiles();
    trace!("Found {} profiles", profiles.len());
    let default = conn_mgr.config.default_profile.as_deref();

    if let Some(fmt) = structured(output_format) {
        let profile_list: Vec<_> = profiles
            .iter()
            .map(|(name, profile)| {
                let mut obj = json!({
                    "name": name,
                    "api_url": profile.api_url,
                    "is_default": default == Some(name.as_str()),
                });
                if let Some(zone) = &profile.zone {
                    obj["zone"] = json!(zone);
                }
                obj
            })
            .collect();
        let data = json!({
            "config_path": config_path(conn_mgr).map(|p| p.display().to_string()),
            "profiles": profile_list,
            "count": profiles.len(),
        });
        output::print_output(&data, fmt, None)?;
        return Ok(());
    }

    if let Some(path) = config_path(conn_mgr) {
        println!("Configuration file: {}", path.display());
        println!();
    }

    if profiles.is_empty() {
        info!("No profiles configured");
        println!("No profiles configured.");
        println!("Use 'cloudstackctl profile set' to create a profile.");
        return Ok(());
    }

    for (name, profile) in &profiles {
        let marker = if default == Some(name.as_str()) {
            "*".green().to_string()
        } else {
            " ".to_string()
        };
        println!("{} {:<16} {}", marker, name, profile.api_url);
    }
    Ok(())
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let path = match config_path(conn_mgr) {
        Some(path) => path,
        None => Config::config_path()?,
    };
    match structured(output_format) {
        Some(fmt) => output::print_output(json!({ "config_path": path }), fmt, None)?,
        None => println!("{}", path.display()),
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    debug!("Showing profile: {}", name);
    let profile = conn_mgr.config.get_profile(name)?;
    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);

    if let Some(fmt) = structured(output_format) {
        let data = json!({
            "name": name,
            "api_url": profile.api_url,
            "api_key": preview(&profile.api_key),
            "insecure": profile.insecure,
            "timeout_secs": profile.timeout_secs,
            "async_timeout_secs": profile.async_timeout_secs,
            "poll_interval_secs": profile.poll_interval_secs,
            "zone": profile.zone,
            "project_id": profile.project_id,
            "uses_keyring": profile.uses_keyring(),
            "is_default": is_default,
        });
        output::print_output(&data, fmt, None)?;
        return Ok(());
    }

    println!("Profile: {}{}", name, if is_default { " (default)" } else { "" });
    println!("API URL: {}", profile.api_url);
    println!("API Key: {}", preview(&profile.api_key));
    println!(
        "Secret Key: {}",
        if profile.uses_keyring() {
            "stored in keyring"
        } else {
            "set"
        }
    );
    if profile.insecure {
        println!("Insecure: {}", "true".yellow());
    }
    if let Some(timeout) = profile.timeout_secs {
        println!("Timeout: {}s", timeout);
    }
    if let Some(timeout) = profile.async_timeout_secs {
        println!("Async Timeout: {}s", timeout);
    }
    if let Some(interval) = profile.poll_interval_secs {
        println!("Poll Interval: {}s", interval);
    }
    if let Some(zone) = &profile.zone {
        println!("Zone: {}", zone);
    }
    if let Some(project) = &profile.project_id {
        println!("Project: {}", project);
    }
    Ok(())
}

/// Values given to `profile set`
struct ProfileSettings<'a> {
    api_url: &'a str,
    api_key: &'a str,
    secret_key: Option<&'a str>,
    insecure: bool,
    timeout: Option<u64>,
    async_timeout: Option<u64>,
    poll_interval: Option<u64>,
    zone: Option<&'a str>,
    project_id: Option<&'a str>,
    #[cfg(feature = "secure-storage")]
    use_keyring: bool,
}

fn handle_set(
    conn_mgr: &ConnectionManager,
    name: &str,
    settings: ProfileSettings<'_>,
) -> CliResult<()> {
    debug!("Setting profile: {}", name);

    let secret_key = match settings.secret_key {
        Some(secret) => secret.to_string(),
        None => rpassword::prompt_password("Enter secret key: ")
            .context("Failed to read secret key")?,
    };
    if secret_key.is_empty() {
        return Err(CloudStackCtlError::InvalidInput {
            message: "secret key must not be empty".to_string(),
        });
    }

    #[cfg(feature = "secure-storage")]
    let (stored_key, stored_secret) = if settings.use_keyring {
        let store = CredentialStore::new();
        let key_ref = store
            .store_credential(name, "api_key", settings.api_key)
            .context("Failed to store API key in keyring")?;
        let secret_ref = store
            .store_credential(name, "secret_key", &secret_key)
            .context("Failed to store secret key in keyring")?;
        println!("Credentials stored using the {} backend", store.storage_backend());
        (key_ref, secret_ref)
    } else {
        (settings.api_key.to_string(), secret_key)
    };

    #[cfg(not(feature = "secure-storage"))]
    let (stored_key, stored_secret) = (settings.api_key.to_string(), secret_key);

    // Settings not given on the command line keep their current values
    let existing = conn_mgr.config.profiles.get(name);
    let keep = |given: Option<u64>, current: fn(&Profile) -> Option<u64>| {
        given.or_else(|| existing.and_then(current))
    };
    let keep_str = |given: Option<&str>, current: fn(&Profile) -> Option<String>| {
        given
            .map(str::to_string)
            .or_else(|| existing.and_then(current))
    };

    let profile = Profile {
        api_url: settings.api_url.to_string(),
        api_key: stored_key,
        secret_key: stored_secret,
        insecure: settings.insecure,
        timeout_secs: keep(settings.timeout, |p| p.timeout_secs),
        async_timeout_secs: keep(settings.async_timeout, |p| p.async_timeout_secs),
        poll_interval_secs: keep(settings.poll_interval, |p| p.poll_interval_secs),
        zone: keep_str(settings.zone, |p| p.zone.clone()),
        project_id: keep_str(settings.project_id, |p| p.project_id.clone()),
        retry: existing.and_then(|p| p.retry.clone()),
    };

    let mut manager = conn_mgr.clone();
    let first_profile = manager.config.profiles.is_empty();
    manager.config.set_profile(name.to_string(), profile);
    manager.save_config()?;

    match config_path(conn_mgr) {
        Some(path) => {
            println!("Profile '{}' saved successfully to:", name);
            println!("  {}", path.display());
        }
        None => println!("Profile '{}' saved successfully.", name),
    }

    if first_profile {
        println!();
        println!("Tip: Make it the default profile with:");
        println!("  cloudstackctl profile default {}", name);
    }
    Ok(())
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    debug!("Removing profile: {}", name);
    let profile = conn_mgr.config.get_profile(name)?;

    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);
    if is_default {
        println!("Warning: '{}' is the default profile.", name);
    }
    if !confirm_action(&format!("remove profile '{}'", name))? {
        println!("Profile removal cancelled.");
        return Ok(());
    }

    let store = CredentialStore::new();
    for value in [&profile.api_key, &profile.secret_key] {
        if let Err(e) = store.delete_credential(value) {
            println!("{} {}", "Warning:".yellow(), e);
        }
    }

    let mut manager = conn_mgr.clone();
    manager.config.remove_profile(name);
    manager.save_config()?;

    if is_default {
        println!("Default profile cleared.");
    }
    println!("Profile '{}' removed successfully.", name);
    Ok(())
}

fn handle_default(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    conn_mgr.config.get_profile(name)?;

    let mut manager = conn_mgr.clone();
    manager.config.default_profile = Some(name.to_string());
    manager.save_config()?;

    println!("Default profile set to '{}'", name);
    Ok(())
}

/// Connectivity test outcome
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum ConnectStatus {
    Ok,
    AuthFailed,
    ConnectionFailed,
    Timeout,
    Error,
}

/// Result of a connectivity test for a single profile
#[derive(Debug, Serialize)]
struct ConnectResult {
    status: ConnectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    detail: String,
}

/// Structural validation result
#[derive(Debug, Serialize)]
struct StructuralResult {
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

/// Structured result for a single profile validation
#[derive(Debug, Serialize)]
struct ProfileValidationResult {
    name: String,
    structural: StructuralResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    connectivity: Option<ConnectResult>,
}

/// Full validation output
#[derive(Debug, Serialize)]
struct ValidationOutput {
    config_path: String,
    config_exists: bool,
    profile_count: usize,
    profiles: Vec<ProfileValidationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_profile: Option<String>,
    default_valid: bool,
    overall_valid: bool,
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn validate_profile_structure(profile: &Profile) -> StructuralResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if profile.api_url.is_empty() {
        errors.push("api_url is not set".to_string());
    } else if !profile.api_url.starts_with("http://") && !profile.api_url.starts_with("https://")
    {
        errors.push(format!("api_url '{}' is not an http(s) URL", profile.api_url));
    } else if !profile.api_url.trim_end_matches('/').ends_with("/client/api") {
        warnings.push("api_url usually ends with /client/api".to_string());
    }
    if profile.api_key.is_empty() {
        errors.push("api_key is not set".to_string());
    }
    if profile.secret_key.is_empty() {
        errors.push("secret_key is not set".to_string());
    }
    if profile.insecure {
        warnings.push("TLS certificate verification is disabled".to_string());
    }
    if profile.poll_interval_secs == Some(0) {
        errors.push("poll_interval_secs must be at least 1".to_string());
    }

    StructuralResult {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

async fn test_connectivity(conn_mgr: &ConnectionManager, name: &str) -> ConnectResult {
    let start = Instant::now();
    let elapsed = |start: Instant| Some(start.elapsed().as_millis() as u64);

    let client = match conn_mgr.create_client(Some(name)) {
        Ok(client) => client,
        Err(e) => {
            return ConnectResult {
                status: ConnectStatus::Error,
                latency_ms: None,
                detail: format!("Failed to create client: {}", e),
            };
        }
    };

    let handler = CapabilitiesHandler::new(client);
    match tokio::time::timeout(CONNECT_TIMEOUT, handler.get()).await {
        Ok(Ok(capabilities)) => ConnectResult {
            status: ConnectStatus::Ok,
            latency_ms: elapsed(start),
            detail: match capabilities.cloudstackversion {
                Some(version) => format!("Authenticated, CloudStack {}", version),
                None => "Authenticated".to_string(),
            },
        },
        Ok(Err(e)) => ConnectResult {
            status: match &e {
                CloudStackError::AuthenticationFailed { .. } => ConnectStatus::AuthFailed,
                CloudStackError::ConnectionError(_) | CloudStackError::Request(_) => {
                    ConnectStatus::ConnectionFailed
                }
                _ => ConnectStatus::Error,
            },
            latency_ms: elapsed(start),
            detail: e.to_string(),
        },
        Err(_) => ConnectResult {
            status: ConnectStatus::Timeout,
            latency_ms: elapsed(start),
            detail: format!("Connection timed out after {}s", CONNECT_TIMEOUT.as_secs()),
        },
    }
}

async fn handle_validate(
    conn_mgr: &ConnectionManager,
    connect: bool,
    output_format: OutputFormat,
) -> CliResult<()> {
    debug!("Validating configuration (connect={})", connect);

    let path = match config_path(conn_mgr) {
        Some(path) => path,
        None => Config::config_path()?,
    };
    let config_exists = path.exists();

    let profiles = conn_mgr.config.list_profiles();
    let mut results = Vec::with_capacity(profiles.len());
    for (name, profile) in &profiles {
        let structural = validate_profile_structure(profile);
        let connectivity = if connect && structural.valid {
            Some(test_connectivity(conn_mgr, name).await)
        } else {
            None
        };
        results.push(ProfileValidationResult {
            name: (*name).clone(),
            structural,
            connectivity,
        });
    }

    let default_profile = conn_mgr.config.default_profile.clone();
    let default_valid = default_profile
        .as_ref()
        .is_none_or(|name| conn_mgr.config.profiles.contains_key(name));
    let overall_valid = config_exists
        && default_valid
        && results.iter().all(|r| {
            r.structural.valid
                && r
                    .connectivity
                    .as_ref()
                    .is_none_or(|c| matches!(c.status, ConnectStatus::Ok))
        });

    let result = ValidationOutput {
        config_path: path.display().to_string(),
        config_exists,
        profile_count: profiles.len(),
        profiles: results,
        default_profile,
        default_valid,
        overall_valid,
    };

    match structured(output_format) {
        Some(fmt) => output::print_output(&result, fmt, None)?,
        None => print_validation_human(&result),
    }

    if result.overall_valid {
        Ok(())
    } else {
        Err(CloudStackCtlError::Configuration(
            "configuration has problems".to_string(),
        ))
    }
}

fn print_validation_human(result: &ValidationOutput) {
    println!("Configuration file: {}", result.config_path);

    if !result.config_exists {
        println!("{} Configuration file does not exist", "\u{2717}".red());
        println!("\nTry:");
        println!("  cloudstackctl profile set <name> --api-url <url> --api-key <key>");
        return;
    }

    println!("{} Configuration file exists and is readable", "\u{2713}".green());
    println!("{} Found {} profile(s)", "\u{2713}".green(), result.profile_count);

    for p in &result.profiles {
        println!();
        if p.structural.valid {
            println!("Profile '{}': {}", p.name, "valid".green());
        } else {
            println!("Profile '{}': {}", p.name, "invalid".red());
        }
        for error in &p.structural.errors {
            println!("  {} {}", "\u{2717}".red(), error);
        }
        for warning in &p.structural.warnings {
            println!("  {} {}", "!".yellow(), warning);
        }
        if let Some(c) = &p.connectivity {
            let latency = c
                .latency_ms
                .map(|ms| format!(" ({}ms)", ms))
                .unwrap_or_default();
            match c.status {
                ConnectStatus::Ok => {
                    println!("  {} {}{}", "\u{2713}".green(), c.detail, latency)
                }
                _ => println!("  {} {}{}", "\u{2717}".red(), c.detail, latency),
            }
        }
    }

    if let Some(name) = &result.default_profile {
        println!();
        if result.default_valid {
            println!("{} Default profile: {}", "\u{2713}".green(), name);
        } else {
            println!(
                "{} Default profile '{}' does not exist",
                "\u{2717}".red(),
                name
            );
        }
    }
}
