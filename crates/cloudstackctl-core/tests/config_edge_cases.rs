use std::fs;
use std::path::PathBuf;

use cloudstackctl_core::config::{Config, ConfigError, Profile};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Returns true if running as root (euid == 0). Used to skip permission tests.
#[cfg(unix)]
fn is_root() -> bool {
    std::process::Command::new("id")
        .arg("-u")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim() == "0")
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// 1. Missing config directory / nonexistent path
// ---------------------------------------------------------------------------

#[test]
fn load_from_nonexistent_path_returns_default_config() {
    let path = PathBuf::from("/tmp/cloudstackctl-test-nonexistent/does/not/exist/config.toml");
    assert!(!path.exists());

    let config = Config::load_from_path(&path).expect("should not error on missing path");

    assert!(config.profiles.is_empty());
    assert!(config.default_profile.is_none());
}

// ---------------------------------------------------------------------------
// 2. Empty config file
// ---------------------------------------------------------------------------

#[test]
fn load_empty_config_file_returns_default_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "").unwrap();

    let config = Config::load_from_path(&config_path).expect("empty file should parse as default");

    assert_eq!(config, Config::default());
}

// ---------------------------------------------------------------------------
// 3. Corrupt / invalid TOML
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_toml_returns_parse_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[[[broken").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
    assert!(
        err.to_string().contains("parse"),
        "error should mention parsing: {err}"
    );
}

#[test]
fn load_wrongly_typed_field_returns_parse_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[profiles.lab]
api_url = "https://lab.example.com/client/api"
timeout_secs = "thirty"
"#,
    )
    .unwrap();

    assert!(matches!(
        Config::load_from_path(&config_path),
        Err(ConfigError::ParseError(_))
    ));
}

// ---------------------------------------------------------------------------
// 4. Partial profile: loads, but cannot produce credentials
// ---------------------------------------------------------------------------

#[test]
fn partial_profile_fails_at_credential_resolution() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[profiles.partial]
api_url = "https://lab.example.com/client/api"
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&config_path).unwrap();
    let profile = config.get_profile("partial").unwrap();

    let err = profile.resolve_credentials("partial", false).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingField {
            field: "api_key",
            ..
        }
    ));
}

// ---------------------------------------------------------------------------
// 5. Config with unknown / extra fields
// ---------------------------------------------------------------------------

#[test]
fn load_config_with_unknown_fields_ignores_them() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");

    let content = r#"
unknown_top_level_key = "hello"

[profiles.lab]
api_url = "https://lab.example.com/client/api"
api_key = "k"
secret_key = "s"
totally_unknown_field = true
"#;
    fs::write(&config_path, content).unwrap();

    let config =
        Config::load_from_path(&config_path).expect("unknown fields should be silently ignored");

    assert!(config.profiles.contains_key("lab"));
}

// ---------------------------------------------------------------------------
// 6. Save and load round trip through a nested directory
// ---------------------------------------------------------------------------

#[test]
fn save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("nested").join("deeper").join("config.toml");

    let mut config = Config::default();
    let mut profile = Profile::new("https://lab.example.com/client/api", "k", "s");
    profile.zone = Some("zone1".to_string());
    profile.async_timeout_secs = Some(900);
    config.set_profile("lab".to_string(), profile);
    config.default_profile = Some("lab".to_string());

    config.save_to_path(&config_path).unwrap();
    let loaded = Config::load_from_path(&config_path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
#[serial_test::serial]
fn env_expansion_applies_on_load() {
    unsafe {
        std::env::set_var("CLOUDSTACKCTL_EDGE_SECRET", "from-env");
    }

    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[profiles.lab]
api_url = "${CLOUDSTACKCTL_EDGE_URL:-https://fallback.example.com/client/api}"
api_key = "k"
secret_key = "${CLOUDSTACKCTL_EDGE_SECRET}"
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&config_path).unwrap();

    unsafe {
        std::env::remove_var("CLOUDSTACKCTL_EDGE_SECRET");
    }

    let profile = config.get_profile("lab").unwrap();
    assert_eq!(profile.secret_key, "from-env");
    assert_eq!(profile.api_url, "https://fallback.example.com/client/api");
}

// ---------------------------------------------------------------------------
// 7. Permission errors (unix only)
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn load_unreadable_file_returns_clear_error() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        eprintln!("skipping test: running as root");
        return;
    }

    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "# valid toml").unwrap();

    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o000)).unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::LoadError { .. }));

    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o644)).unwrap();
}

#[cfg(unix)]
#[test]
fn save_to_readonly_directory_returns_clear_error() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        eprintln!("skipping test: running as root");
        return;
    }

    let dir = TempDir::new().unwrap();
    let readonly_dir = dir.path().join("readonly");
    fs::create_dir(&readonly_dir).unwrap();
    fs::set_permissions(&readonly_dir, fs::Permissions::from_mode(0o444)).unwrap();

    let config_path = readonly_dir.join("config.toml");
    let err = Config::default().save_to_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::SaveError { .. }));
    assert!(err.to_string().contains("save"));

    fs::set_permissions(&readonly_dir, fs::Permissions::from_mode(0o755)).unwrap();
}
