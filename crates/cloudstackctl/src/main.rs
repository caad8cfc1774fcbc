use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, shells};
use cloudstackctl_core::Config;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use commands::CommandContext;
use connection::ConnectionManager;
use error::CloudStackCtlError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    let conn_mgr = match load_connection_manager(cli.config_file.as_deref()) {
        Ok(conn_mgr) => conn_mgr,
        Err(e) => {
            e.print_diagnostic();
            std::process::exit(1);
        }
    };

    if let Err(e) = execute_command(&cli, &conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

/// Load configuration from the given path or the default location
fn load_connection_manager(
    config_file: Option<&str>,
) -> Result<ConnectionManager, CloudStackCtlError> {
    let (config, config_path) = if let Some(config_file) = config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        let config = Config::load_from_path(&path)?;
        (config, Some(path))
    } else {
        debug!("Loading config from default location");
        (Config::load()?, None)
    };
    debug!(
        "Creating ConnectionManager with config_path: {:?}",
        config_path
    );
    Ok(ConnectionManager::with_config_path(config, config_path))
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "cloudstackctl=warn,cloudstackctl_core=warn,cloudstack=warn",
            1 => "cloudstackctl=info,cloudstackctl_core=info,cloudstack=info",
            2 => "cloudstackctl=debug,cloudstackctl_core=debug,cloudstack=debug",
            _ => "cloudstackctl=trace,cloudstackctl_core=trace,cloudstack=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(
    cli: &Cli,
    conn_mgr: &ConnectionManager,
) -> Result<(), CloudStackCtlError> {
    // Log command execution with sanitized parameters
    info!("Command: {}", format_command(&cli.command));

    let ctx = CommandContext {
        conn_mgr,
        profile: cli.profile.as_deref(),
        output: cli.output,
        query: cli.query.as_deref(),
    };

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            match cli.output {
                cli::OutputFormat::Json | cli::OutputFormat::Yaml => {
                    let output_data = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "name": env!("CARGO_PKG_NAME"),
                    });

                    let fmt = match cli.output {
                        cli::OutputFormat::Yaml => output::OutputFormat::Yaml,
                        _ => output::OutputFormat::Json,
                    };

                    output::print_output(&output_data, fmt, None)?;
                }
                _ => {
                    println!("cloudstackctl {}", env!("CARGO_PKG_VERSION"));
                }
            }
            Ok(())
        }
        Commands::Completions { shell } => {
            debug!("Generating completions for {:?}", shell);
            generate_completions(*shell);
            Ok(())
        }

        Commands::Profile(profile_cmd) => {
            debug!("Executing profile command");
            commands::profile::handle_profile_command(profile_cmd, conn_mgr, cli.output).await
        }

        Commands::Api {
            command,
            params,
            data,
            wait,
        } => {
            info!(
                "API call: {} ({} params{})",
                command,
                params.len(),
                if data.is_some() { ", with data" } else { "" }
            );
            commands::api::handle_api_command(&ctx, command, params, data.as_deref(), *wait).await
        }

        Commands::Vm(cmd) => commands::vm::handle_vm_command(&ctx, cmd).await,
        Commands::Zone(cmd) => commands::catalog::handle_zone_command(&ctx, cmd).await,
        Commands::Template(cmd) => commands::catalog::handle_template_command(&ctx, cmd).await,
        Commands::Offering(cmd) => commands::catalog::handle_offering_command(&ctx, cmd).await,
        Commands::Volume(cmd) => commands::volume::handle_volume_command(&ctx, cmd).await,
        Commands::Snapshot(cmd) => commands::snapshot::handle_snapshot_command(&ctx, cmd).await,
        Commands::Network(cmd) => commands::network::handle_network_command(&ctx, cmd).await,
        Commands::Job(cmd) => commands::job::handle_job_command(&ctx, cmd).await,
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

fn generate_completions(shell: cli::Shell) {
    let mut cmd = cli::Cli::command();
    let name = cmd.get_name().to_string();

    match shell {
        cli::Shell::Bash => generate(shells::Bash, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Zsh => generate(shells::Zsh, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Fish => generate(shells::Fish, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, name, &mut std::io::stdout())
        }
        cli::Shell::Elvish => generate(shells::Elvish, &mut cmd, name, &mut std::io::stdout()),
    }
}

/// Format command for human-readable logging (without sensitive data)
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Version => "version".to_string(),
        Commands::Completions { shell } => format!("completions {:?}", shell),
        Commands::Profile(cmd) => {
            use cli::ProfileCommands::*;
            match cmd {
                List => "profile list".to_string(),
                Path => "profile path".to_string(),
                Show { name } => format!("profile show {}", name),
                Set { name, .. } => format!("profile set {} [credentials redacted]", name),
                Remove { name } => format!("profile remove {}", name),
                Default { name } => format!("profile default {}", name),
                Validate { connect } => format!("profile validate (connect={})", connect),
            }
        }
        Commands::Api { command, params, .. } => {
            let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
            format!("api {} [{}]", command, keys.join(", "))
        }
        Commands::Vm(cmd) => format!("vm {:?}", cmd),
        Commands::Zone(cmd) => format!("zone {:?}", cmd),
        Commands::Template(cmd) => format!("template {:?}", cmd),
        Commands::Offering(cmd) => format!("offering {:?}", cmd),
        Commands::Volume(cmd) => format!("volume {:?}", cmd),
        Commands::Snapshot(cmd) => format!("snapshot {:?}", cmd),
        Commands::Network(cmd) => format!("network {:?}", cmd),
        Commands::Job(cmd) => format!("job {:?}", cmd),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_command_redacts_profile_credentials() {
        let cli = Cli::parse_from([
            "cloudstackctl",
            "profile",
            "set",
            "lab",
            "--api-url",
            "https://cloud.example.com/client/api",
            "--api-key",
            "AKEY",
            "--secret-key",
            "SECRET",
        ]);
        let formatted = format_command(&cli.command);
        assert_eq!(formatted, "profile set lab [credentials redacted]");
        assert!(!formatted.contains("SECRET"));
    }

    #[test]
    fn test_format_command_hides_api_values() {
        let cli = Cli::parse_from(["cloudstackctl", "api", "listUsers", "apikey=hidden"]);
        let formatted = format_command(&cli.command);
        assert_eq!(formatted, "api listUsers [apikey]");
    }
}
