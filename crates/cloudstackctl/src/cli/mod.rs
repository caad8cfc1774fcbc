//! CLI structure and command definitions
//!
//! Two layers share one binary:
//! 1. Raw API access (`api`), any command with any parameters
//! 2. Human-friendly resource commands (`vm`, `volume`, `network`, ...)

use clap::{Parser, Subcommand};

pub mod resources;

pub use resources::*;

/// Apache CloudStack command line client
#[derive(Parser, Debug)]
#[command(name = "cloudstackctl")]
#[command(version, about = "Command line client for Apache CloudStack")]
#[command(long_about = "
Command line client for Apache CloudStack

Every request is signed with the API key and secret key of the selected
profile, or with CLOUDSTACK_API_URL, CLOUDSTACK_API_KEY and
CLOUDSTACK_SECRET_KEY from the environment.

EXAMPLES:
    # Set up a profile
    cloudstackctl profile set lab --api-url https://cloud.example.com/client/api --api-key KEY

    # List running VMs
    cloudstackctl vm list --state Running

    # Deploy a VM and wait for it
    cloudstackctl vm deploy --name web-1 --zone zone1 --template ubuntu-22.04 --offering small --wait

    # Filter output with JMESPath
    cloudstackctl vm list -q '[?state==`Running`].name'

    # Call any API command
    cloudstackctl api listCapabilities

For more help on a specific command, run:
    cloudstackctl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "CLOUDSTACKCTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "CLOUDSTACKCTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// JMESPath query to filter output
    #[arg(long, short = 'q', global = true)]
    pub query: Option<String>,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Tables for people, JSON once a query is given
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Raw API access - call any CloudStack command
    #[command(name = "api")]
    #[command(after_help = "EXAMPLES:
    # List zones
    cloudstackctl api listZones available=true

    # Parameters with brackets need quoting in most shells
    cloudstackctl api listVirtualMachines 'tags[0].key=env' 'tags[0].value=prod'

    # Async commands return a job id
    cloudstackctl api stopVirtualMachine id=9a1d... --wait

    # Parameters from a JSON object
    cloudstackctl api deployVirtualMachine --data @deploy.json
")]
    Api {
        /// CloudStack command name (e.g., listVirtualMachines)
        command: String,

        /// Parameters as key=value pairs
        #[arg(value_parser = parse_key_value)]
        params: Vec<(String, String)>,

        /// Parameters as a flat JSON object (JSON string or @file)
        #[arg(long)]
        data: Option<String>,

        /// Wait for the job if the command is asynchronous
        #[arg(long)]
        wait: bool,
    },

    /// Profile management
    #[command(subcommand, visible_alias = "prof", visible_alias = "pr")]
    #[command(after_help = "EXAMPLES:
    # Create a profile (the secret key is prompted for)
    cloudstackctl profile set lab --api-url https://cloud.example.com/client/api --api-key KEY

    # List all profiles
    cloudstackctl profile list

    # Show profile details
    cloudstackctl profile show lab

    # Make it the default
    cloudstackctl profile default lab

    # Validate configuration
    cloudstackctl profile validate
")]
    Profile(ProfileCommands),

    /// Virtual machines
    #[command(subcommand, name = "vm", visible_alias = "instance")]
    Vm(VmCommands),

    /// Zones
    #[command(subcommand)]
    Zone(ZoneCommands),

    /// Templates
    #[command(subcommand, visible_alias = "tpl")]
    Template(TemplateCommands),

    /// Service and disk offerings
    #[command(subcommand)]
    Offering(OfferingCommands),

    /// Volumes
    #[command(subcommand, visible_alias = "vol")]
    Volume(VolumeCommands),

    /// Volume snapshots
    #[command(subcommand, visible_alias = "snap")]
    Snapshot(SnapshotCommands),

    /// Networks and port forwarding
    #[command(subcommand, visible_alias = "net")]
    Network(NetworkCommands),

    /// Async jobs
    #[command(subcommand)]
    Job(JobCommands),

    /// Version information
    #[command(visible_alias = "ver", visible_alias = "v")]
    Version,

    /// Generate shell completions
    #[command(visible_alias = "comp")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bourne Again Shell
    Bash,
    /// Z Shell
    Zsh,
    /// Friendly Interactive Shell
    Fish,
    /// PowerShell
    #[value(name = "powershell", alias = "power-shell")]
    PowerShell,
    /// Elvish
    Elvish,
}

/// Parse a `key=value` API parameter
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("invalid parameter '{}': expected key=value", s)),
    }
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls", visible_alias = "l")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "sh", visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add", visible_alias = "create")]
    #[command(after_help = "EXAMPLES:
    # Create a profile, prompting for the secret key
    cloudstackctl profile set lab \\
        --api-url https://cloud.example.com/client/api \\
        --api-key mJtnmW1ZHdvdSyxdOBoN7rbqj3rOmG0gMTK8EZ6

    # Lab installs with self-signed certificates
    cloudstackctl profile set dev \\
        --api-url https://10.0.0.10:8443/client/api \\
        --api-key KEY --secret-key SECRET --insecure

    # Default zone and slower job polling
    cloudstackctl profile set prod --api-url URL --api-key KEY \\
        --zone zone1 --poll-interval 5 --async-timeout 1800
")]
    Set {
        /// Profile name
        name: String,

        /// API endpoint, e.g. https://cloud.example.com/client/api
        #[arg(long)]
        api_url: String,

        /// API key
        #[arg(long)]
        api_key: String,

        /// Secret key (prompted for when omitted)
        #[arg(long)]
        secret_key: Option<String>,

        /// Skip TLS certificate verification
        #[arg(long)]
        insecure: bool,

        /// HTTP request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// How long to wait for async jobs, in seconds
        #[arg(long)]
        async_timeout: Option<u64>,

        /// Delay between job polls, in seconds
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Zone used when a command needs one and none is given
        #[arg(long)]
        zone: Option<String>,

        /// Project to scope commands to
        #[arg(long)]
        project_id: Option<String>,

        /// Store credentials in OS keyring instead of config file
        #[cfg(feature = "secure-storage")]
        #[arg(long)]
        use_keyring: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm", visible_alias = "del", visible_alias = "delete")]
    Remove {
        /// Profile name to remove
        name: String,
    },

    /// Set the default profile
    #[command(name = "default", visible_alias = "def")]
    Default {
        /// Profile name to use when --profile is not given
        name: String,
    },

    /// Validate configuration file and profiles
    #[command(visible_alias = "check")]
    #[command(after_help = "EXAMPLES:
    # Validate all profiles and configuration
    cloudstackctl profile validate

    # Also check that each profile can reach its endpoint
    cloudstackctl profile validate --connect
")]
    Validate {
        /// Call listCapabilities with each profile
        #[arg(long)]
        connect: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("zoneid=abc").unwrap(),
            ("zoneid".to_string(), "abc".to_string())
        );
        assert_eq!(
            parse_key_value("userdata=a=b").unwrap(),
            ("userdata".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_api_command_parses_params() {
        let cli = Cli::try_parse_from([
            "cloudstackctl",
            "api",
            "listZones",
            "available=true",
            "name=zone1",
        ])
        .unwrap();
        match cli.command {
            Commands::Api { command, params, .. } => {
                assert_eq!(command, "listZones");
                assert_eq!(params.len(), 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
