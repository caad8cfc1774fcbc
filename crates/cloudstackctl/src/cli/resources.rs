//! Resource command definitions
//!
//! Arguments naming a resource (`<VM>`, `--zone`, `--template`, ...) accept
//! either an id or an exact name.

use crate::commands::async_utils::AsyncOperationArgs;
use clap::Subcommand;

/// Virtual machine commands
#[derive(Subcommand, Debug)]
pub enum VmCommands {
    /// List virtual machines
    #[command(visible_alias = "ls")]
    List {
        /// Filter by state (e.g. Running, Stopped)
        #[arg(long)]
        state: Option<String>,

        /// Filter by zone
        #[arg(long)]
        zone: Option<String>,

        /// Filter by keyword
        #[arg(long)]
        keyword: Option<String>,

        /// Include VMs of all accessible accounts
        #[arg(long)]
        all: bool,
    },

    /// Show one virtual machine
    Get {
        /// VM id or name
        vm: String,
    },

    /// Deploy a new virtual machine
    #[command(after_help = "EXAMPLES:
    # Deploy and wait until it is running
    cloudstackctl vm deploy --name web-1 --zone zone1 --template ubuntu-22.04 --offering small --wait

    # Attach to specific networks and pass cloud-init user data
    cloudstackctl vm deploy --name web-2 --template ubuntu-22.04 --offering small \\
        --network frontend --network backend --user-data @cloud-init.yaml
")]
    Deploy {
        /// Host name of the VM
        #[arg(long)]
        name: Option<String>,

        /// Zone (defaults to the profile's zone)
        #[arg(long)]
        zone: Option<String>,

        /// Template
        #[arg(long)]
        template: String,

        /// Service offering
        #[arg(long)]
        offering: String,

        /// Networks to attach (repeatable)
        #[arg(long = "network")]
        networks: Vec<String>,

        /// SSH key pair to install
        #[arg(long)]
        keypair: Option<String>,

        /// Extra data disk from this disk offering
        #[arg(long)]
        disk_offering: Option<String>,

        /// Size in GiB of a custom data disk
        #[arg(long)]
        size: Option<i64>,

        /// User data (string or @file)
        #[arg(long)]
        user_data: Option<String>,

        /// Create the VM without starting it
        #[arg(long)]
        no_start: bool,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Start a stopped virtual machine
    Start {
        /// VM id or name
        vm: String,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Stop a running virtual machine
    Stop {
        /// VM id or name
        vm: String,

        /// Power off instead of a clean shutdown
        #[arg(long)]
        forced: bool,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Reboot a virtual machine
    Reboot {
        /// VM id or name
        vm: String,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Destroy a virtual machine
    Destroy {
        /// VM id or name
        vm: String,

        /// Expunge immediately; the VM cannot be recovered
        #[arg(long)]
        expunge: bool,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },
}

/// Zone commands
#[derive(Subcommand, Debug)]
pub enum ZoneCommands {
    /// List zones
    #[command(visible_alias = "ls")]
    List {
        /// Only zones you can deploy into
        #[arg(long)]
        available: bool,
    },
}

/// Template commands
#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// List templates
    #[command(visible_alias = "ls")]
    List {
        /// featured, self, selfexecutable, sharedexecutable, executable or community
        #[arg(long, default_value = "executable")]
        filter: String,

        /// Filter by zone
        #[arg(long)]
        zone: Option<String>,

        /// Filter by keyword
        #[arg(long)]
        keyword: Option<String>,
    },
}

/// Offering commands
#[derive(Subcommand, Debug)]
pub enum OfferingCommands {
    /// List service offerings, or disk offerings with --disk
    #[command(visible_alias = "ls")]
    List {
        /// List disk offerings instead
        #[arg(long)]
        disk: bool,
    },
}

/// Volume commands
#[derive(Subcommand, Debug)]
pub enum VolumeCommands {
    /// List volumes
    #[command(visible_alias = "ls")]
    List {
        /// Only volumes of this VM
        #[arg(long)]
        vm: Option<String>,

        /// Filter by type (ROOT or DATADISK)
        #[arg(long = "type")]
        volume_type: Option<String>,
    },

    /// Create a data volume
    #[command(after_help = "EXAMPLES:
    # Create a 50 GiB volume and attach it in one go
    cloudstackctl volume create data-1 --disk-offering custom --size 50 --attach web-1
")]
    Create {
        /// Volume name
        name: String,

        /// Disk offering
        #[arg(long)]
        disk_offering: String,

        /// Zone (defaults to the profile's zone)
        #[arg(long)]
        zone: Option<String>,

        /// Size in GiB for custom disk offerings
        #[arg(long)]
        size: Option<i64>,

        /// Attach to this VM once created (implies --wait)
        #[arg(long)]
        attach: Option<String>,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Attach a volume to a virtual machine
    Attach {
        /// Volume id or name
        volume: String,

        /// VM id or name
        vm: String,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Detach a volume from its virtual machine
    Detach {
        /// Volume id or name
        volume: String,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Delete a detached volume
    Delete {
        /// Volume id or name
        volume: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

/// Snapshot commands
#[derive(Subcommand, Debug)]
pub enum SnapshotCommands {
    /// List snapshots
    #[command(visible_alias = "ls")]
    List {
        /// Only snapshots of this volume
        #[arg(long)]
        volume: Option<String>,
    },

    /// Snapshot a volume
    Create {
        /// Volume id or name
        volume: String,

        /// Snapshot name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Delete a snapshot
    Delete {
        /// Snapshot id
        snapshot: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },
}

/// Network commands
#[derive(Subcommand, Debug)]
pub enum NetworkCommands {
    /// List networks
    #[command(visible_alias = "ls")]
    List {
        /// Filter by zone
        #[arg(long)]
        zone: Option<String>,
    },

    /// Delete a network
    Delete {
        /// Network id or name
        network: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Acquire a public IP and forward a port to a VM
    #[command(name = "forward-port")]
    #[command(after_help = "EXAMPLES:
    # Expose SSH of web-1 on port 2222
    cloudstackctl network forward-port --network frontend --vm web-1 \\
        --public-port 2222 --private-port 22
")]
    ForwardPort {
        /// Network to acquire the address on
        #[arg(long)]
        network: String,

        /// VM to forward to
        #[arg(long)]
        vm: String,

        /// tcp or udp
        #[arg(long, default_value = "tcp")]
        protocol: String,

        /// Port on the public address
        #[arg(long)]
        public_port: u16,

        /// Port on the VM
        #[arg(long)]
        private_port: u16,

        /// Maximum time to wait for each job in seconds
        #[arg(long)]
        wait_timeout: Option<u64>,

        /// Polling interval in seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        wait_interval: Option<u64>,
    },
}

/// Async job commands
#[derive(Subcommand, Debug)]
pub enum JobCommands {
    /// Show the current state of a job
    Get {
        /// Job id
        job_id: String,
    },

    /// Wait for one or more jobs to finish
    Wait {
        /// Job ids
        #[arg(required = true)]
        job_ids: Vec<String>,

        /// Maximum time to wait in seconds
        #[arg(long)]
        wait_timeout: Option<u64>,

        /// Polling interval in seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        wait_interval: Option<u64>,
    },

    /// List recent jobs
    #[command(visible_alias = "ls")]
    List,
}
