//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// wgmesh - compile network topologies into `WireGuard` mesh configurations.
#[derive(Parser, Debug, Clone)]
#[command(name = "wgmesh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compile a topology and write one `<hostname>.conf` per host.
    Generate(GenerateArgs),

    /// Print the compiled configuration of a single host.
    Show(ShowArgs),

    /// Generate a fresh key pair.
    Keygen,

    /// Derive the public key of a private key.
    Pubkey(PubkeyArgs),
}

/// Network defaults, loaded from a file and overridden by flags.
#[derive(Args, Debug, Clone, Default)]
pub struct DefaultsArgs {
    /// JSON file with network defaults.
    #[arg(long, env = "WGMESH_DEFAULTS", value_name = "FILE")]
    pub defaults: Option<PathBuf>,

    /// Subnet address, or CIDR when no netmask is given.
    #[arg(long)]
    pub address: Option<String>,

    /// Dotted subnet mask.
    #[arg(long)]
    pub netmask: Option<String>,

    /// Listen port for hosts without one.
    #[arg(long)]
    pub listen_port: Option<u16>,

    /// DNS servers for hosts without any (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub dns: Vec<String>,

    /// MTU for hosts without one.
    #[arg(long)]
    pub mtu: Option<u32>,

    /// Routing table for hosts without one.
    #[arg(long)]
    pub table: Option<String>,

    /// Persistent keepalive interval for every peer, in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub keepalive: Option<u16>,
}

/// Arguments for the generate command.
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Topology JSON file.
    pub topology: PathBuf,

    /// Directory to write configurations into. Created if missing.
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Also write the filled-in topology (allocated addresses, generated
    /// keys) to this file, so later runs produce the same keys.
    #[arg(long, value_name = "FILE")]
    pub resolved: Option<PathBuf>,

    /// Network defaults.
    #[command(flatten)]
    pub defaults: DefaultsArgs,
}

/// Arguments for the show command.
#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Topology JSON file.
    pub topology: PathBuf,

    /// Host whose configuration to print.
    pub hostname: String,

    /// Network defaults.
    #[command(flatten)]
    pub defaults: DefaultsArgs,
}

/// Arguments for the pubkey command.
#[derive(Args, Debug, Clone)]
pub struct PubkeyArgs {
    /// Base64 private key.
    pub private_key: String,
}
