//! CLI argument parsing using clap derive API
//!
//! Purely declarative; no I/O happens here.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// mibtrap -- SNMP trap receiver operator tool.
///
/// Use `mibtrap <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "mibtrap", version, about, long_about = None)]
pub struct Cli {
    /// Path to the mibtrap.toml configuration file.
    #[arg(short, long, default_value = "mibtrap.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect a MIB module.
    Catalog(CatalogArgs),

    /// Resolve the MIB module for a manufacturer.
    Mapping(MappingArgs),

    /// Manage configuration.
    Config(ConfigArgs),

    /// Send test traps.
    Trap(TrapArgs),
}

// ---- catalog ----

#[derive(Args, Debug)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub action: CatalogAction,
}

#[derive(Subcommand, Debug)]
pub enum CatalogAction {
    /// Parse a MIB module and list its trap records.
    Show {
        /// MIB module file.
        mib: PathBuf,
    },
    /// Show one trap record in full.
    Lookup {
        /// MIB module file.
        mib: PathBuf,
        /// Specific-trap code.
        id: u32,
    },
}

// ---- mapping ----

#[derive(Args, Debug)]
pub struct MappingArgs {
    #[command(subcommand)]
    pub action: MappingAction,
}

#[derive(Subcommand, Debug)]
pub enum MappingAction {
    /// Resolve the MIB path through the mapping file named in the config.
    Resolve {
        /// Manufacturer name (default: from config, then DMI).
        #[arg(long)]
        manufacturer: Option<String>,
    },
}

// ---- config ----

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, listener, catalog, resolver, sink, metrics).
        #[arg(long)]
        section: Option<String>,
    },
}

// ---- trap ----

#[derive(Args, Debug)]
pub struct TrapArgs {
    #[command(subcommand)]
    pub action: TrapAction,
}

#[derive(Subcommand, Debug)]
pub enum TrapAction {
    /// Encode a trap and send it over UDP.
    Send(SendArgs),
}

/// SNMP version of a test trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TrapVersion {
    #[value(name = "1")]
    V1,
    #[value(name = "2c")]
    V2c,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Receiver address, `host` or `host:port` (default port 162).
    pub target: String,

    /// SNMP version.
    #[arg(long, default_value = "1")]
    pub version: TrapVersion,

    /// Community string.
    #[arg(long, default_value = "public")]
    pub community: String,

    /// Generic-trap code (v1 only).
    #[arg(long, default_value_t = 6)]
    pub generic: i32,

    /// Specific-trap code.
    #[arg(long, default_value_t = 1)]
    pub specific: i32,

    /// Enterprise OID.
    #[arg(long, default_value = "1.3.6.1.4.1")]
    pub enterprise: String,

    /// Agent address carried in a v1 trap.
    #[arg(long, default_value = "127.0.0.1")]
    pub agent: Ipv4Addr,

    /// Variable binding as `OID=TEXT`; repeatable.
    #[arg(long = "var")]
    pub vars: Vec<String>,
}
