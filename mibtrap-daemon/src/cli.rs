//! CLI argument definitions for mibtrap-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use mibtrap_core::config::MibtrapConfig;

/// mibtrap SNMP trap receiver daemon.
///
/// Loads the MIB catalog for the local hardware vendor, listens for
/// SNMP v1/v2c traps and writes a readable event for each one.
#[derive(Parser, Debug)]
#[command(name = "mibtrap-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to mibtrap.toml configuration file.
    #[arg(short, long, default_value = "/etc/mibtrap/mibtrap.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Override the UDP bind address (e.g. 127.0.0.1:1162).
    #[arg(long)]
    pub bind: Option<String>,

    /// Load configuration, device mapping and MIB catalog, then exit.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply command-line overrides on top of the loaded configuration.
    ///
    /// The caller re-validates afterwards since overrides bypass `load`.
    pub fn apply_overrides(&self, config: &mut MibtrapConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
        if let Some(bind) = &self.bind {
            config.listener.bind_addr.clone_from(bind);
        }
    }
}
