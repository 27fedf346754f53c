//! `mibtrap mapping` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use mibtrap_core::config::MibtrapConfig;
use mibtrap_mib_catalog::{DeviceMapping, detect_manufacturer};

use crate::cli::{MappingAction, MappingArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `mapping` command.
pub async fn execute(
    args: MappingArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        MappingAction::Resolve { manufacturer } => {
            let config = MibtrapConfig::load(config_path).await?;
            let report = resolve(&config, manufacturer.as_deref()).await?;
            writer.render(&report)
        }
    }
}

/// Resolve the MIB module path the daemon would load.
///
/// `--manufacturer` wins over `catalog.manufacturer`, which wins over DMI.
async fn resolve(
    config: &MibtrapConfig,
    manufacturer: Option<&str>,
) -> Result<MappingReport, CliError> {
    let catalog = &config.catalog;
    let configured = manufacturer.or(catalog.manufacturer.as_deref());
    let manufacturer = detect_manufacturer(configured, &catalog.identity_dir).await?;

    info!(mapping = %catalog.mapping_path, manufacturer = %manufacturer, "resolving device mapping");
    let mapping = DeviceMapping::load(&catalog.mapping_path).await?;
    let resolved = mapping.resolve(&manufacturer)?;
    let exists = tokio::fs::try_exists(&resolved.path).await.unwrap_or(false);

    Ok(MappingReport {
        mapping: catalog.mapping_path.clone(),
        manufacturer: resolved.manufacturer,
        mib_path: resolved.path.display().to_string(),
        exists,
    })
}

/// Result of `mapping resolve`.
#[derive(Serialize)]
pub struct MappingReport {
    pub mapping: String,
    pub manufacturer: String,
    pub mib_path: String,
    /// Whether the resolved MIB module is present on disk.
    pub exists: bool,
}

impl Render for MappingReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Device Mapping: {}", self.mapping.bold())?;
        writeln!(w, "  Manufacturer: {}", self.manufacturer)?;
        writeln!(w, "  MIB module:   {}", self.mib_path)?;
        if self.exists {
            writeln!(w, "  File:         {}", "present".green())?;
        } else {
            writeln!(w, "  File:         {}", "missing".red())?;
        }
        Ok(())
    }
}
