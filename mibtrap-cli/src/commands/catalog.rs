//! `mibtrap catalog` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use mibtrap_mib_catalog::{MibCatalog, TrapRecord};

use crate::cli::{CatalogAction, CatalogArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `catalog` command.
pub async fn execute(args: CatalogArgs, writer: &OutputWriter) -> Result<(), CliError> {
    match args.action {
        CatalogAction::Show { mib } => {
            let report = show(&mib).await?;
            writer.render(&report)
        }
        CatalogAction::Lookup { mib, id } => {
            let report = lookup(&mib, id).await?;
            writer.render(&report)
        }
    }
}

async fn show(mib: &Path) -> Result<CatalogReport, CliError> {
    info!(path = %mib.display(), "parsing MIB module");
    let catalog = MibCatalog::load(mib).await?;
    Ok(CatalogReport::new(mib, &catalog))
}

async fn lookup(mib: &Path, id: u32) -> Result<RecordReport, CliError> {
    let catalog = MibCatalog::load(mib).await?;
    let record = catalog.get(id).cloned().ok_or_else(|| {
        CliError::Command(format!(
            "no trap record with id {id} in {} ({} records)",
            mib.display(),
            catalog.len()
        ))
    })?;
    Ok(RecordReport {
        source: mib.display().to_string(),
        record,
    })
}

/// Summary of every record in a MIB module.
#[derive(Serialize)]
pub struct CatalogReport {
    pub source: String,
    pub total: usize,
    pub records: Vec<RecordRow>,
}

/// One line of the catalog listing.
#[derive(Serialize)]
pub struct RecordRow {
    pub index: usize,
    pub id: u32,
    pub trap_type: String,
    pub enterprise: String,
    pub variables: usize,
    pub description: String,
}

impl CatalogReport {
    fn new(source: &Path, catalog: &MibCatalog) -> Self {
        let records = catalog
            .iter()
            .map(|r| RecordRow {
                index: r.index,
                id: r.id,
                trap_type: r.trap_type.clone(),
                enterprise: r.enterprise.clone(),
                variables: r.variables.len(),
                description: r.description.clone(),
            })
            .collect();
        Self {
            source: source.display().to_string(),
            total: catalog.len(),
            records,
        }
    }
}

/// First line of a description, clipped for table output.
fn summary(description: &str, width: usize) -> String {
    let first = description.lines().next().unwrap_or_default().trim();
    if first.chars().count() > width {
        let clipped: String = first.chars().take(width.saturating_sub(3)).collect();
        format!("{clipped}...")
    } else {
        first.to_owned()
    }
}

impl Render for CatalogReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "MIB Catalog: {} ({} records)",
            self.source.bold(),
            self.total.to_string().bold()
        )?;
        writeln!(w)?;
        writeln!(
            w,
            "{:<6} {:<8} {:<28} {:<20} {:<5} {}",
            "INDEX", "ID", "TRAP TYPE", "ENTERPRISE", "VARS", "DESCRIPTION"
        )?;
        writeln!(w, "{}", "-".repeat(100))?;
        for r in &self.records {
            writeln!(
                w,
                "{:<6} {:<8} {:<28} {:<20} {:<5} {}",
                r.index,
                r.id,
                r.trap_type,
                r.enterprise,
                r.variables,
                summary(&r.description, 40)
            )?;
        }
        Ok(())
    }
}

/// A single record in full.
#[derive(Serialize)]
pub struct RecordReport {
    pub source: String,
    #[serde(flatten)]
    pub record: TrapRecord,
}

impl Render for RecordReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let r = &self.record;
        writeln!(w, "Trap {} ({})", r.trap_type.bold(), self.source)?;
        writeln!(w, "  Id:          {}", r.id)?;
        writeln!(w, "  Index:       {}", r.index)?;
        writeln!(w, "  Enterprise:  {}", r.enterprise)?;
        if r.variables.is_empty() {
            writeln!(w, "  Variables:   (none)")?;
        } else {
            writeln!(w, "  Variables:")?;
            for var in &r.variables {
                writeln!(w, "    - {var}")?;
            }
        }
        writeln!(w, "  Description:")?;
        for line in r.description.lines() {
            writeln!(w, "    {}", line.trim())?;
        }
        Ok(())
    }
}
