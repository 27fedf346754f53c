use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use mibtrap_core::config::MibtrapConfig;
use mibtrap_daemon::cli::DaemonCli;
use mibtrap_daemon::{ServiceExit, TrapService, logging, metrics_server, service};

#[tokio::main]
async fn main() -> ExitCode {
    match run(DaemonCli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("mibtrap-daemon: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: DaemonCli) -> Result<ExitCode> {
    let mut config = MibtrapConfig::load(&cli.config).await?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    logging::init_tracing(&config.general)?;
    tracing::info!(
        config = %cli.config.display(),
        version = env!("CARGO_PKG_VERSION"),
        "mibtrap-daemon starting"
    );

    if cli.validate {
        let (mib, catalog) = service::load_catalog(&config.catalog).await?;
        println!("configuration OK: {}", cli.config.display());
        println!("manufacturer:     {}", mib.manufacturer);
        println!("MIB module:       {}", mib.path.display());
        println!("trap records:     {}", catalog.len());
        return Ok(ExitCode::SUCCESS);
    }

    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config.metrics)?;
    }

    let mut service = TrapService::bootstrap(&config).await?;
    match service.run().await? {
        ServiceExit::Graceful => {
            tracing::info!("mibtrap-daemon shut down");
            Ok(ExitCode::SUCCESS)
        }
        ServiceExit::Abnormal(reason) => {
            tracing::error!(reason = %reason, "mibtrap-daemon stopped abnormally");
            Ok(ExitCode::FAILURE)
        }
    }
}
