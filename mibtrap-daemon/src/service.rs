//! Service bootstrap and lifecycle.
//!
//! [`TrapService`] wires configuration, device mapping, the MIB catalog and
//! the event sinks into a [`TrapPipeline`], then runs it until a shutdown
//! signal arrives or the receive loop dies.
//!
//! # Startup Order
//!
//! 1. Event sinks (so later failures have somewhere to go)
//! 2. Manufacturer detection and device mapping
//! 3. MIB catalog load
//! 4. Pipeline build
//!
//! Any failure in steps 2-4 is written to the sinks as an error notice and
//! aborts startup; the pipeline never starts without a catalog.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use mibtrap_core::config::{CatalogConfig, MibtrapConfig, SinkConfig};
use mibtrap_core::error::MibtrapError;
use mibtrap_core::metrics as m;
use mibtrap_core::pipeline::Pipeline;
use mibtrap_core::types::Severity;
use mibtrap_mib_catalog::{MibCatalog, ResolvedMib, resolve_configured};
use mibtrap_trap_pipeline::{
    FileSink, LoopStatus, PipelineConfig, ShutdownKind, SinkSet, TracingSink, TrapEvent,
    TrapPipeline, TrapPipelineBuilder,
};

use crate::health::DaemonHealth;
use crate::metrics_server;

const HEALTH_INTERVAL: Duration = Duration::from_secs(30);

/// How the service run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceExit {
    /// Operator-requested shutdown.
    Graceful,
    /// The receive loop failed while it was expected to be running.
    Abnormal(String),
}

/// The trap receiver service.
pub struct TrapService {
    pipeline: TrapPipeline,
    sinks: SinkSet,
    mib: ResolvedMib,
}

impl TrapService {
    /// Build the service from a validated configuration.
    ///
    /// Sinks are created from `[sink]` before anything else.
    pub async fn bootstrap(config: &MibtrapConfig) -> Result<Self> {
        let sinks = build_sinks(&config.sink).await?;
        Self::bootstrap_with_sinks(config, sinks).await
    }

    /// Build the service with caller-provided sinks.
    pub async fn bootstrap_with_sinks(config: &MibtrapConfig, sinks: SinkSet) -> Result<Self> {
        Self::bootstrap_with(config, sinks, |builder| builder).await
    }

    /// Build the service, letting the caller adjust the pipeline builder
    /// (decoder, resolver, receive source) before it is built.
    pub async fn bootstrap_with<F>(config: &MibtrapConfig, sinks: SinkSet, customize: F) -> Result<Self>
    where
        F: FnOnce(TrapPipelineBuilder) -> TrapPipelineBuilder,
    {
        let (mib, catalog) = match load_catalog(&config.catalog).await {
            Ok(loaded) => loaded,
            Err(e) => return Err(startup_failed(&sinks, e).await),
        };

        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!(m::CATALOG_RECORDS_LOADED).set(catalog.len() as f64);
        notify(
            &sinks,
            Severity::Information,
            format!(
                "MIB catalog loaded from {} ({} records)",
                mib.path.display(),
                catalog.len()
            ),
        )
        .await;

        let pipeline = customize(
            TrapPipelineBuilder::new()
                .config(PipelineConfig::from_core(config))
                .catalog(catalog)
                .sinks(sinks.clone()),
        )
        .build();
        let pipeline = match pipeline {
            Ok(pipeline) => pipeline,
            Err(e) => return Err(startup_failed(&sinks, e.into()).await),
        };

        Ok(Self {
            pipeline,
            sinks,
            mib,
        })
    }

    pub fn pipeline(&self) -> &TrapPipeline {
        &self.pipeline
    }

    /// Manufacturer and MIB module the catalog was loaded from.
    pub fn mib(&self) -> &ResolvedMib {
        &self.mib
    }

    /// Run until `shutdown` resolves or the receive loop exits on its own.
    ///
    /// In-flight workers are not cancelled; their events may land after the
    /// stop notice.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<ServiceExit>
    where
        F: Future<Output = ()>,
    {
        // Subscribe first so a loop that dies right after start is still seen.
        let mut status = self.pipeline.subscribe_status();
        if let Err(e) = self.pipeline.start().await {
            return Err(startup_failed(&self.sinks, e).await);
        }

        let started = Instant::now();
        let uptime_stop = CancellationToken::new();
        let uptime = metrics_server::spawn_uptime_updater(started, uptime_stop.clone());

        notify(&self.sinks, Severity::Information, "Service started").await;
        tracing::info!(
            manufacturer = %self.mib.manufacturer,
            mib = %self.mib.path.display(),
            addr = ?self.pipeline.local_addr(),
            "mibtrap service running"
        );

        let mut health = tokio::time::interval(HEALTH_INTERVAL);
        health.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                changed = status.changed() => {
                    if changed.is_err() || matches!(*status.borrow_and_update(), LoopStatus::Exited(_)) {
                        tracing::error!("receive loop exited without a shutdown request");
                        break;
                    }
                }
                _ = health.tick() => {
                    DaemonHealth::collect(&self.pipeline, started).await.log();
                }
            }
        }

        let kind = self.pipeline.shutdown().await;
        uptime_stop.cancel();
        if let Err(e) = uptime.await {
            tracing::warn!(error = %e, "uptime updater task failed");
        }

        let exit = match kind? {
            ShutdownKind::Graceful => {
                notify(&self.sinks, Severity::Information, "Service has stopped").await;
                ServiceExit::Graceful
            }
            ShutdownKind::Abnormal(reason) => {
                notify(
                    &self.sinks,
                    Severity::Error,
                    format!("Service stopped abnormally: {reason}"),
                )
                .await;
                ServiceExit::Abnormal(reason)
            }
        };
        Ok(exit)
    }

    /// Run until SIGTERM/SIGINT (Ctrl-C off unix).
    pub async fn run(&mut self) -> Result<ServiceExit> {
        let signal = ShutdownSignal::install()?;
        self.run_until(async move {
            let name = signal.recv().await;
            tracing::info!(signal = name, "shutdown signal received");
        })
        .await
    }
}

/// Create the sinks enabled under `[sink]`.
pub async fn build_sinks(config: &SinkConfig) -> Result<SinkSet> {
    let mut sinks = SinkSet::new();
    if config.event_log {
        sinks.push(Arc::new(TracingSink::new()));
    }
    if config.file_log {
        let file = FileSink::create(&config.log_dir)
            .await
            .map_err(|e| anyhow::anyhow!("failed to open file log in {}: {}", config.log_dir, e))?;
        tracing::info!(path = %file.path().display(), "file log opened");
        sinks.push(Arc::new(file));
    }
    if sinks.is_empty() {
        tracing::warn!("all event sinks are disabled; traps will only be counted");
    }
    Ok(sinks)
}

/// Resolve the MIB module for the local manufacturer and parse it.
pub async fn load_catalog(
    config: &CatalogConfig,
) -> Result<(ResolvedMib, MibCatalog), MibtrapError> {
    let mib = resolve_configured(config).await?;
    let catalog = MibCatalog::load(&mib.path).await?;
    tracing::info!(
        manufacturer = %mib.manufacturer,
        path = %mib.path.display(),
        records = catalog.len(),
        "MIB catalog loaded"
    );
    Ok((mib, catalog))
}

async fn notify(sinks: &SinkSet, severity: Severity, message: impl Into<String>) {
    sinks.write(&TrapEvent::notice(severity, message)).await;
}

async fn startup_failed(sinks: &SinkSet, err: MibtrapError) -> anyhow::Error {
    tracing::error!(error = %err, "service failed to start");
    notify(
        sinks,
        Severity::Error,
        format!("Service failed to start: {err}"),
    )
    .await;
    err.into()
}

/// Installed process signal handlers.
struct ShutdownSignal {
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
}

impl ShutdownSignal {
    #[cfg(unix)]
    fn install() -> Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;
        Ok(Self { sigterm, sigint })
    }

    #[cfg(not(unix))]
    fn install() -> Result<Self> {
        Ok(Self {})
    }

    #[cfg(unix)]
    async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }

    #[cfg(not(unix))]
    async fn recv(self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        "Ctrl-C"
    }
}
