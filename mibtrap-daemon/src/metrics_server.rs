//! Prometheus scrape endpoint and daemon-level gauges.
//!
//! The exporter's built-in HTTP listener serves `/metrics`; everything the
//! pipeline records through the `metrics` macros shows up there once the
//! recorder is installed.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use mibtrap_core::config::MetricsConfig;
use mibtrap_core::metrics as m;

const UPTIME_INTERVAL: Duration = Duration::from_secs(10);

/// Resolve the scrape listener address from `[metrics]`.
///
/// # Errors
///
/// - `endpoint` is anything other than `/metrics`
/// - `listen_addr:port` is not a socket address
pub fn listen_addr(config: &MetricsConfig) -> Result<SocketAddr> {
    if config.endpoint != "/metrics" {
        return Err(anyhow::anyhow!(
            "unsupported metrics endpoint '{}': only '/metrics' is served",
            config.endpoint
        ));
    }

    format!("{}:{}", config.listen_addr, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid metrics listen address: {}", e))
}

/// Install the global Prometheus recorder and start its HTTP listener.
///
/// Call once per process, before the pipeline starts.
pub fn install_metrics_recorder(config: &MetricsConfig) -> Result<SocketAddr> {
    let addr = listen_addr(config)?;

    if addr.ip().is_unspecified() {
        tracing::warn!(
            listen_addr = %addr,
            "metrics endpoint is exposed on all interfaces"
        );
    }

    PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full(
                m::TRAP_PIPELINE_PROCESSING_DURATION_SECONDS.to_owned(),
            ),
            &m::PROCESSING_DURATION_BUCKETS,
        )
        .map_err(|e| anyhow::anyhow!("invalid histogram buckets: {}", e))?
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {}", e))?;

    m::describe_all();
    record_build_info();

    tracing::info!(listen_addr = %addr, "Prometheus metrics endpoint active");
    Ok(addr)
}

/// Set the constant build info gauge.
pub fn record_build_info() {
    metrics::gauge!(m::DAEMON_BUILD_INFO, m::LABEL_VERSION => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Refresh the uptime gauge until `shutdown` fires.
pub fn spawn_uptime_updater(started: Instant, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UPTIME_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    #[allow(clippy::cast_precision_loss)]
                    metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(started.elapsed().as_secs() as f64);
                }
                () = shutdown.cancelled() => break,
            }
        }
        tracing::debug!("uptime updater stopped");
    })
}
