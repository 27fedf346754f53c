//! Periodic health reporting.
//!
//! The service polls [`TrapPipeline::health_check`] on an interval and logs
//! the result together with uptime and the pipeline counters.

use std::time::Instant;

use serde::Serialize;

use mibtrap_core::pipeline::{HealthStatus, Pipeline};
use mibtrap_trap_pipeline::{StatsSnapshot, TrapPipeline};

/// Health report for the running daemon.
#[derive(Debug, Clone, Serialize)]
pub struct DaemonHealth {
    /// Pipeline health status.
    pub status: HealthStatus,
    /// Seconds since the pipeline started.
    pub uptime_secs: u64,
    /// Pipeline lifecycle state name.
    pub state: String,
    /// Counter snapshot.
    pub stats: StatsSnapshot,
}

impl DaemonHealth {
    /// Take a snapshot of `pipeline`.
    pub async fn collect(pipeline: &TrapPipeline, started: Instant) -> Self {
        Self {
            status: pipeline.health_check().await,
            uptime_secs: started.elapsed().as_secs(),
            state: pipeline.state_name().to_owned(),
            stats: pipeline.stats(),
        }
    }

    /// Log the report at a level matching its status.
    pub fn log(&self) {
        let stats = &self.stats;
        match &self.status {
            HealthStatus::Healthy => tracing::debug!(
                uptime_secs = self.uptime_secs,
                received = stats.datagrams_received,
                processed = stats.traps_processed,
                "daemon healthy"
            ),
            HealthStatus::Degraded(reason) => tracing::warn!(
                uptime_secs = self.uptime_secs,
                reason = %reason,
                sink_failures = stats.sink_failures,
                "daemon degraded"
            ),
            HealthStatus::Unhealthy(reason) => tracing::error!(
                uptime_secs = self.uptime_secs,
                state = %self.state,
                reason = %reason,
                "daemon unhealthy"
            ),
        }
    }
}
