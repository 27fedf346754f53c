//! Logging initialization for mibtrap-daemon.
//!
//! Configures `tracing-subscriber` from the `[general]` section of
//! `MibtrapConfig`. The trap event log (target `mibtrap::events`) is kept
//! at `info` regardless of the general level so that lifecycle notices and
//! traps are never filtered out by a quieter `log_level`.

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use mibtrap_core::config::GeneralConfig;
use mibtrap_trap_pipeline::sink::EVENT_TARGET;

/// Build the level filter.
///
/// `RUST_LOG` wins when it is set and valid; otherwise `level` applies to
/// everything except the event log target.
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(format!("{level},{EVENT_TARGET}=info"))
        .map_err(|e| anyhow::anyhow!("invalid log level '{}': {}", level, e))
}

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
///
/// # Formats
///
/// * `"json"` - one JSON object per line (default for production)
/// * `"pretty"` - multi-line human-readable output (for development)
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let filter = build_filter(&config.log_level)?;

    let output = match config.log_format.as_str() {
        "json" => fmt::layer().json().boxed(),
        "pretty" => fmt::layer().pretty().boxed(),
        other => {
            return Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'json' or 'pretty'",
                other
            ));
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {}", e))
}
