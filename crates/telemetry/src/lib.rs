//! Logging and tracing bootstrap.

use libris_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `telemetry.level` when set. Calling this more than
/// once is harmless; later calls leave the first subscriber in place.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = build_filter(settings)?;

    let installed = match settings.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init(),
    };

    if installed.is_err() {
        tracing::debug!(target: "libris-telemetry", "tracing subscriber already installed");
        return Ok(());
    }

    tracing::info!(
        target: "libris-telemetry",
        format = ?settings.log_format,
        level = %settings.level,
        "telemetry initialized"
    );
    Ok(())
}

fn build_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.level).map_err(|e| {
            anyhow::anyhow!("invalid telemetry level '{}': {}", settings.level, e)
        }),
    }
}
