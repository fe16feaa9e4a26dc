use tracing_subscriber::{Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::logger::{
    config::LoggerConfig,
    error::{LoggerError, LoggerResult},
    object::{LoggerFormat, LoggerRfc3339},
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Install the global `tracing` subscriber described by `cfg`.
///
/// Fails with [`LoggerError::AlreadyInitialized`] on a second call.
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    let output = output_layer(cfg)?;

    tracing_subscriber::registry()
        .with(output)
        .with(cfg.level.to_env_filter())
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)
}

fn output_layer(cfg: &LoggerConfig) -> LoggerResult<BoxedLayer> {
    let timer = LoggerRfc3339::new(cfg.tz);

    match cfg.format {
        LoggerFormat::Text => Ok(fmt::layer()
            .with_timer(timer)
            .with_target(cfg.with_targets)
            .with_ansi(cfg.should_use_color())
            .boxed()),
        LoggerFormat::Json => Ok(fmt::layer()
            .json()
            .with_timer(timer)
            .with_target(cfg.with_targets)
            .with_current_span(true)
            .flatten_event(true)
            .boxed()),
        LoggerFormat::Journald => journald_layer(),
    }
}

#[cfg(target_os = "linux")]
fn journald_layer() -> LoggerResult<BoxedLayer> {
    tracing_journald::layer()
        .map(|layer| layer.with_syslog_identifier("lambda-agentd".to_string()).boxed())
        .map_err(|e| LoggerError::JournaldInitFailed(e.to_string()))
}

#[cfg(not(target_os = "linux"))]
fn journald_layer() -> LoggerResult<BoxedLayer> {
    Err(LoggerError::JournaldNotSupported)
}
