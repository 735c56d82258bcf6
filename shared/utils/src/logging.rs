use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    let log_file = config.file_path.as_deref().map(open_log_file).transpose()?;

    // Import spans close once per run, so span timings stay readable.
    let fmt_layer = fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true);

    let installed = match (config.format.as_str(), log_file) {
        ("json", Some(file)) => registry
            .with(fmt_layer.json().with_writer(file))
            .try_init(),
        ("json", None) => registry
            .with(fmt_layer.json().with_writer(std::io::stderr))
            .try_init(),
        (_, Some(file)) => registry
            .with(fmt_layer.with_ansi(false).with_writer(file))
            .try_init(),
        (_, None) => registry
            .with(fmt_layer.with_writer(std::io::stderr))
            .try_init(),
    };
    installed.context("Failed to install tracing subscriber")?;

    tracing::info!("Logging initialized with level: {}", config.level);
    Ok(())
}

fn open_log_file(path: &str) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path))
}
