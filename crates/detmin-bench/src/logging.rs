use std::fs::{self, File};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

pub const TELEMETRY_FILE: &str = "telemetry.jsonl";

/// Keeps the background writer alive; dropping it flushes pending events.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Sends `tracing` events, one JSON object per line, to `telemetry.jsonl` beside the summary.
/// `RUST_LOG` wins over the configured level.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    let dir = outputs.report_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("creating telemetry directory at {}", dir.display()))?;

    let telemetry_path = dir.join(TELEMETRY_FILE);
    let file = File::create(&telemetry_path)
        .with_context(|| format!("creating telemetry file at {}", telemetry_path.display()))?;
    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let level = logging.level().unwrap_or(Level::INFO);
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = fmt()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_thread_names(true)
        .with_env_filter(filter)
        .with_writer(writer)
        .finish();

    // Tests may have installed a global subscriber already.
    let _ = tracing::subscriber::set_global_default(subscriber);

    Ok(Some(LoggingGuard { _guard: guard }))
}
