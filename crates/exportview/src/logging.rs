use std::{env, fs};

use anyhow::anyhow;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_LEVEL_VAR: &str = "EXPORTVIEW_LOG_LEVEL";
const LOG_DIR_VAR: &str = "EXPORTVIEW_LOG_DIR";
const LOG_UNBUFFERED_VAR: &str = "EXPORTVIEW_LOG_UNBUFFERED";

/// Installs the global subscriber. Logging is off unless
/// `EXPORTVIEW_LOG_LEVEL` names a level; output then goes to a daily rolling
/// file in `EXPORTVIEW_LOG_DIR` (default `.`).
///
/// The returned guard must be held until exit so buffered lines are flushed.
pub fn init_logger() -> anyhow::Result<Option<WorkerGuard>> {
    let level = env::var(LOG_LEVEL_VAR).unwrap_or_else(|_| "off".to_string());
    if level.eq_ignore_ascii_case("off") {
        // routes `log` macros nowhere
        let _ = LogTracer::init();
        return Ok(None);
    }

    let log_dir = env::var(LOG_DIR_VAR).unwrap_or_else(|_| ".".to_string());
    fs::create_dir_all(&log_dir)
        .map_err(|e| anyhow!("Failed to create {LOG_DIR_VAR} '{log_dir}': {e}"))?;

    let _ = LogTracer::init();

    let env_filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_name = format!("{}.log", env!("CARGO_BIN_NAME"));
    let appender = tracing_appender::rolling::daily(&log_dir, file_name);

    let (make_writer, guard) = if env_flag(LOG_UNBUFFERED_VAR) {
        (fmt::writer::BoxMakeWriter::new(appender), None)
    } else {
        let (nb, guard) = tracing_appender::non_blocking(appender);
        (fmt::writer::BoxMakeWriter::new(nb), Some(guard))
    };

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_ansi(false)
            .with_writer(make_writer)
            .with_level(true)
            .with_target(true),
    );
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to set global tracing subscriber: {e}"))?;

    tracing::info!(
        "START: {}",
        env::args().skip(1).collect::<Vec<_>>().join(" ")
    );
    Ok(guard)
}

fn env_flag(key: &str) -> bool {
    env::var(key).is_ok_and(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "t" | "1" | "yes" | "y"
    )
}
