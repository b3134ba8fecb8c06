use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{anyhow, Context};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where and how verbosely the process logs.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Filter used when `RUST_LOG` is not set, e.g. `info` or `ccl=debug`.
    pub base_level: String,
    /// Directory for daily-rolling log files. Console only when `None`.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            base_level: "info".to_string(),
            directory: None,
            file_prefix: "ccl".to_string(),
        }
    }
}

/// Installs the global tracing subscriber. Call once, from a binary.
pub fn setup_logging(options: &LogOptions) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&options.base_level))
        .with_context(|| format!("Invalid log filter: {}", options.base_level))?;

    // Warnings and errors go to stderr so stdout stays usable for results.
    let console_writer = std::io::stdout
        .with_min_level(Level::INFO)
        .and(std::io::stderr.with_max_level(Level::WARN));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(true)
        .with_writer(console_writer);

    let file_layer = match &options.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory).with_context(|| {
                format!("Failed to create logs directory: {}", directory.display())
            })?;

            let file_appender = tracing_appender::rolling::Builder::new()
                .rotation(tracing_appender::rolling::Rotation::DAILY)
                .filename_prefix(&options.file_prefix)
                .filename_suffix("log")
                .max_log_files(5)
                .build(directory)
                .context("Failed to create log file appender")?;

            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            LOG_GUARD
                .set(guard)
                .map_err(|_| anyhow!("Logging already initialized"))?;

            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_ansi(false)
                    .with_writer(file_writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Logger initialization failed")?;

    Ok(())
}
