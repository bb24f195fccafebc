use std::path::Path;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use crate::pipeline::Pipeline;

/// Run the whole merge once and report what was written.
pub async fn combine(config: Config) -> Result<()> {
    info!(
        feeds = config.feeds.len(),
        mode = ?config.archive.mode,
        max_items = config.settings.max_items,
        "Combining feeds"
    );

    let pipeline = Pipeline::new(config)?;
    let summary = pipeline.run().await?;

    info!(
        entries = summary.entries_read,
        items = summary.items_written,
        cached = summary.cache_added,
        "Run complete"
    );

    println!(
        "✅ {} generated with {} newest items (archive links + full text).",
        summary.output_path.display(),
        summary.items_written
    );

    Ok(())
}

/// Install the global subscriber. `--debug` and `--verbose` win over the
/// configured level, which in turn yields to `RUST_LOG`. The returned guard
/// must be held for the life of the process when logging to a file.
pub fn init_logging(debug: bool, verbose: bool, logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt::writer::BoxMakeWriter;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let (writer, guard) = if logging.log_to_file {
        let path = Path::new(&logging.log_file);
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file_name = path
            .file_name()
            .ok_or_else(|| Error::Config(format!("Invalid log file path: {}", logging.log_file)))?;

        std::fs::create_dir_all(dir)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
        (BoxMakeWriter::new(non_blocking), Some(guard))
    } else {
        (BoxMakeWriter::new(std::io::stderr), None)
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(debug)
        .with_line_number(debug)
        .with_ansi(!logging.log_to_file)
        .with_writer(writer);

    let installed = if logging.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized");
    Ok(guard)
}
