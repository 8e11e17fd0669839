use crate::config::LoggingConfig;
use std::path::Path;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

/// Install the process-wide subscriber: console output plus a daily rolling
/// file under `config.dir` when that directory is writable.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)));

    let log_dir = config.dir.as_path();

    let file_logging_enabled = if config.json {
        let file_layer = rolling_file_layer(log_dir);
        let enabled = file_layer.is_some();
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .with(file_layer)
            .try_init();
        enabled
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false);

        let file_layer = rolling_file_layer(log_dir);
        let enabled = file_layer.is_some();
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .try_init();
        enabled
    };

    if file_logging_enabled {
        eprintln!("Logging to: {}/spark.log", log_dir.display());
    }
}

/// Filter used when `RUST_LOG` is unset: `level` applies to every target,
/// this crate included
fn default_directives(level: &str) -> String {
    format!("{0},spark={0}", level)
}

/// Minimal logging for short CLI commands
pub fn init_logging_simple() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}

fn rolling_file_layer<S>(log_dir: &Path) -> Option<impl Layer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if std::fs::create_dir_all(log_dir).is_err() {
        eprintln!(
            "Warning: Could not create log directory {}, file logging disabled",
            log_dir.display()
        );
        return None;
    }

    // `tracing_appender::rolling::daily` panics if it can't create the initial
    // log file, so preflight writability first.
    let test_path = log_dir.join(".spark_write_test");
    if let Err(e) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&test_path)
    {
        eprintln!(
            "Warning: Could not write to log directory {} ({}), file logging disabled",
            log_dir.display(),
            e
        );
        return None;
    }
    let _ = std::fs::remove_file(&test_path);

    let file_appender = tracing_appender::rolling::daily(log_dir, "spark.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the guard alive for the lifetime of the process
    Box::leak(Box::new(guard));

    Some(
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true),
    )
}
