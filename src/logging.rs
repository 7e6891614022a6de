use anyhow::{Context, Result, anyhow};
use camino::Utf8Path;
use tracing_appender::rolling;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Route warnings and errors to the persistent error log, optionally mirroring
/// everything at the console level to stderr.
///
/// The log file is appended to, never rotated, and must already exist (the
/// bootstrap creates it). Stdout is left untouched for the presentation protocol.
///
/// # Arguments
/// * `log_file` - Path of the error log (e.g. `<data>/Bolt/error.log`)
/// * `debug_mode` - If true, the console shows debug level; otherwise info
/// * `console_output` - If true, also log to stderr
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn setup_logging(
    log_file: &Utf8Path,
    debug_mode: bool,
    console_output: bool,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = log_file
        .parent()
        .with_context(|| format!("Error log has no parent directory: {}", log_file))?;
    let file_name = log_file
        .file_name()
        .with_context(|| format!("Error log has no file name: {}", log_file))?;

    let file_appender = rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(LevelFilter::WARN);

    let console_layer = console_output.then(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if debug_mode {
                EnvFilter::new("debug")
            } else {
                EnvFilter::new("info")
            }
        });

        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
            .with_filter(env_filter)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install global subscriber: {}", e))?;

    tracing::info!(
        "Logging initialized: file={}, debug={}, console={}",
        log_file,
        debug_mode,
        console_output
    );

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_setup_logging_writes_errors_only() {
        let temp_dir = TempDir::new().unwrap();
        let log_file = Utf8PathBuf::try_from(temp_dir.path().join("error.log")).unwrap();
        fs::write(&log_file, "").unwrap();

        // Only one test in this binary installs the global subscriber
        let guard = setup_logging(&log_file, false, false).unwrap();
        tracing::info!("routine startup message");
        tracing::error!("disk on fire");
        drop(guard);

        let contents = fs::read_to_string(&log_file).unwrap();
        assert!(contents.contains("disk on fire"));
        assert!(!contents.contains("routine startup message"));
    }

    #[test]
    fn test_rejects_path_without_file_name() {
        let result = setup_logging(Utf8Path::new("/"), false, false);
        assert!(result.is_err());
    }
}
