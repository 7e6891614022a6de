//! Bolt - Quick-search overlay session controller
//!
//! Main entry point for the session process.
//!
//! # Overview
//!
//! This binary hosts the session core for an external presentation process
//! connected over stdin/stdout. It initializes:
//! - The on-disk layout ([`BootstrapManager`]): cache, config and data directories
//! - Logging (warnings and errors appended to `error.log`, console on stderr)
//! - Tokio async runtime (session workers and the stdio host)
//! - Configuration loading ([`ConfigStore`](bolt::ConfigStore))
//! - The session ([`SessionController`]): hotkey, visibility and relay workers
//!
//! # Execution Flow
//!
//! 1. Bootstrap directories and files (failure is reported on stderr, exit 1)
//! 2. Initialize logging into `<data>/Bolt/error.log`
//! 3. Create the tokio runtime
//! 4. Load `config.json`
//! 5. Load the image catalog
//! 6. Register the hotkey and start the workers (hotkey failure is fatal)
//! 7. Serve JSON lines on stdio until stdin closes or Ctrl+C
//! 8. Shut the workers down
//!
//! # Environment
//!
//! - `BOLT_IMAGES_DIR`: directory holding the front end's PNG icons
//!   (defaults to `images/` next to the executable)
//! - `BOLT_DEBUG`: any value enables debug-level console output
//! - `RUST_LOG`: overrides the console filter

use anyhow::{Context, Result};
use bolt::presentation::stdio;
use bolt::services::ImageCatalog;
use bolt::{APP_NAME, BootstrapManager, BootstrapPaths, ChannelPresenter, Config, SessionController, VERSION};
use camino::Utf8PathBuf;
use std::sync::Arc;

fn main() {
    let paths = match BootstrapPaths::from_platform() {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("{} failed to locate its directories: {}", APP_NAME, e);
            std::process::exit(1);
        }
    };

    let report = match BootstrapManager::new(paths.clone()).setup() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} failed to prepare its files: {}", APP_NAME, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(paths, report) {
        tracing::error!("{:#}", e);
        eprintln!("{}: {:#}", APP_NAME, e);
        std::process::exit(1);
    }
}

fn run(paths: BootstrapPaths, report: bolt::BootstrapReport) -> Result<()> {
    let debug_mode = std::env::var_os("BOLT_DEBUG").is_some();
    let _guard = bolt::logging::setup_logging(&paths.error_log_file(), debug_mode, true)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    if report.created.is_empty() {
        tracing::info!("All {} required files present", report.required_files.len());
    } else {
        tracing::info!("Bootstrap created {} path(s)", report.created.len());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("bolt-worker")
        .build()
        .context("Failed to build tokio runtime")?;

    let config = match paths.config_store().load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{} - continuing with defaults", e);
            Config::default_for_home(&paths.home_dir)
        }
    };
    let available = std::thread::available_parallelism().map_or(1, |n| n.get());
    tracing::info!(
        "Config loaded - {} default dir(s), {} extended dir(s), search thread budget {}",
        config.default_dirs.len(),
        config.extended_dirs.len(),
        config.thread_budget(available)
    );

    let images = load_images();

    runtime.block_on(async {
        let (presenter, commands) = ChannelPresenter::new();
        let session = SessionController::new(Arc::new(presenter))
            .with_images(images)
            .start()
            .context("Failed to start session")?;

        stdio::run(session, commands).await
    })?;

    runtime.shutdown_timeout(std::time::Duration::from_secs(2));
    tracing::info!("Application shutdown complete");
    Ok(())
}

fn images_dir() -> Option<Utf8PathBuf> {
    if let Some(dir) = std::env::var_os("BOLT_IMAGES_DIR") {
        return Utf8PathBuf::try_from(std::path::PathBuf::from(dir)).ok();
    }

    let exe = std::env::current_exe().ok()?;
    let exe = Utf8PathBuf::try_from(exe).ok()?;
    Some(exe.parent()?.join("images"))
}

fn load_images() -> ImageCatalog {
    let Some(dir) = images_dir().filter(|dir| dir.is_dir()) else {
        tracing::warn!("No usable images directory - icons will be blank");
        return ImageCatalog::new();
    };

    ImageCatalog::load_dir(&dir).unwrap_or_else(|e| {
        tracing::error!("Failed to load images from {}: {}", dir, e);
        ImageCatalog::new()
    })
}
