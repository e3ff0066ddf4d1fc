/*
[INPUT]:  CLI arguments, YAML configuration file, stdin commands, OS shutdown signals
[OUTPUT]: Live-refreshing dashboard monitor with graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use valar_refresh::{JsonFileStore, MemoryStore, RefreshCoordinator, SettingsStore};

use valar_monitor::console::{ConsoleOptions, run_console};
use valar_monitor::{App, DashboardClient, MonitorConfig};

#[derive(Parser, Debug)]
#[command(name = "valar-monitor", version, about = "Live-refreshing trading dashboard monitor")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    /// Also write daily-rotated logs into this directory
    #[arg(long = "log-dir", value_name = "DIR")]
    log_dir: Option<PathBuf>,
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let _log_guard = init_tracing(&args.log_level, args.log_dir.as_deref())?;

    info!(
        config_path = ?args.config_path,
        dry_run = args.dry_run,
        "starting valar-monitor"
    );

    let config = load_config(args.config_path.as_deref())?;
    info!(
        base_url = %config.api.base_url,
        accounts = config.accounts.len(),
        start_page = %config.start_route(),
        "configuration loaded"
    );

    let client = DashboardClient::new(config.client_config()).context("build API client")?;

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let coordinator = RefreshCoordinator::new(settings_store(&config));
    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    let app = App::start(&config, coordinator, client, shutdown.clone());
    let options = ConsoleOptions {
        render_on_change: config.render_on_change,
    };
    let console_result = run_console(&app, options, shutdown.clone()).await;
    info!("shutdown requested");

    app.shutdown_and_wait().await.context("shutdown pages")?;
    info!("monitor shutdown complete");

    console_result
}

fn init_tracing(log_level: &str, log_dir: Option<&std::path::Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "valar-monitor.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(guard)
}

fn load_config(path: Option<&std::path::Path>) -> Result<MonitorConfig> {
    match path {
        Some(path) => MonitorConfig::from_file(path)
            .with_context(|| format!("load config {}", path.display())),
        None => {
            info!("no config file given; using defaults");
            Ok(MonitorConfig::default())
        }
    }
}

fn settings_store(config: &MonitorConfig) -> Arc<dyn SettingsStore> {
    match config.settings_path() {
        Some(path) => {
            info!(path = %path.display(), "refresh settings file");
            Arc::new(JsonFileStore::new(path))
        }
        None => {
            warn!("no config directory; refresh settings will not persist");
            Arc::new(MemoryStore::new())
        }
    }
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
