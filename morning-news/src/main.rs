/*
morning-news - single-binary main.rs
This binary starts the Rocket HTTP server and, when asked, the news refresh loop in the same process.
*/

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use common::{ensure_schema, init_db_pool, Config};

use morning_news::assistant::{Assistant, AssistantSettings};
use morning_news::ingestion::NewsAggregator;
use morning_news::llm;
use morning_news::server::{launch_rocket, AppState};
use morning_news::worker::{run_refresh_worker, stop_refresh_worker};

/// How long shutdown waits for an in-flight refresh
const WORKER_GRACE: Duration = Duration::from_secs(20);

#[derive(Parser, Debug)]
#[command(name = "morning-news", about = "Morning News AI assistant API server")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error); defaults to app.log_level
    #[arg(long)]
    log_level: Option<String>,

    /// Refresh news periodically in the background
    #[arg(long)]
    auto_refresh: bool,

    /// Run the refresh loop only (do not bind HTTP server)
    #[arg(long)]
    no_server: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // .env is optional
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let default_path = PathBuf::from("config.default.toml");
    let override_path = match args.config {
        Some(p) => {
            if !p.exists() {
                return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
            }
            Some(p)
        }
        None => Some(PathBuf::from("config.toml")).filter(|p| p.exists()),
    };

    let mut config = Config::load_with_defaults(Some(default_path.as_path()), override_path.as_deref()).await?;
    config.apply_env()?;

    // Initialize logging
    let level = args.log_level.as_deref().unwrap_or(&config.app.log_level);
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    info!(
        default = ?default_path,
        override = ?override_path,
        dotenv = dotenv_loaded,
        environment = %config.app.environment,
        "configuration loaded"
    );

    let db_pool = match init_db_pool(&config.database.url, config.database.max_connections).await {
        Ok(p) => p,
        Err(e) => {
            error!(%e, url = %config.database.url, "failed to initialize database pool");
            return Err(e);
        }
    };
    ensure_schema(&db_pool).await?;

    let aggregator = Arc::new(NewsAggregator::new(&config.news)?);
    let provider = llm::provider_from_config(&config.llm);
    let assistant = Arc::new(Assistant::new(
        provider,
        AssistantSettings::from_config(&config.llm, &config.assistant),
    ));

    let shutdown_notify = Arc::new(Notify::new());
    let interval = Duration::from_secs(config.news.refresh_interval_seconds.max(1));

    if args.no_server {
        info!("Starting in refresh-only mode");
        let mut handle = tokio::spawn(run_refresh_worker(
            db_pool.clone(),
            aggregator.clone(),
            interval,
            shutdown_notify.clone(),
        ));

        let interrupted = tokio::select! {
            _ = tokio::signal::ctrl_c() => true,
            res = &mut handle => {
                if let Err(join_err) = res {
                    error!(%join_err, "worker task panicked");
                }
                false
            }
        };
        if interrupted {
            info!("ctrl-c received, notifying worker to shutdown");
            stop_refresh_worker(handle, &shutdown_notify, WORKER_GRACE).await;
        }
        db_pool.close().await;
        info!("refresh-only run finished");
        return Ok(());
    }

    let worker_handle = if args.auto_refresh {
        info!("Spawning background refresh task");
        Some(tokio::spawn(run_refresh_worker(
            db_pool.clone(),
            aggregator.clone(),
            interval,
            shutdown_notify.clone(),
        )))
    } else {
        None
    };

    let state = AppState {
        started_at: Utc::now(),
        config: Arc::new(config),
        db: db_pool.clone(),
        assistant,
        news: aggregator,
    };

    if let Err(e) = launch_rocket(state).await {
        error!(%e, "Rocket server failed");
    }

    info!("HTTP server stopped; notifying worker to shutdown");
    if let Some(handle) = worker_handle {
        stop_refresh_worker(handle, &shutdown_notify, WORKER_GRACE).await;
    }

    db_pool.close().await;
    info!("Shutdown complete");
    Ok(())
}
