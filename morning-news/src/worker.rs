//! Opt-in periodic refresh loop (`--auto-refresh`).

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tokio::select;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::ingestion::{self, NewsAggregator};

/// Refresh the article store every `interval` until `shutdown_notify` fires.
/// The first refresh runs immediately. A failed refresh is logged and the loop
/// keeps going.
pub async fn run_refresh_worker(
    pool: SqlitePool,
    aggregator: Arc<NewsAggregator>,
    interval: Duration,
    shutdown_notify: Arc<Notify>,
) {
    info!(interval_seconds = interval.as_secs(), "worker: refresh loop starting");

    loop {
        match ingestion::refresh_news(&pool, &aggregator).await {
            Ok(outcome) => info!(
                fetched = outcome.fetched,
                saved = outcome.saved,
                "worker: refresh complete"
            ),
            Err(e) => error!("worker: refresh failed: {:#}", e),
        }

        select! {
            _ = tokio::time::sleep(interval) => {},
            _ = shutdown_notify.notified() => {
                info!("worker: shutdown requested, exiting loop");
                break;
            }
        }
    }

    info!("worker: cleanup complete");
}

/// Signal the refresh loop to stop and wait up to `grace` for it to finish its
/// current refresh. Returns false when the loop did not stop in time.
pub async fn stop_refresh_worker(
    handle: JoinHandle<()>,
    shutdown_notify: &Notify,
    grace: Duration,
) -> bool {
    shutdown_notify.notify_one();
    match tokio::time::timeout(grace, handle).await {
        Ok(Ok(())) => {
            info!("worker exited cleanly");
            true
        }
        Ok(Err(join_err)) => {
            error!(%join_err, "worker task panicked");
            true
        }
        Err(_) => {
            warn!("Timed out waiting for worker to exit; continuing shutdown");
            false
        }
    }
}
