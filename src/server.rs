use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{AppState, create_router};
use crate::kvs::KeyValueStore;

/// Periodically drop expired session keys from `kvs`.
///
/// Expired keys already read as absent; the sweep only reclaims storage.
pub fn spawn_purge_task(kvs: Arc<dyn KeyValueStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match kvs.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "expired session keys purged"),
                Err(e) => warn!(error = %e, "session key purge failed"),
            }
        }
    })
}

/// Serve the RPC router on `bind` until Ctrl-C.
///
/// When `purge` is given, expired keys are swept on that interval for the
/// lifetime of the server.
pub async fn start_http(
    state: AppState,
    bind: &str,
    purge: Option<(Arc<dyn KeyValueStore>, Duration)>,
) -> Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;

    let purge_task = purge.map(|(kvs, interval)| {
        info!(interval_secs = interval.as_secs(), "session key purge enabled");
        spawn_purge_task(kvs, interval)
    });

    info!("splitpay-auth listening on http://{}", bind);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(task) = purge_task {
        task.abort();
    }
    info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
