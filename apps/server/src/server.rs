//! Store selection, expired-passkey sweeping and the serve loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use passkeys_credential::{
    MemoryPasskeyStore, PasskeyManager, PasskeyStore, PostgresConfig, PostgresPasskeyStore,
    SecretCodec,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::api::{self, AppState};
use crate::config::{AppConfig, DatabaseBackend};

/// Build the lifecycle service over the configured store.
///
/// For PostgreSQL this connects and creates the table if needed.
pub async fn build_manager(config: &AppConfig) -> anyhow::Result<PasskeyManager> {
    let codec = SecretCodec::new(config.hashing).context("invalid hashing parameters")?;

    let store: Arc<dyn PasskeyStore> = match config.database.backend {
        DatabaseBackend::Memory => {
            warn!("using the in-memory store; passkeys are lost on restart");
            Arc::new(MemoryPasskeyStore::new(codec))
        }
        DatabaseBackend::Postgres => {
            let db = &config.database;
            let pg = PostgresConfig {
                table_name: db.table_name.clone(),
                schema: db.schema.clone(),
                max_connections: db.max_connections,
                acquire_timeout: Duration::from_secs(db.connect_timeout_secs),
            };
            let store = PostgresPasskeyStore::connect(&db.url, codec, pg)
                .await
                .context("failed to connect to PostgreSQL")?;
            info!(schema = %db.schema, table = %db.table_name, "connected to PostgreSQL");
            Arc::new(store)
        }
    };

    Ok(PasskeyManager::new(store))
}

/// Periodically remove expired passkeys until the task is aborted.
pub fn spawn_purge_task(manager: PasskeyManager, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = manager.purge_expired().await {
                warn!(error = %e, "expired passkey sweep failed");
            }
        }
    })
}

/// Bind `server.listen` and serve until Ctrl-C.
pub async fn serve(config: &AppConfig, manager: PasskeyManager) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.server.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen))?;

    serve_with_shutdown(listener, config, manager, shutdown_signal()).await
}

/// Serve on `listener` until `shutdown` completes, then drain in-flight requests.
pub async fn serve_with_shutdown(
    listener: TcpListener,
    config: &AppConfig,
    manager: PasskeyManager,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let sweeper = config
        .server
        .purge_interval()
        .map(|interval| spawn_purge_task(manager.clone(), interval));

    let app = api::router(AppState::new(manager));
    info!(listen = %listener.local_addr()?, "passkeys server listening");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    info!("passkeys server stopped");

    result.context("server error")
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            // Without a signal handler the server runs until killed
            warn!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    }
}
