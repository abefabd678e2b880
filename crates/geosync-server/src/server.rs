//! Server assembly: state construction, background loops and the HTTP listener.

use anyhow::Result;
use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::api;
use crate::config::Config;
use crate::loops::run_broadcast_loop;
use crate::persistence;
use crate::state::{AppState, Fanout};

/// Build application state, falling back to memory-only when the database
/// cannot be opened or migrated.
pub async fn build_state(config: Config) -> Arc<AppState> {
    if !config.persistence_enabled {
        tracing::info!("Persistence disabled; positions are kept in memory only");
        return Arc::new(AppState::new(config));
    }

    let db = match persistence::init_database(
        &config.database_path,
        config.database_max_connections,
    )
    .await
    {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(
                "Database initialization failed ({:#}); continuing without persistence",
                err
            );
            return Arc::new(AppState::new(config));
        }
    };

    let state = Arc::new(AppState::with_database(db, config));
    if let Err(err) = state.load_from_database().await {
        tracing::error!("Failed to load persisted locations: {:#}", err);
    }
    state
}

/// Spawn the broadcast loop against the state's store and hub.
pub fn spawn_broadcast(state: &Arc<AppState>, shutdown: &broadcast::Sender<()>) -> JoinHandle<()> {
    let fanout: Arc<dyn Fanout> = Arc::new(state.hub().clone());
    tokio::spawn(run_broadcast_loop(
        Arc::clone(state.store()),
        fanout,
        state.config().broadcast_interval,
        shutdown.subscribe(),
    ))
}

/// Send shutdown once `signal` resolves. If the signal handler could not be
/// installed the server keeps running and the error is logged.
pub fn forward_shutdown_signal<F>(signal: F, shutdown: broadcast::Sender<()>) -> JoinHandle<()>
where
    F: Future<Output = io::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        match signal.await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                let _ = shutdown.send(());
            }
            Err(err) => {
                tracing::error!("Unable to listen for shutdown signal: {}", err);
            }
        }
    })
}

/// Serve the API on `listener` until `shutdown` fires, then wait for the
/// broadcast loop to finish its current cycle.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: broadcast::Sender<()>,
) -> Result<()> {
    let broadcaster = spawn_broadcast(&state, &shutdown);
    let app = api::router(state);

    tracing::info!("Listening on {}", listener.local_addr()?);

    let mut stop = shutdown.subscribe();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = stop.recv().await;
        })
        .await?;

    let _ = shutdown.send(());
    broadcaster.await.ok();
    Ok(())
}
