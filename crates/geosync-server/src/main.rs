//! geosync server - live position sync over WebSocket

use anyhow::Result;
use std::net::SocketAddr;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geosync_server::config::Config;
use geosync_server::server;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("geosync_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting geosync server...");

    let config = Config::from_env();
    let port = config.server_port;
    let state = server::build_state(config).await;

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    server::forward_shutdown_signal(tokio::signal::ctrl_c(), shutdown_tx.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::serve(listener, state, shutdown_tx).await
}
