use anyhow::Context;

use crate::app::{self, AppState};
use crate::config::AppConfig;

pub async fn handle(mut config: AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!(
        "Starting family site in {:?} mode against {}",
        config.environment,
        config.backend.base_url
    );

    let bind_addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let state = AppState::new(config).context("failed to build the backend client")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Family site listening on http://{}", bind_addr);

    axum::serve(listener, app::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Family site stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
