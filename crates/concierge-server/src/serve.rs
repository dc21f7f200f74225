use crate::config::ConciergeConfig;
use crate::engine;
use crate::http::{self, AppState};
use concierge_core::Strategy;
use tracing::{info, warn};

pub async fn run(config: ConciergeConfig, strategy: Option<Strategy>) -> anyhow::Result<()> {
    info!("Starting Concierge server v{}", env!("CARGO_PKG_VERSION"));

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            warn!("config: {}", e);
        }
        anyhow::bail!("invalid configuration ({} problems)", errors.len());
    }

    let addr = config.listen_addr()?;
    let engine = engine::build(&config, strategy)?;
    let app = http::create_router(AppState::new(engine));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP server on {}: {}", addr, e))?;
    info!("HTTP: listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Concierge server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, terminating...");
}
