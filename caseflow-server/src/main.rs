use anyhow::Context;
use caseflow::observability::init_tracing;
use caseflow_server::cli::Cli;
use caseflow_server::server::{serve, spawn_sweeper};
use caseflow_server::{settings, AppState};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = settings::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;
    init_tracing(&config.logging)?;

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let state = Arc::new(AppState::from_config(&config)?);
    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        %addr,
        mode = state.tracker.mode().name(),
        agents = state.tracker.total_agents(),
        "Caseflow server listening"
    );

    let sweeper = spawn_sweeper(
        state.clone(),
        config.server.sweep_interval(),
        config.server.session_ttl(),
    );
    serve(listener, state, shutdown_signal()).await;
    sweeper.abort();
    info!("Server stopped");
    Ok(())
}
