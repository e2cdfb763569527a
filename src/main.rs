mod cli;
mod config;
mod dashboard;
mod errors;
mod event_bus;
mod mcp;
mod session_store;
mod storage_locator;

use anyhow::{Context, Result};
use cli::{Cli, Command};
use clap::Parser;
use config::Config;
use event_bus::EventBus;
use session_store::SessionStore;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");

    let result = runtime.block_on(async_main());
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn async_main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Serve { path, port } => run_serve(config, path, port).await,
        Command::Mcp { path } => run_mcp(config, path).await,
    }
}

async fn run_serve(config: Config, project_path: std::path::PathBuf, port: Option<u16>) -> Result<()> {
    let location = storage_locator::locate(&config.global_root, &project_path)
        .context("failed to resolve project state root")?;

    let events = EventBus::new(config.event_buffer_size);
    let store = Arc::new(SessionStore::new(location.state_root, events.clone()));
    let state = dashboard::AppState::new(store, events);
    let router = dashboard::router(state);

    let port = port.unwrap_or(config.port);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;

    tracing::info!(port, "dashboard bridge listening");
    axum::serve(listener, router)
        .await
        .context("dashboard bridge server error")
}

async fn run_mcp(config: Config, project_path: std::path::PathBuf) -> Result<()> {
    let location = storage_locator::locate(&config.global_root, &project_path)
        .context("failed to resolve project state root")?;

    let events = EventBus::new(config.event_buffer_size);
    let store = SessionStore::new(location.state_root, events);
    let server = mcp::McpServer::new(
        store,
        project_path,
        Duration::from_secs(config.tool_timeout_secs),
        config.enabled_tools,
    );

    tracing::info!("mcp tool-calling server starting on stdio");
    server.run(tokio::io::stdin(), tokio::io::stdout()).await
}
