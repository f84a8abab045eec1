mod archive;
mod config;
mod error;
mod handlers;
mod state;
mod tasks;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::state::{AppState, HttpCollaborators};

const DEFAULT_LOG_FILTER: &str = "server=debug,common=debug,generator=debug,tower_http=info";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Arc::new(ServerConfig::from_env()?);
    std::fs::create_dir_all(&config.output_root).with_context(|| {
        format!("no se pudo crear {}", config.output_root.display())
    })?;

    let collaborators = Arc::new(HttpCollaborators::new(config.clone())?);
    let state = AppState::new(config.clone(), collaborators);

    // router HTTP
    let app = handlers::build_router(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "server escuchando en {} (salida en {})",
        listener.local_addr()?,
        config.output_root.display()
    );

    axum::serve(listener, app).await?;
    Ok(())
}
