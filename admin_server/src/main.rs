//! Admin API server: reads settings from the environment, builds the backend client once and
//! serves the resource routes.
//!
//! Run from repo root: `cargo run -p admin-server`
//! Without a deployment: `ADMIN_BACKEND=memory cargo run -p admin-server`

use admin_data::{
    admin_router, AppState, Backend, BackendSettings, ConvexHttpClient, DataAdapter, MemoryBackend,
    Registry, Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("admin_data=info,admin_server=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let registry = Arc::new(Registry::builtin()?);

    let backend: Arc<dyn Backend> = match &settings.backend {
        BackendSettings::Convex { url, deploy_key } => {
            tracing::info!(url = %url, admin_auth = deploy_key.is_some(), "using convex backend");
            Arc::new(ConvexHttpClient::new(
                url,
                deploy_key.as_deref(),
                settings.request_timeout,
            )?)
        }
        BackendSettings::Memory => {
            tracing::warn!("using in-memory backend; data is not persisted");
            Arc::new(MemoryBackend::from_registry(&registry))
        }
    };

    let mut state = AppState::new(DataAdapter::new(registry, backend));
    state.max_body_bytes = settings.max_body_bytes;

    let app = admin_router(state);
    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("admin API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
