//! askdb server entry point
//!
//! Wires the pieces together: logging, settings from the environment, the
//! internal record store, the completion client and the HTTP router.

use askdb_core::CompletionClient;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod store;

use crate::config::Settings;
use crate::store::Store;

/// Shared per-request state.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub completion: CompletionClient,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::from_env()?;
    let store = Store::open(&settings.database_url).await?;
    let completion = CompletionClient::new(settings.completion.clone());

    let state = AppState { store, completion };

    // Permissive CORS: the browser frontend is served separately during
    // development.
    let app = Router::new()
        .nest("/api", api::router(state))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&settings.listen_addr).await?;
    info!(addr = %settings.listen_addr, model = %settings.completion.model, "askdb server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
