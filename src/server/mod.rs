//! HTTP transport for the chunker.
//!
//! Accepts a multipart upload plus query parameters and returns the chunking
//! result as JSON. Models are shared across requests through the provider held
//! in [`AppState`]; everything else is created per request.

mod error;
mod handlers;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::Settings;
use crate::semantic::ModelProvider;

pub use error::ApiError;
pub use handlers::{ChunkParams, OVERSIZED_HEADER};

/// Path of the chunking endpoint.
pub const CHUNK_ROUTE: &str = "/normalized_semantic_chunker/";

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn ModelProvider>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(provider: Arc<dyn ModelProvider>, settings: Settings) -> Self {
        Self {
            provider,
            settings: Arc::new(settings),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let upload_limit = state.settings.server.max_upload_bytes;

    Router::new()
        .route(CHUNK_ROUTE, post(handlers::chunk_document))
        .route(
            CHUNK_ROUTE.trim_end_matches('/'),
            post(handlers::chunk_document),
        )
        .route("/health", get(handlers::health_check))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until Ctrl+C.
pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    eprintln!("Semantic chunker listening on http://{bind}");
    eprintln!("Chunk endpoint: POST http://{bind}{CHUNK_ROUTE}");
    eprintln!("Health check: http://{bind}/health");
    eprintln!("Press Ctrl+C to stop the server");

    let server = axum::serve(listener, router(state));

    tokio::select! {
        result = server => {
            result?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            eprintln!("Shutting down HTTP server...");
        }
    }

    eprintln!("HTTP server shut down gracefully");
    Ok(())
}
