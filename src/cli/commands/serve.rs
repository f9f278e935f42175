//! Serve command - HTTP chunking endpoint.

use crate::config::Settings;

/// Run the serve command.
///
/// The default model is loaded before the listener opens.
#[cfg(feature = "http-server")]
pub async fn run(bind: Option<String>, settings: Settings) -> anyhow::Result<()> {
    use crate::semantic::ModelRegistry;
    use crate::server::{self, AppState};
    use std::sync::Arc;

    let bind = bind.unwrap_or_else(|| settings.server.bind.clone());
    let registry = Arc::new(ModelRegistry::new(settings.embedding.clone()));

    eprintln!("Loading embedding model {}...", registry.default_model());
    let preload = registry.clone();
    tokio::task::spawn_blocking(move || preload.preload_default()).await??;

    server::serve(AppState::new(registry, settings), &bind).await
}

#[cfg(not(feature = "http-server"))]
pub async fn run(_bind: Option<String>, _settings: Settings) -> anyhow::Result<()> {
    anyhow::bail!(
        "HTTP server support is not compiled in. Rebuild with: cargo build --features http-server"
    )
}
