use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::ServerConfig;
use crate::NewsMap;

/// The full application: JSON API under `/api`, static frontend everywhere else
pub fn app(newsmap: Arc<NewsMap>, static_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(newsmap))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run(newsmap: Arc<NewsMap>, config: &ServerConfig) -> Result<()> {
    let app = app(newsmap, &config.static_dir);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://localhost:{}", config.port);
    axum::serve(listener, app)
        .await
        .with_context(|| "Web server stopped unexpectedly")?;
    Ok(())
}
