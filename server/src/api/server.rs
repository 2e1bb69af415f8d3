//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::routes::{health, items};
use crate::app::CoreApp;
use crate::data::cache::CacheService;
use crate::data::store::ItemStore;
use crate::domain::counter::CounterService;

pub struct ApiServer {
    app: CoreApp,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        Self { app }
    }

    /// Serve until the shutdown signal fires; returns CoreApp so the caller
    /// can finish graceful shutdown (final sweep, pool close)
    pub async fn start(self) -> Result<CoreApp> {
        let app = self.app;
        let shutdown = app.shutdown.clone();

        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);

        let store: Arc<dyn ItemStore> = app.database.clone();
        let router = router(store, app.counters.clone(), app.cache.clone());

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "API server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        Ok(app)
    }
}

/// Build the full application router
fn router(
    store: Arc<dyn ItemStore>,
    counters: Arc<CounterService>,
    cache: Arc<CacheService>,
) -> Router {
    Router::new()
        .nest("/api/v1/health", health::routes(cache.clone()))
        .nest("/api/v1/items", items::routes(store, counters, cache))
        .fallback(handle_404)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn handle_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "not_found",
            "code": "ROUTE_NOT_FOUND",
            "message": "Route not found"
        })),
    )
}
