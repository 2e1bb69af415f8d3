//! Health check endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::data::cache::CacheService;

/// Shared state for the health endpoint
#[derive(Clone)]
pub struct HealthApiState {
    pub cache: Arc<CacheService>,
}

/// Build health routes
pub fn routes(cache: Arc<CacheService>) -> Router<()> {
    Router::new()
        .route("/", get(health))
        .with_state(HealthApiState { cache })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub cache_backend: &'static str,
    pub cache: &'static str,
}

/// Health check endpoint
///
/// Reports degraded (503) when the cache backend is unreachable; the
/// counter hot path cannot work without it.
pub async fn health(State(state): State<HealthApiState>) -> impl IntoResponse {
    let cache_up = match state.cache.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Cache health check failed");
            false
        }
    };

    let status_code = if cache_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if cache_up { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            cache_backend: state.cache.backend_name(),
            cache: if cache_up { "up" } else { "down" },
        }),
    )
}
