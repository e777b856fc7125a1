use std::sync::Arc;

use axum::{Router, extract::Extension, http::StatusCode, response::IntoResponse, routing::get};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/db", get(health_db))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// 200 when the store answers, 503 otherwise.
pub async fn health_db(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.health().ping().await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            tracing::warn!(backend = services.backend(), error = %e, "store health check failed");
            errors::detail(StatusCode::SERVICE_UNAVAILABLE, "Store unavailable.")
        }
    }
}
