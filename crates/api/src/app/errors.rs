use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockroom_core::FieldErrors;
use stockroom_infra::StoreError;

use crate::app::dto::BodyError;
use crate::app::services::AppServices;

pub const NOT_FOUND: &str = "Not found.";
pub const SERVER_ERROR: &str = "A server error occurred.";

pub fn json_error(
    status: StatusCode,
    key: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    let message: String = message.into();
    (status, axum::Json(json!({ key: message }))).into_response()
}

/// `{"detail": ...}` body.
pub fn detail(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    json_error(status, "detail", message)
}

pub fn not_found() -> axum::response::Response {
    detail(StatusCode::NOT_FOUND, NOT_FOUND)
}

/// 400 for a rejected query parameter: `{"error": ...}`.
pub fn query_error(err: impl std::fmt::Display) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "error", err.to_string())
}

pub fn field_errors(errors: FieldErrors) -> axum::response::Response {
    (StatusCode::BAD_REQUEST, axum::Json(errors)).into_response()
}

pub fn body_error_to_response(err: BodyError) -> axum::response::Response {
    match err {
        BodyError::Malformed(msg) => detail(StatusCode::BAD_REQUEST, msg),
        BodyError::Fields(errors, _) => field_errors(errors),
    }
}

/// 400 for a rejected body that may carry record references. References
/// that did parse are looked up so dangling ids are reported alongside the
/// other field errors.
pub async fn reject_body(services: &AppServices, err: BodyError) -> axum::response::Response {
    let (mut errors, refs) = match err {
        BodyError::Fields(errors, refs) => (errors, refs),
        malformed => return body_error_to_response(malformed),
    };

    let inventory_refs = services
        .inventory()
        .missing_inventory_refs(refs.type_id, refs.language_id)
        .await;
    let order_refs = services
        .orders()
        .missing_order_refs(refs.inventory_id, &refs.tag_ids)
        .await;
    for missing in [inventory_refs, order_refs] {
        match missing {
            Ok(missing) => errors.extend(missing),
            Err(e) => return store_error_to_response(e),
        }
    }
    field_errors(errors)
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => not_found(),
        StoreError::Invalid(errors) => field_errors(errors),
        StoreError::Conflict(msg) => detail(StatusCode::CONFLICT, msg),
        StoreError::Backend(msg) => {
            tracing::error!(error = %msg, "store failure");
            detail(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
        }
    }
}

/// Fallback for unmatched routes.
pub async fn route_not_found() -> axum::response::Response {
    not_found()
}
