use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use stockroom_core::InventoryId;
use stockroom_inventory::{CreateInventory, CreatedAfter, UpdateInventory};

use crate::app::routes::{path_id, query_param};
use crate::app::services::AppServices;
use crate::app::{dto, errors, pagination};

pub fn router() -> Router {
    Router::new()
        .route("/inventory/", get(list_inventory).post(create_inventory))
        .route("/inventory/created-after/", get(list_created_after))
        .route("/inventory/types/", get(list_types).post(create_type))
        .route("/inventory/languages/", get(list_languages).post(create_language))
        .route("/inventory/tags/", get(list_tags).post(create_tag))
        .route("/inventory/:id/", get(get_inventory).put(update_inventory))
}

pub async fn list_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    uri: Uri,
    headers: HeaderMap,
) -> axum::response::Response {
    let window = pagination::window_from_uri(&uri, services.page_size());
    match services.inventory().list_inventory(window).await {
        Ok(page) => Json(pagination::envelope(page, &uri, &headers)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let draft = match dto::inventory_draft(&body) {
        Ok(d) => d,
        Err(e) => return errors::reject_body(&services, e).await,
    };

    let cmd = CreateInventory {
        draft,
        occurred_at: Utc::now(),
    };

    match services.inventory().create_inventory(cmd).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Some(id) = path_id::<InventoryId>(&id) else {
        return errors::not_found();
    };

    match services.inventory().get_inventory(id).await {
        Ok(Some(item)) => Json(item).into_response(),
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Full replacement: every writable field must be present.
pub async fn update_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let Some(id) = path_id::<InventoryId>(&id) else {
        return errors::not_found();
    };

    // 404 wins over a bad body.
    match services.inventory().get_inventory(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    }

    let draft = match dto::inventory_draft(&body) {
        Ok(d) => d,
        Err(e) => return errors::reject_body(&services, e).await,
    };

    let cmd = UpdateInventory {
        id,
        draft,
        occurred_at: Utc::now(),
    };

    match services.inventory().update_inventory(cmd).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_created_after(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let filter = match CreatedAfter::from_query(query_param(&params, "created_after")) {
        Ok(f) => f,
        Err(e) => return errors::query_error(e),
    };

    match services.inventory().list_inventory_created_after(filter).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

// -------------------------
// Lookups
// -------------------------

pub async fn list_types(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.inventory().list_inventory_types().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_type(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let draft = match dto::lookup_draft(&body) {
        Ok(d) => d,
        Err(e) => return errors::body_error_to_response(e),
    };
    match services.inventory().create_inventory_type(draft, Utc::now()).await {
        Ok(row) => (StatusCode::CREATED, Json(row)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_languages(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.inventory().list_inventory_languages().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_language(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let draft = match dto::lookup_draft(&body) {
        Ok(d) => d,
        Err(e) => return errors::body_error_to_response(e),
    };
    match services.inventory().create_inventory_language(draft, Utc::now()).await {
        Ok(row) => (StatusCode::CREATED, Json(row)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_tags(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.inventory().list_inventory_tags().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_tag(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let draft = match dto::inventory_tag_draft(&body) {
        Ok(d) => d,
        Err(e) => return errors::body_error_to_response(e),
    };
    match services.inventory().create_inventory_tag(draft, Utc::now()).await {
        Ok(row) => (StatusCode::CREATED, Json(row)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
