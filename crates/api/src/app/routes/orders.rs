use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::Utc;
use tracing::info;

use stockroom_core::{OrderId, OrderTagId};
use stockroom_infra::StoreError;
use stockroom_orders::{CreateOrder, CreateOrderTag, DateWindow, DeactivateOrder};

use crate::app::routes::{path_id, query_param};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub const ORDER_NOT_FOUND: &str = "Order not found.";
pub const TAG_NOT_FOUND: &str = "Tag not found.";

pub fn router() -> Router {
    Router::new()
        .route("/orders/", get(list_orders).post(create_order))
        .route("/orders/by-date/", get(list_by_date))
        .route("/orders/tags/", get(list_tags).post(create_tag))
        .route("/orders/tags/:tag_id/orders/", get(orders_for_tag))
        .route("/orders/:id/tags/", get(tags_for_order))
        .route("/orders/:id/deactivate/", patch(deactivate_order))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.orders().list_orders().await {
        Ok(orders) => Json(orders).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let draft = match dto::order_draft(&body) {
        Ok(d) => d,
        Err(e) => return errors::reject_body(&services, e).await,
    };

    let cmd = CreateOrder {
        draft,
        occurred_at: Utc::now(),
    };

    match services.orders().create_order(cmd).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn deactivate_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Some(id) = path_id::<OrderId>(&id) else {
        return errors::not_found();
    };

    let cmd = DeactivateOrder {
        id,
        occurred_at: Utc::now(),
    };

    match services.orders().deactivate_order(cmd).await {
        Ok(order) => {
            info!(order_id = %order.id, "order deactivated");
            Json(order).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_by_date(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let window = match DateWindow::from_query(
        query_param(&params, "start_date"),
        query_param(&params, "embargo_date"),
    ) {
        Ok(w) => w,
        Err(e) => return errors::query_error(e),
    };

    match services.orders().list_orders_in_window(window).await {
        Ok(orders) => Json(orders).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn tags_for_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let not_found = || errors::detail(StatusCode::NOT_FOUND, ORDER_NOT_FOUND);
    let Some(id) = path_id::<OrderId>(&id) else {
        return not_found();
    };

    match services.orders().tags_for_order(id).await {
        Ok(tags) => Json(tags).into_response(),
        Err(StoreError::NotFound) => not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn orders_for_tag(
    Extension(services): Extension<Arc<AppServices>>,
    Path(tag_id): Path<String>,
) -> axum::response::Response {
    let not_found = || errors::detail(StatusCode::NOT_FOUND, TAG_NOT_FOUND);
    let Some(tag_id) = path_id::<OrderTagId>(&tag_id) else {
        return not_found();
    };

    match services.orders().orders_for_tag(tag_id).await {
        Ok(orders) => Json(orders).into_response(),
        Err(StoreError::NotFound) => not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_tags(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.orders().list_order_tags().await {
        Ok(tags) => Json(tags).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_tag(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let draft = match dto::order_tag_draft(&body) {
        Ok(d) => d,
        Err(e) => return errors::body_error_to_response(e),
    };

    let cmd = CreateOrderTag {
        draft,
        occurred_at: Utc::now(),
    };

    match services.orders().create_order_tag(cmd).await {
        Ok(tag) => (StatusCode::CREATED, Json(tag)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
