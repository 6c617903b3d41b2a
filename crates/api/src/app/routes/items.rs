use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use billing_catalog::DEFAULT_FEATURED_PAGE_SIZE;
use billing_core::ItemId;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items))
        .route("/featured", get(featured_items))
        .route("/:id", get(get_item))
}

/// `?page&size&q&category`; blank filters are ignored.
pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::ItemsQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "InvalidRequest", e.body_text()),
    };

    match services
        .catalog
        .search(&query.search(), query.default_page_request())
        .await
    {
        Ok(page) => Json(dto::PageResponse::from(page)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// In-stock items, newest first.
pub async fn featured_items(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::ItemsQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "InvalidRequest", e.body_text()),
    };

    match services
        .catalog
        .featured(query.page_request(DEFAULT_FEATURED_PAGE_SIZE))
        .await
    {
        Ok(page) => Json(dto::PageResponse::from(page)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("item"),
    };

    match services.catalog.get_item(id).await {
        Ok(item) => Json(dto::ItemResponse::from(item)).into_response(),
        Err(billing_infra::StoreError::NotFound) => errors::json_error(
            StatusCode::NOT_FOUND,
            "ItemNotFound",
            format!("Item with ID {id} not found"),
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}
