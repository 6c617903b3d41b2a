use std::sync::Arc;

use axum::{
    extract::{Extension, Path, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use billing_core::{BillId, UserId};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_bill).get(list_bills))
        .route("/user/:user_id", get(list_user_bills))
        .route("/:id", get(get_bill).delete(delete_bill))
        .route("/:id/print", get(print_bill))
}

pub async fn create_bill(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    body: Result<Json<dto::CreateBillRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "InvalidRequest", e.body_text()),
    };

    let request = match body.into_order() {
        Ok(r) => r,
        Err(e) => return errors::order_error_to_response(e),
    };

    match services.engine.create_bill(ctx.caller(), request).await {
        Ok(bill) => (StatusCode::CREATED, Json(dto::BillResponse::from(&bill))).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn list_bills(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
) -> axum::response::Response {
    match services.engine.bills_for(ctx.caller()).await {
        Ok(bills) => Json(bills.iter().map(dto::BillResponse::from).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn list_user_bills(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    Path(user_id): Path<String>,
) -> axum::response::Response {
    let user_id: UserId = match user_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("user"),
    };

    match services.engine.bills_of_user(ctx.caller(), user_id).await {
        Ok(bills) => Json(bills.iter().map(dto::BillResponse::from).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn get_bill(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: BillId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("bill"),
    };

    match services.engine.bill_for(ctx.caller(), id).await {
        Ok(bill) => Json(dto::BillResponse::from(&bill)).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn delete_bill(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: BillId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("bill"),
    };

    match services.engine.delete_bill(ctx.caller(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

/// Printable receipt for a bill the caller may see.
pub async fn print_bill(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: BillId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("bill"),
    };

    let receipt = match services.receipt_for(ctx.caller(), id).await {
        Ok(r) => r,
        Err(e) => return errors::order_error_to_response(e),
    };

    let document = match services.renderer.render(&receipt) {
        Ok(d) => d,
        Err(e) => return errors::render_error_to_response(e),
    };

    tracing::info!(bill_id = %id, bytes = document.bytes.len(), "bill document rendered");
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, document.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", document.file_name),
            ),
        ],
        document.bytes,
    )
        .into_response()
}
