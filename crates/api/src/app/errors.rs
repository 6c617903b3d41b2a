use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use billing_infra::{OrderError, StoreError};

use crate::render::RenderError;

pub fn order_error_to_response(err: OrderError) -> axum::response::Response {
    let status = match &err {
        OrderError::EmptyOrder | OrderError::InvalidQuantity { .. } | OrderError::InvalidOrder(_) => {
            StatusCode::BAD_REQUEST
        }
        OrderError::ItemNotFound(_) | OrderError::UserNotFound(_) | OrderError::BillNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        OrderError::AccessDenied(_) => StatusCode::FORBIDDEN,
        OrderError::InsufficientStock { .. } | OrderError::ConcurrentModification(_) => {
            StatusCode::CONFLICT
        }
        OrderError::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(kind = err.kind(), "{err}");
    }
    json_error(status, err.kind(), err.to_string())
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "NotFound", "not found"),
        StoreError::ConcurrentModification(msg) => {
            json_error(StatusCode::CONFLICT, "ConcurrentModification", msg)
        }
        StoreError::Invalid(msg) => json_error(StatusCode::BAD_REQUEST, "InvalidRequest", msg),
        StoreError::Backend(msg) => {
            tracing::error!("store failure: {msg}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "StoreFailure", msg)
        }
    }
}

pub fn render_error_to_response(err: RenderError) -> axum::response::Response {
    tracing::error!("render failure: {err}");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "RenderFailure", err.to_string())
}

/// `{ "kind": ..., "message": ... }` with the given status.
pub fn json_error(
    status: StatusCode,
    kind: &str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "kind": kind,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn invalid_id(what: &str) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "InvalidId", format!("invalid {what} id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use billing_core::{BillId, ItemId};

    #[test]
    fn order_errors_map_to_statuses() {
        let cases = [
            (OrderError::EmptyOrder, StatusCode::BAD_REQUEST),
            (OrderError::ItemNotFound(ItemId::new(1)), StatusCode::NOT_FOUND),
            (OrderError::BillNotFound(BillId::new(1)), StatusCode::NOT_FOUND),
            (OrderError::AccessDenied("no".into()), StatusCode::FORBIDDEN),
            (
                OrderError::InsufficientStock {
                    item_id: ItemId::new(1),
                    name: "Pen".into(),
                    available: 0,
                    requested: 1,
                },
                StatusCode::CONFLICT,
            ),
            (OrderError::StoreFailure("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(order_error_to_response(err).status(), status);
        }
    }
}
