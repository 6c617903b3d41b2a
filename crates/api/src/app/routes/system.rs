use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::context::CallerContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<CallerContext>) -> impl IntoResponse {
    let caller = ctx.caller();
    Json(serde_json::json!({
        "userId": caller.user_id,
        "username": caller.username,
        "roles": caller.roles.iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "admin": caller.is_admin(),
    }))
}
