use axum::{routing::get, Router};

pub mod bills;
pub mod items;
pub mod system;

/// Router for endpoints that require an authenticated caller.
pub fn protected_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/bills", bills::router())
}

/// Router for endpoints open to anonymous callers.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/items", items::router())
}
