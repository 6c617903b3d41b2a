//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store and engine wiring, demo seeding
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent `{ kind, message }` error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use billing_auth::{Authenticator, Hs256JwtValidator};
use billing_infra::StoreError;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, StoreError> {
    let services = Arc::new(services::build_services(config).await?);
    Ok(router(services, config.jwt_secret.as_bytes()))
}

/// Assemble routes and middleware over already-built services.
pub fn router(services: Arc<AppServices>, jwt_secret: &[u8]) -> Router {
    let authenticator: Arc<dyn Authenticator> = Arc::new(Hs256JwtValidator::new(jwt_secret));
    let auth_state = middleware::AuthState { authenticator };

    // Protected routes: require a bearer token.
    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_id_middleware))
                .layer(Extension(services)),
        )
}

pub use services::AppServices;
