//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, reconciler and external collaborators
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub async fn build_app(config: Arc<AppConfig>) -> anyhow::Result<Router> {
    let services = services::AppServices::from_config(&config).await?;
    Ok(router(Arc::new(services)))
}

/// Router over already-wired services.
pub fn router(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        jwt: services.jwt.clone(),
    };

    // Protected routes: require a valid bearer token.
    let protected = routes::protected(&services).route_layer(
        axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware),
    );

    Router::new()
        .merge(routes::public())
        .merge(protected)
        .layer(Extension(services))
        .layer(TraceLayer::new_for_http())
}

pub use services::AppServices;
