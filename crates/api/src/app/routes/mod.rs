use axum::{
    Router,
    routing::{get, post},
};

use crate::app::services::AppServices;

pub mod auth;
pub mod groceries;
pub mod receipts;
pub mod recipes;
pub mod system;

/// Endpoints reachable without a token.
pub fn public() -> Router {
    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
}

/// Router for all authenticated (owner-scoped) endpoints.
pub fn protected(services: &AppServices) -> Router {
    Router::new()
        .route("/api/auth/me", get(auth::me))
        .nest("/api/groceries", groceries::router())
        .nest("/api/receipt", receipts::router(&services.upload_policy))
        .route("/api/receipts", get(receipts::list_receipts))
        .nest("/api/recipes", recipes::router())
}
