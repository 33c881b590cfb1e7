use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use pantry_auth::Registration;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::OwnerContext;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Registration>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    match services.accounts.register(body).await {
        Ok(account) => {
            tracing::info!(user_id = %account.id, username = %account.username, "account registered");
            (
                StatusCode::CREATED,
                Json(dto::RegisteredResponse {
                    message: "User registered",
                    user: dto::UserResponse::from(&account),
                }),
            )
                .into_response()
        }
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    match services.accounts.login(&body.email, &body.password).await {
        Ok(session) => {
            tracing::debug!(user_id = %session.account.id, "login succeeded");
            Json(dto::TokenResponse::bearer(session.access_token)).into_response()
        }
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
) -> axum::response::Response {
    match services.accounts.get(owner.user_id()).await {
        Ok(Some(account)) => Json(dto::UserResponse::from(&account)).into_response(),
        // The token outlived the account (e.g. in-memory store restarted).
        Ok(None) => errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", "User not found"),
        Err(e) => errors::account_error_to_response(e),
    }
}
