use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pantry_auth::AuthError;
use pantry_core::DomainError;
use pantry_infra::{AccountError, ReconcileError, StoreError};
use pantry_receipts::UploadError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    detail: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "detail": detail.into(),
        })),
    )
        .into_response()
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Domain(e) => domain_error_to_response(e),
        StoreError::Duplicate(field) => json_error(
            StatusCode::CONFLICT,
            "conflict",
            format!("duplicate {field:?}"),
        ),
        StoreError::Contention(id) => {
            tracing::warn!(entry_id = %id, "gave up on a contended grocery update");
            json_error(StatusCode::CONFLICT, "conflict", "Please retry the request")
        }
        e @ (StoreError::Corrupt(_) | StoreError::Storage(_)) => {
            tracing::error!(error = %e, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "Storage failure")
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

pub fn reconcile_error_to_response(err: ReconcileError) -> axum::response::Response {
    match err {
        ReconcileError::InvalidAmount => {
            json_error(StatusCode::BAD_REQUEST, "invalid_amount", err.to_string())
        }
        ReconcileError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        ReconcileError::EmptyName => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", "Name is required")
        }
        ReconcileError::Store(e) => store_error_to_response(e),
    }
}

pub fn account_error_to_response(err: AccountError) -> axum::response::Response {
    match err {
        AccountError::Auth(AuthError::InvalidCredentials) => json_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            AuthError::InvalidCredentials.to_string(),
        ),
        AccountError::Auth(e @ (AuthError::EmailTaken | AuthError::UsernameTaken)) => {
            json_error(StatusCode::BAD_REQUEST, "already_registered", e.to_string())
        }
        AccountError::Auth(AuthError::Validation(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        AccountError::Store(e) => store_error_to_response(e),
        e @ (AccountError::Auth(AuthError::Password(_))
        | AccountError::Token(_)
        | AccountError::Worker(_)) => {
            tracing::error!(error = %e, "account operation failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Internal error")
        }
    }
}

pub fn upload_error_to_response(err: UploadError) -> axum::response::Response {
    let status = match err {
        UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        UploadError::MissingFilename | UploadError::InvalidType { .. } => StatusCode::BAD_REQUEST,
    };
    json_error(status, "invalid_upload", err.to_string())
}

pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}
