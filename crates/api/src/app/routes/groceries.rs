use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};

use pantry_core::EntryId;
use pantry_groceries::{GroceryLine, PerishWindow};
use pantry_infra::ReconcileError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::OwnerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_groceries).post(add_grocery))
        .route("/:id", delete(remove_grocery))
}

pub async fn list_groceries(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
) -> axum::response::Response {
    match services.groceries.list(owner.user_id()).await {
        Ok(entries) => Json(
            entries
                .iter()
                .map(dto::GroceryResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn add_grocery(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    body: Result<Json<dto::CreateGroceryRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    if body.name.trim().is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "Name is required");
    }
    // Non-positive counts fall back to 1; counts past the entry range are an error.
    if body.count.is_some_and(|c| c > i64::from(u32::MAX)) {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("count cannot exceed {}", u32::MAX),
        );
    }
    let perish = match PerishWindow::from_pair(body.min_days, body.max_days) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let line = GroceryLine::new(body.name)
        .with_count(body.count.unwrap_or(1))
        .with_perish(perish);

    match services.reconciler.apply_line(owner.user_id(), &line).await {
        Ok(entry) => (StatusCode::CREATED, Json(dto::GroceryResponse::from(&entry))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn remove_grocery(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
    Query(query): Query<dto::DecrementQuery>,
) -> axum::response::Response {
    let Ok(id) = id.parse::<EntryId>() else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "Invalid grocery id");
    };
    let by = match query.by.as_deref().map(str::trim) {
        None => 1,
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) => n,
            Err(_) => return errors::reconcile_error_to_response(ReconcileError::InvalidAmount),
        },
    };

    match services.reconciler.decrement(owner.user_id(), id, by).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}
