use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};
use serde_json::json;

use crate::app::services::AppServices;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth",
            "groceries": "/api/groceries",
            "receipt": "/api/receipt",
            "receipts": "/api/receipts",
            "recipes": "/api/recipes",
            "health": "/health",
        },
    }))
}

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "ocr_available": services.ocr.is_available().await,
    }))
}
