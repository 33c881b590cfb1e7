use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Extension, Multipart,
        multipart::MultipartError,
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;

use pantry_ai::attach_perish_windows;
use pantry_core::ReceiptId;
use pantry_groceries::{GroceryLine, extract};
use pantry_receipts::{Receipt, UploadError, UploadPolicy, stored_file_name};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::OwnerContext;

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

pub fn router(policy: &UploadPolicy) -> Router {
    let body_limit = policy
        .max_file_size_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    Router::new()
        .route(
            "/upload",
            post(upload_receipt).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/analyze-text", post(analyze_text))
}

pub async fn upload_receipt(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    mut multipart: Multipart,
) -> axum::response::Response {
    let Some(analyzer) = services.analyzer.clone() else {
        return errors::json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "llm_unavailable",
            "LLM service not configured",
        );
    };
    let started = Instant::now();
    let policy = &services.upload_policy;

    let (filename, bytes) = loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                let filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => break (filename, bytes),
                    Err(e) => return multipart_error_to_response(e, policy),
                }
            }
            Ok(None) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_upload", "No file provided");
            }
            Err(e) => return multipart_error_to_response(e, policy),
        }
    };

    let ext = match policy.check(&filename, bytes.len() as u64) {
        Ok(ext) => ext,
        Err(e) => return errors::upload_error_to_response(e),
    };

    let dir = services
        .upload_dir
        .join("receipts")
        .join(owner.user_id().to_string());
    let receipt_id = ReceiptId::new();
    let path = dir.join(stored_file_name(receipt_id, &ext, Utc::now().timestamp_millis()));
    let saved = async {
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(&path, &bytes).await
    };
    if let Err(e) = saved.await {
        tracing::error!(error = %e, path = %path.display(), "failed to save upload");
        return errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "storage_error",
            "Failed to save uploaded file",
        );
    }

    let raw_text = match services.ocr.extract_text(&path).await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "ocr failed");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "ocr_failed",
                format!("OCR processing failed: {e}"),
            );
        }
    };

    let items = analyzer.parse_receipt(owner.user_id(), &raw_text).await;

    let touched = match services.reconciler.apply(owner.user_id(), &items).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(owner = %owner.user_id(), error = %e, "failed to add receipt items to inventory");
            Vec::new()
        }
    };

    let receipt = Receipt {
        id: receipt_id,
        ..Receipt::new(
            owner.user_id(),
            path.display().to_string(),
            raw_text.clone(),
            touched,
            Utc::now(),
        )
    };
    if let Err(e) = services.receipts.insert(receipt).await {
        tracing::warn!(owner = %owner.user_id(), error = %e, "failed to record receipt");
    }

    tracing::info!(
        owner = %owner.user_id(),
        items = items.len(),
        "receipt processed"
    );

    Json(dto::UploadResponse {
        success: true,
        total_items: items.len(),
        items: items.iter().map(dto::ItemResponse::from).collect(),
        raw_text,
        processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    })
    .into_response()
}

pub async fn analyze_text(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    body: Result<Json<dto::AnalyzeTextRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    let mut lines: Vec<GroceryLine> = extract(&body.text)
        .into_iter()
        .map(GroceryLine::from)
        .collect();

    if let Some(analyzer) = &services.analyzer {
        if !lines.is_empty() {
            let names: Vec<String> = lines.iter().map(|l| l.name.clone()).collect();
            let estimates = analyzer.estimate_perishability(&names).await;
            lines = attach_perish_windows(lines, &estimates);
        }
    }

    let touched = match services.reconciler.apply(owner.user_id(), &lines).await {
        Ok(ids) => ids,
        Err(e) => return errors::reconcile_error_to_response(e),
    };

    Json(dto::AnalyzeTextResponse {
        success: true,
        total_items: lines.len(),
        items: lines.iter().map(dto::ItemResponse::from).collect(),
        grocery_ids: touched.iter().map(ToString::to_string).collect(),
    })
    .into_response()
}

pub async fn list_receipts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
) -> axum::response::Response {
    match services.receipts.list(owner.user_id()).await {
        Ok(receipts) => Json(
            receipts
                .iter()
                .map(dto::ReceiptResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

fn multipart_error_to_response(err: MultipartError, policy: &UploadPolicy) -> axum::response::Response {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return errors::upload_error_to_response(UploadError::TooLarge {
            max_mb: policy.max_file_size_mb(),
        });
    }
    errors::json_error(err.status(), "invalid_upload", err.body_text())
}
