use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use pantry_core::RecipeId;
use pantry_recipes::{NewRecipe, RecipePatch};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::OwnerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_recipes).post(create_recipe))
        .route(
            "/:id",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
}

fn parse_id(raw: &str) -> Result<RecipeId, axum::response::Response> {
    raw.parse::<RecipeId>()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "Invalid recipe id"))
}

fn not_found() -> axum::response::Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "Recipe not found")
}

pub async fn list_recipes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
) -> axum::response::Response {
    match services.recipes.list(owner.user_id()).await {
        Ok(recipes) => Json(
            recipes
                .iter()
                .map(dto::RecipeResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    body: Result<Json<NewRecipe>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    let recipe = match body.into_recipe(owner.user_id(), Utc::now()) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.recipes.insert(recipe).await {
        Ok(saved) => (StatusCode::CREATED, Json(dto::RecipeResponse::from(&saved))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.recipes.get(owner.user_id(), id).await {
        Ok(Some(recipe)) => Json(dto::RecipeResponse::from(&recipe)).into_response(),
        Ok(None) => not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
    body: Result<Json<RecipePatch>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(patch) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };
    if let Err(e) = patch.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.recipes.update(owner.user_id(), id, &patch).await {
        Ok(Some(recipe)) => Json(dto::RecipeResponse::from(&recipe)).into_response(),
        Ok(None) => not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.recipes.delete(owner.user_id(), id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}
