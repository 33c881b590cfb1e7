use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pantry_auth::UserAccount;
use pantry_groceries::{GroceryLine, InventoryEntry};
use pantry_receipts::Receipt;
use pantry_recipes::Recipe;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroceryRequest {
    pub name: String,
    pub count: Option<i64>,
    pub min_days: Option<i64>,
    pub max_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DecrementQuery {
    /// Kept as text so a malformed value gets the same error as a non-positive one.
    pub by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeTextRequest {
    pub text: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
}

impl From<&UserAccount> for UserResponse {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: account.id.to_string(),
            email: account.email.clone(),
            username: account.username.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisteredResponse {
    pub message: &'static str,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct GroceryResponse {
    pub id: String,
    pub name: String,
    pub count: i64,
    pub min_days: Option<u32>,
    pub max_days: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl From<&InventoryEntry> for GroceryResponse {
    fn from(entry: &InventoryEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            name: entry.name.clone(),
            count: entry.count,
            min_days: entry.perish.map(|w| w.min_days()),
            max_days: entry.perish.map(|w| w.max_days()),
            created_at: entry.created_at,
        }
    }
}

/// An extracted item as reported back to the client.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub name: String,
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_days: Option<u32>,
}

impl From<&GroceryLine> for ItemResponse {
    fn from(line: &GroceryLine) -> Self {
        Self {
            name: line.name.clone(),
            count: line.count,
            min_days: line.perish.map(|w| w.min_days()),
            max_days: line.perish.map(|w| w.max_days()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub items: Vec<ItemResponse>,
    pub total_items: usize,
    pub raw_text: String,
    pub processing_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeTextResponse {
    pub success: bool,
    pub items: Vec<ItemResponse>,
    pub total_items: usize,
    pub grocery_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub id: String,
    pub file_path: String,
    pub raw_text: String,
    pub grocery_items: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Receipt> for ReceiptResponse {
    fn from(receipt: &Receipt) -> Self {
        Self {
            id: receipt.id.to_string(),
            file_path: receipt.file_path.clone(),
            raw_text: receipt.raw_text.clone(),
            grocery_items: receipt.grocery_items.iter().map(ToString::to_string).collect(),
            created_at: receipt.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: String,
    pub title: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub estimated_minutes: u32,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Recipe> for RecipeResponse {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id.to_string(),
            title: recipe.title.clone(),
            ingredients: recipe.ingredients.clone(),
            steps: recipe.steps.clone(),
            estimated_minutes: recipe.estimated_minutes,
            source: recipe.source.clone(),
            created_at: recipe.created_at,
        }
    }
}
