//! Owner-scoped persistence for groceries, accounts, receipts and recipes.
//!
//! Every query is scoped by owner; an id that belongs to another owner
//! behaves exactly like an unknown id.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use pantry_auth::UserAccount;
use pantry_core::{DomainError, EntryId, RecipeId, UserId};
use pantry_groceries::{GroceryLine, InventoryEntry};
use pantry_receipts::Receipt;
use pantry_recipes::{Recipe, RecipePatch};

pub use memory::{InMemoryGroceryStore, InMemoryReceiptStore, InMemoryRecipeStore, InMemoryUserStore};
pub use postgres::{
    PostgresGroceryStore, PostgresReceiptStore, PostgresRecipeStore, PostgresUserStore,
    ensure_schema,
};

pub type StoreResult<T> = Result<T, StoreError>;

/// Account fields that must be unique.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Username,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate {0:?}")]
    Duplicate(UniqueField),

    #[error("entry {0} kept changing underneath the update")]
    Contention(EntryId),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

/// Result of a successful decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decremented {
    /// The entry survives with the reduced count.
    Remaining(InventoryEntry),
    /// The reduction reached zero; the entry is gone.
    Removed(EntryId),
}

#[async_trait]
pub trait GroceryStore: Send + Sync {
    /// Atomically add `line.count` to the owner's entry matching `line.key()`,
    /// or create it with `created_at = now` and the line's perish window.
    ///
    /// An existing entry keeps its name, window and `created_at`.
    async fn increment_or_create(
        &self,
        owner: UserId,
        line: &GroceryLine,
        now: DateTime<Utc>,
    ) -> StoreResult<InventoryEntry>;

    /// Atomically subtract `by` (> 0) or delete the entry once `count <= by`.
    ///
    /// `Ok(None)` when the owner has no such entry.
    async fn decrement_or_delete(
        &self,
        owner: UserId,
        id: EntryId,
        by: i64,
    ) -> StoreResult<Option<Decremented>>;

    async fn get(&self, owner: UserId, id: EntryId) -> StoreResult<Option<InventoryEntry>>;

    /// Oldest first.
    async fn list(&self, owner: UserId) -> StoreResult<Vec<InventoryEntry>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Duplicate` when the email or username is taken.
    async fn insert(&self, account: UserAccount) -> StoreResult<UserAccount>;

    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>>;

    async fn get(&self, id: UserId) -> StoreResult<Option<UserAccount>>;
}

#[async_trait]
pub trait ReceiptStore: Send + Sync {
    async fn insert(&self, receipt: Receipt) -> StoreResult<Receipt>;

    /// Newest first.
    async fn list(&self, owner: UserId) -> StoreResult<Vec<Receipt>>;
}

#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn insert(&self, recipe: Recipe) -> StoreResult<Recipe>;

    /// Newest first.
    async fn list(&self, owner: UserId) -> StoreResult<Vec<Recipe>>;

    async fn get(&self, owner: UserId, id: RecipeId) -> StoreResult<Option<Recipe>>;

    /// Apply a validated patch. `Ok(None)` when the owner has no such recipe.
    async fn update(
        &self,
        owner: UserId,
        id: RecipeId,
        patch: &RecipePatch,
    ) -> StoreResult<Option<Recipe>>;

    /// `true` when something was deleted.
    async fn delete(&self, owner: UserId, id: RecipeId) -> StoreResult<bool>;
}
