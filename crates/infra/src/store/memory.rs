//! In-memory stores for tests and database-less runs.
//!
//! Each store keeps its state behind one `RwLock`; read-modify-write
//! operations hold the write guard for their whole duration, which makes
//! them atomic with respect to each other.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use pantry_auth::UserAccount;
use pantry_core::{EntryId, ReceiptId, RecipeId, UserId};
use pantry_groceries::{GroceryLine, InventoryEntry};
use pantry_receipts::Receipt;
use pantry_recipes::{Recipe, RecipePatch};

use super::{
    Decremented, GroceryStore, ReceiptStore, RecipeStore, StoreError, StoreResult, UniqueField,
    UserStore,
};

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Storage("in-memory store lock poisoned".to_string())
}

#[derive(Debug, Default)]
struct GroceryTables {
    entries: HashMap<EntryId, InventoryEntry>,
    by_key: HashMap<(UserId, String), EntryId>,
}

#[derive(Debug, Default)]
pub struct InMemoryGroceryStore {
    inner: RwLock<GroceryTables>,
}

impl InMemoryGroceryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GroceryStore for InMemoryGroceryStore {
    async fn increment_or_create(
        &self,
        owner: UserId,
        line: &GroceryLine,
        now: DateTime<Utc>,
    ) -> StoreResult<InventoryEntry> {
        let mut tables = self.inner.write().map_err(poisoned)?;
        let key = (owner, line.key());

        if let Some(id) = tables.by_key.get(&key).copied() {
            if let Some(entry) = tables.entries.get_mut(&id) {
                entry.count += i64::from(line.count);
                return Ok(entry.clone());
            }
        }

        let entry = InventoryEntry::first_of(owner, line, now);
        tables.by_key.insert(key, entry.id);
        tables.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn decrement_or_delete(
        &self,
        owner: UserId,
        id: EntryId,
        by: i64,
    ) -> StoreResult<Option<Decremented>> {
        let mut tables = self.inner.write().map_err(poisoned)?;

        let Some(entry) = tables.entries.get_mut(&id).filter(|e| e.owner == owner) else {
            return Ok(None);
        };

        if entry.count > by {
            entry.count -= by;
            return Ok(Some(Decremented::Remaining(entry.clone())));
        }

        let key = (owner, entry.key());
        tables.entries.remove(&id);
        tables.by_key.remove(&key);
        Ok(Some(Decremented::Removed(id)))
    }

    async fn get(&self, owner: UserId, id: EntryId) -> StoreResult<Option<InventoryEntry>> {
        let tables = self.inner.read().map_err(poisoned)?;
        Ok(tables.entries.get(&id).filter(|e| e.owner == owner).cloned())
    }

    async fn list(&self, owner: UserId) -> StoreResult<Vec<InventoryEntry>> {
        let tables = self.inner.read().map_err(poisoned)?;
        let mut entries: Vec<_> = tables
            .entries
            .values()
            .filter(|e| e.owner == owner)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.created_at, e.id));
        Ok(entries)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<UserId, UserAccount>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, account: UserAccount) -> StoreResult<UserAccount> {
        let mut users = self.inner.write().map_err(poisoned)?;
        if users.values().any(|u| u.email == account.email) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }
        if users.values().any(|u| u.username == account.username) {
            return Err(StoreError::Duplicate(UniqueField::Username));
        }
        users.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        let users = self.inner.read().map_err(poisoned)?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn get(&self, id: UserId) -> StoreResult<Option<UserAccount>> {
        let users = self.inner.read().map_err(poisoned)?;
        Ok(users.get(&id).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryReceiptStore {
    inner: RwLock<HashMap<ReceiptId, Receipt>>,
}

impl InMemoryReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReceiptStore for InMemoryReceiptStore {
    async fn insert(&self, receipt: Receipt) -> StoreResult<Receipt> {
        let mut receipts = self.inner.write().map_err(poisoned)?;
        receipts.insert(receipt.id, receipt.clone());
        Ok(receipt)
    }

    async fn list(&self, owner: UserId) -> StoreResult<Vec<Receipt>> {
        let receipts = self.inner.read().map_err(poisoned)?;
        let mut mine: Vec<_> = receipts
            .values()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect();
        mine.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(mine)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRecipeStore {
    inner: RwLock<HashMap<RecipeId, Recipe>>,
}

impl InMemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecipeStore for InMemoryRecipeStore {
    async fn insert(&self, recipe: Recipe) -> StoreResult<Recipe> {
        let mut recipes = self.inner.write().map_err(poisoned)?;
        recipes.insert(recipe.id, recipe.clone());
        Ok(recipe)
    }

    async fn list(&self, owner: UserId) -> StoreResult<Vec<Recipe>> {
        let recipes = self.inner.read().map_err(poisoned)?;
        let mut mine: Vec<_> = recipes
            .values()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect();
        mine.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(mine)
    }

    async fn get(&self, owner: UserId, id: RecipeId) -> StoreResult<Option<Recipe>> {
        let recipes = self.inner.read().map_err(poisoned)?;
        Ok(recipes.get(&id).filter(|r| r.owner == owner).cloned())
    }

    async fn update(
        &self,
        owner: UserId,
        id: RecipeId,
        patch: &RecipePatch,
    ) -> StoreResult<Option<Recipe>> {
        let mut recipes = self.inner.write().map_err(poisoned)?;
        let Some(recipe) = recipes.get_mut(&id).filter(|r| r.owner == owner) else {
            return Ok(None);
        };
        patch.apply_to(recipe)?;
        Ok(Some(recipe.clone()))
    }

    async fn delete(&self, owner: UserId, id: RecipeId) -> StoreResult<bool> {
        let mut recipes = self.inner.write().map_err(poisoned)?;
        if recipes.get(&id).is_some_and(|r| r.owner == owner) {
            recipes.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}
