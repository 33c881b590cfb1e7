//! PostgreSQL-backed stores.
//!
//! Every statement carries `owner_id` in its WHERE clause or key. Grocery
//! mutations are single statements so concurrent requests for the same item
//! cannot lose updates:
//!
//! - increment-or-create is an `INSERT .. ON CONFLICT (owner_id, name_key) DO UPDATE`;
//! - decrement-or-delete is a compare-and-swap pair of conditional
//!   `UPDATE .. WHERE count > $by` / `DELETE .. WHERE count <= $by`, retried
//!   when a concurrent writer moves the row between the two.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use pantry_auth::UserAccount;
use pantry_core::{EntryId, ReceiptId, RecipeId, UserId};
use pantry_groceries::{GroceryLine, InventoryEntry, PerishWindow};
use pantry_receipts::Receipt;
use pantry_recipes::{Recipe, RecipePatch};

use super::{
    Decremented, GroceryStore, ReceiptStore, RecipeStore, StoreError, StoreResult, UniqueField,
    UserStore,
};

/// Attempts before a decrement gives up with `StoreError::Contention`.
const MAX_DECREMENT_ATTEMPTS: usize = 8;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL,
        email TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        CONSTRAINT users_email_unique UNIQUE (email),
        CONSTRAINT users_username_unique UNIQUE (username)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS groceries (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL,
        name TEXT NOT NULL,
        name_key TEXT NOT NULL,
        count BIGINT NOT NULL CHECK (count > 0),
        min_days INTEGER,
        max_days INTEGER,
        created_at TIMESTAMPTZ NOT NULL,
        CONSTRAINT groceries_owner_name_unique UNIQUE (owner_id, name_key),
        CONSTRAINT groceries_perish_pair CHECK ((min_days IS NULL) = (max_days IS NULL))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS receipts (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL,
        file_path TEXT NOT NULL,
        raw_text TEXT NOT NULL,
        grocery_items UUID[] NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS receipts_owner_created_idx ON receipts (owner_id, created_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS recipes (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL,
        title TEXT NOT NULL,
        ingredients JSONB NOT NULL,
        steps JSONB NOT NULL,
        estimated_minutes INTEGER NOT NULL,
        source TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS recipes_owner_created_idx ON recipes (owner_id, created_at DESC)",
];

/// Create tables and indexes if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> StoreResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("database schema ready");
    Ok(())
}

const ENTRY_COLUMNS: &str = "id, owner_id, name, count, min_days, max_days, created_at";

fn entry_from_row(row: &PgRow) -> StoreResult<InventoryEntry> {
    let min_days: Option<i32> = row.try_get("min_days")?;
    let max_days: Option<i32> = row.try_get("max_days")?;
    let perish = match (min_days, max_days) {
        (Some(min), Some(max)) => Some(
            PerishWindow::new(min.into(), max.into())
                .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        ),
        _ => None,
    };

    Ok(InventoryEntry {
        id: EntryId::from_uuid(row.try_get("id")?),
        owner: UserId::from_uuid(row.try_get("owner_id")?),
        name: row.try_get("name")?,
        count: row.try_get("count")?,
        perish,
        created_at: row.try_get("created_at")?,
    })
}

fn days_column(days: u32) -> StoreResult<i32> {
    i32::try_from(days).map_err(|_| StoreError::Corrupt(format!("{days} days does not fit the column")))
}

pub struct PostgresGroceryStore {
    pool: PgPool,
}

impl PostgresGroceryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroceryStore for PostgresGroceryStore {
    async fn increment_or_create(
        &self,
        owner: UserId,
        line: &GroceryLine,
        now: DateTime<Utc>,
    ) -> StoreResult<InventoryEntry> {
        let (min_days, max_days) = match line.perish {
            Some(w) => (Some(days_column(w.min_days())?), Some(days_column(w.max_days())?)),
            None => (None, None),
        };
        let id = EntryId::new();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO groceries (id, owner_id, name, name_key, count, min_days, max_days, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (owner_id, name_key)
            DO UPDATE SET count = groceries.count + EXCLUDED.count
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(owner.as_uuid())
        .bind(&line.name)
        .bind(line.key())
        .bind(i64::from(line.count))
        .bind(min_days)
        .bind(max_days)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        entry_from_row(&row)
    }

    async fn decrement_or_delete(
        &self,
        owner: UserId,
        id: EntryId,
        by: i64,
    ) -> StoreResult<Option<Decremented>> {
        for attempt in 1..=MAX_DECREMENT_ATTEMPTS {
            let updated = sqlx::query(&format!(
                r#"
                UPDATE groceries SET count = count - $3
                WHERE id = $1 AND owner_id = $2 AND count > $3
                RETURNING {ENTRY_COLUMNS}
                "#
            ))
            .bind(id.as_uuid())
            .bind(owner.as_uuid())
            .bind(by)
            .fetch_optional(&self.pool)
            .await?;
            if let Some(row) = updated {
                return Ok(Some(Decremented::Remaining(entry_from_row(&row)?)));
            }

            let deleted = sqlx::query(
                "DELETE FROM groceries WHERE id = $1 AND owner_id = $2 AND count <= $3 RETURNING id",
            )
            .bind(id.as_uuid())
            .bind(owner.as_uuid())
            .bind(by)
            .fetch_optional(&self.pool)
            .await?;
            if deleted.is_some() {
                return Ok(Some(Decremented::Removed(id)));
            }

            let exists = sqlx::query("SELECT 1 FROM groceries WHERE id = $1 AND owner_id = $2")
                .bind(id.as_uuid())
                .bind(owner.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
            if exists.is_none() {
                return Ok(None);
            }

            tracing::debug!(entry_id = %id, attempt, "grocery count moved during decrement; retrying");
        }

        Err(StoreError::Contention(id))
    }

    async fn get(&self, owner: UserId, id: EntryId) -> StoreResult<Option<InventoryEntry>> {
        let row = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM groceries WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id.as_uuid())
        .bind(owner.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn list(&self, owner: UserId) -> StoreResult<Vec<InventoryEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM groceries WHERE owner_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }
}

fn account_from_row(row: &PgRow) -> StoreResult<UserAccount> {
    Ok(UserAccount {
        id: UserId::from_uuid(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

fn unique_violation(err: &sqlx::Error) -> Option<UniqueField> {
    let db = err.as_database_error()?;
    if !db.is_unique_violation() {
        return None;
    }
    match db.constraint() {
        Some("users_email_unique") => Some(UniqueField::Email),
        Some("users_username_unique") => Some(UniqueField::Username),
        _ => None,
    }
}

pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn insert(&self, account: UserAccount) -> StoreResult<UserAccount> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(account),
            Err(e) => match unique_violation(&e) {
                Some(field) => Err(StoreError::Duplicate(field)),
                None => Err(e.into()),
            },
        }
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn get(&self, id: UserId) -> StoreResult<Option<UserAccount>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }
}

fn receipt_from_row(row: &PgRow) -> StoreResult<Receipt> {
    let items: Vec<Uuid> = row.try_get("grocery_items")?;
    Ok(Receipt {
        id: ReceiptId::from_uuid(row.try_get("id")?),
        owner: UserId::from_uuid(row.try_get("owner_id")?),
        file_path: row.try_get("file_path")?,
        raw_text: row.try_get("raw_text")?,
        grocery_items: items.into_iter().map(EntryId::from_uuid).collect(),
        created_at: row.try_get("created_at")?,
    })
}

pub struct PostgresReceiptStore {
    pool: PgPool,
}

impl PostgresReceiptStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReceiptStore for PostgresReceiptStore {
    async fn insert(&self, receipt: Receipt) -> StoreResult<Receipt> {
        let items: Vec<Uuid> = receipt.grocery_items.iter().map(|id| *id.as_uuid()).collect();
        sqlx::query(
            r#"
            INSERT INTO receipts (id, owner_id, file_path, raw_text, grocery_items, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(receipt.id.as_uuid())
        .bind(receipt.owner.as_uuid())
        .bind(&receipt.file_path)
        .bind(&receipt.raw_text)
        .bind(&items)
        .bind(receipt.created_at)
        .execute(&self.pool)
        .await?;

        Ok(receipt)
    }

    async fn list(&self, owner: UserId) -> StoreResult<Vec<Receipt>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, file_path, raw_text, grocery_items, created_at
            FROM receipts
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(receipt_from_row).collect()
    }
}

const RECIPE_COLUMNS: &str =
    "id, owner_id, title, ingredients, steps, estimated_minutes, source, created_at";

fn recipe_from_row(row: &PgRow) -> StoreResult<Recipe> {
    let minutes: i32 = row.try_get("estimated_minutes")?;
    let ingredients: Json<Vec<String>> = row.try_get("ingredients")?;
    let steps: Json<Vec<String>> = row.try_get("steps")?;
    Ok(Recipe {
        id: RecipeId::from_uuid(row.try_get("id")?),
        owner: UserId::from_uuid(row.try_get("owner_id")?),
        title: row.try_get("title")?,
        ingredients: ingredients.0,
        steps: steps.0,
        estimated_minutes: u32::try_from(minutes)
            .map_err(|_| StoreError::Corrupt(format!("estimated_minutes {minutes}")))?,
        source: row.try_get("source")?,
        created_at: row.try_get("created_at")?,
    })
}

fn minutes_column(minutes: u32) -> StoreResult<i32> {
    i32::try_from(minutes)
        .map_err(|_| StoreError::Corrupt(format!("estimated_minutes {minutes} does not fit the column")))
}

pub struct PostgresRecipeStore {
    pool: PgPool,
}

impl PostgresRecipeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipeStore for PostgresRecipeStore {
    async fn insert(&self, recipe: Recipe) -> StoreResult<Recipe> {
        sqlx::query(
            r#"
            INSERT INTO recipes (id, owner_id, title, ingredients, steps, estimated_minutes, source, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(recipe.id.as_uuid())
        .bind(recipe.owner.as_uuid())
        .bind(&recipe.title)
        .bind(Json(&recipe.ingredients))
        .bind(Json(&recipe.steps))
        .bind(minutes_column(recipe.estimated_minutes)?)
        .bind(&recipe.source)
        .bind(recipe.created_at)
        .execute(&self.pool)
        .await?;

        Ok(recipe)
    }

    async fn list(&self, owner: UserId) -> StoreResult<Vec<Recipe>> {
        let rows = sqlx::query(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE owner_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(recipe_from_row).collect()
    }

    async fn get(&self, owner: UserId, id: RecipeId) -> StoreResult<Option<Recipe>> {
        let row = sqlx::query(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id.as_uuid())
        .bind(owner.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(recipe_from_row).transpose()
    }

    async fn update(
        &self,
        owner: UserId,
        id: RecipeId,
        patch: &RecipePatch,
    ) -> StoreResult<Option<Recipe>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1 AND owner_id = $2 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .bind(owner.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut recipe = recipe_from_row(&row)?;
        patch.apply_to(&mut recipe)?;

        sqlx::query(
            r#"
            UPDATE recipes
            SET title = $3, ingredients = $4, steps = $5, estimated_minutes = $6, source = $7
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(owner.as_uuid())
        .bind(&recipe.title)
        .bind(Json(&recipe.ingredients))
        .bind(Json(&recipe.steps))
        .bind(minutes_column(recipe.estimated_minutes)?)
        .bind(&recipe.source)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(recipe))
    }

    async fn delete(&self, owner: UserId, id: RecipeId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND owner_id = $2")
            .bind(id.as_uuid())
            .bind(owner.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
