//! Inventory reconciliation: applying grocery lines to an owner's inventory
//! and decrementing entries.
//!
//! Atomicity lives in the store (`GroceryStore::increment_or_create` and
//! `decrement_or_delete`); the reconciler never reads then writes.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use pantry_core::{EntryId, UserId};
use pantry_groceries::{GroceryLine, InventoryEntry};

use crate::store::{Decremented, GroceryStore, StoreError};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("'by' must be a positive integer")]
    InvalidAmount,

    #[error("Grocery not found")]
    NotFound,

    #[error("item name cannot be empty")]
    EmptyName,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct Reconciler {
    groceries: Arc<dyn GroceryStore>,
}

impl Reconciler {
    pub fn new(groceries: Arc<dyn GroceryStore>) -> Self {
        Self { groceries }
    }

    /// Apply one line: increment the matching entry or create it.
    ///
    /// A window on `line` only lands on a newly created entry; an existing
    /// entry keeps whatever window it was created with.
    pub async fn apply_line(
        &self,
        owner: UserId,
        line: &GroceryLine,
    ) -> Result<InventoryEntry, ReconcileError> {
        if line.key().is_empty() {
            return Err(ReconcileError::EmptyName);
        }
        let entry = self
            .groceries
            .increment_or_create(owner, line, Utc::now())
            .await?;
        tracing::debug!(
            owner = %owner,
            entry_id = %entry.id,
            item = %entry.name,
            added = line.count,
            count = entry.count,
            "grocery line applied"
        );
        Ok(entry)
    }

    /// Apply lines in order; returns the touched entry id for each applied line.
    ///
    /// Lines with a blank name are skipped.
    pub async fn apply(
        &self,
        owner: UserId,
        lines: &[GroceryLine],
    ) -> Result<Vec<EntryId>, ReconcileError> {
        let mut touched = Vec::with_capacity(lines.len());
        for line in lines {
            match self.apply_line(owner, line).await {
                Ok(entry) => touched.push(entry.id),
                Err(ReconcileError::EmptyName) => {
                    tracing::debug!(owner = %owner, "skipping grocery line with blank name");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(touched)
    }

    /// Reduce an entry's count by `by`, deleting it once the count would reach zero.
    pub async fn decrement(
        &self,
        owner: UserId,
        id: EntryId,
        by: i64,
    ) -> Result<Decremented, ReconcileError> {
        if by <= 0 {
            return Err(ReconcileError::InvalidAmount);
        }

        let outcome = self
            .groceries
            .decrement_or_delete(owner, id, by)
            .await?
            .ok_or(ReconcileError::NotFound)?;

        match &outcome {
            Decremented::Remaining(entry) => {
                tracing::debug!(owner = %owner, entry_id = %id, by, count = entry.count, "grocery decremented");
            }
            Decremented::Removed(_) => {
                tracing::debug!(owner = %owner, entry_id = %id, by, "grocery removed");
            }
        }
        Ok(outcome)
    }
}
