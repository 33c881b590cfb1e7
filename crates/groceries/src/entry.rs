use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pantry_core::{DomainError, DomainResult, EntryId, UserId};

use crate::extract::ParsedLine;

/// Estimated freshness range, in days after acquisition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerishWindow {
    min_days: u32,
    max_days: u32,
}

impl PerishWindow {
    /// Both bounds must be non-negative and `max_days >= min_days`.
    pub fn new(min_days: i64, max_days: i64) -> DomainResult<Self> {
        if min_days < 0 || max_days < 0 {
            return Err(DomainError::validation("perish days cannot be negative"));
        }
        if max_days < min_days {
            return Err(DomainError::validation(
                "max_days cannot be less than min_days",
            ));
        }
        let min_days = u32::try_from(min_days)
            .map_err(|_| DomainError::validation("min_days is out of range"))?;
        let max_days = u32::try_from(max_days)
            .map_err(|_| DomainError::validation("max_days is out of range"))?;
        Ok(Self { min_days, max_days })
    }

    /// Build a window from an optional pair; exactly one bound present is an error.
    pub fn from_pair(min_days: Option<i64>, max_days: Option<i64>) -> DomainResult<Option<Self>> {
        match (min_days, max_days) {
            (Some(min), Some(max)) => Self::new(min, max).map(Some),
            (None, None) => Ok(None),
            _ => Err(DomainError::validation(
                "min_days and max_days must be given together",
            )),
        }
    }

    pub fn min_days(&self) -> u32 {
        self.min_days
    }

    pub fn max_days(&self) -> u32 {
        self.max_days
    }
}

/// Identity key for "same item" lookups: trimmed and case-folded.
///
/// Display names keep the casing of the first insertion; only matching uses the key.
pub fn match_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One contribution to an owner's inventory (typed line, receipt item, manual add).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroceryLine {
    pub name: String,
    pub count: u32,
    pub perish: Option<PerishWindow>,
}

impl GroceryLine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            count: 1,
            perish: None,
        }
    }

    /// Non-positive or out-of-range counts are coerced to 1.
    pub fn with_count(mut self, count: i64) -> Self {
        self.count = u32::try_from(count).ok().filter(|c| *c > 0).unwrap_or(1);
        self
    }

    pub fn with_perish(mut self, perish: Option<PerishWindow>) -> Self {
        self.perish = perish;
        self
    }

    pub fn key(&self) -> String {
        match_key(&self.name)
    }
}

impl From<ParsedLine> for GroceryLine {
    fn from(line: ParsedLine) -> Self {
        Self {
            name: line.name,
            count: line.count,
            perish: None,
        }
    }
}

/// A row of an owner's grocery inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub id: EntryId,
    pub owner: UserId,
    /// Display name as first inserted.
    pub name: String,
    /// Always >= 1 while the entry exists.
    pub count: i64,
    pub perish: Option<PerishWindow>,
    pub created_at: DateTime<Utc>,
}

impl InventoryEntry {
    /// A fresh entry for the first occurrence of `line` for `owner`.
    pub fn first_of(owner: UserId, line: &GroceryLine, created_at: DateTime<Utc>) -> Self {
        Self {
            id: EntryId::new(),
            owner,
            name: line.name.clone(),
            count: i64::from(line.count),
            perish: line.perish,
            created_at,
        }
    }

    pub fn key(&self) -> String {
        match_key(&self.name)
    }
}
