use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pantry_core::{DomainError, DomainResult, RecipeId, UserId};

pub const TITLE_MAX_CHARS: usize = 120;
pub const DEFAULT_ESTIMATED_MINUTES: u32 = 20;
pub const DEFAULT_SOURCE: &str = "manual";

/// A recipe saved by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub owner: UserId,
    pub title: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub estimated_minutes: u32,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    pub estimated_minutes: Option<i64>,
    pub source: Option<String>,
}

impl NewRecipe {
    pub fn into_recipe(self, owner: UserId, created_at: DateTime<Utc>) -> DomainResult<Recipe> {
        validate_title(&self.title)?;
        let estimated_minutes = match self.estimated_minutes {
            Some(m) => validate_minutes(m)?,
            None => DEFAULT_ESTIMATED_MINUTES,
        };
        let source = self
            .source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string());

        Ok(Recipe {
            id: RecipeId::new(),
            owner,
            title: self.title,
            ingredients: self.ingredients,
            steps: self.steps,
            estimated_minutes,
            source,
            created_at,
        })
    }
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub steps: Option<Vec<String>>,
    pub estimated_minutes: Option<i64>,
    pub source: Option<String>,
}

impl RecipePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.ingredients.is_none()
            && self.steps.is_none()
            && self.estimated_minutes.is_none()
            && self.source.is_none()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.is_empty() {
            return Err(DomainError::validation("No fields to update"));
        }
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(m) = self.estimated_minutes {
            validate_minutes(m)?;
        }
        Ok(())
    }

    /// Apply a validated patch.
    pub fn apply_to(&self, recipe: &mut Recipe) -> DomainResult<()> {
        self.validate()?;
        if let Some(title) = &self.title {
            recipe.title = title.clone();
        }
        if let Some(ingredients) = &self.ingredients {
            recipe.ingredients = ingredients.clone();
        }
        if let Some(steps) = &self.steps {
            recipe.steps = steps.clone();
        }
        if let Some(m) = self.estimated_minutes {
            recipe.estimated_minutes = validate_minutes(m)?;
        }
        if let Some(source) = &self.source {
            recipe.source = source.clone();
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> DomainResult<()> {
    if title.trim().is_empty() {
        return Err(DomainError::validation("title cannot be empty"));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "title cannot exceed {TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_minutes(minutes: i64) -> DomainResult<u32> {
    u32::try_from(minutes)
        .ok()
        .filter(|m| *m >= 1)
        .ok_or_else(|| DomainError::validation("estimated_minutes must be at least 1"))
}
