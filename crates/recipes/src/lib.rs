//! Saved recipes domain module.

pub mod recipe;

pub use recipe::{DEFAULT_ESTIMATED_MINUTES, DEFAULT_SOURCE, NewRecipe, Recipe, RecipePatch};
