//! `pantry-core`: shared building blocks for the grocery tracker.
//!
//! Identifiers and the domain error model. No infrastructure concerns.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{EntryId, ReceiptId, RecipeId, UserId};
