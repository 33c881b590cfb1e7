//! Grocery inventory domain module.
//!
//! Pure domain logic (no IO, no HTTP, no storage):
//! - `extract`: turns free-typed "quantity + item" text into parsed lines
//! - `entry`: inventory entries, perish windows and the item matching key

pub mod entry;
pub mod extract;

pub use entry::{GroceryLine, InventoryEntry, PerishWindow, match_key};
pub use extract::{ParsedLine, extract, extract_line, to_text};
