//! `pantry-ai`
//!
//! **Responsibility:** the large-language-model boundary.
//!
//! - Builds prompts for receipt parsing and perishability estimates.
//! - Normalizes whatever shape the model answers with into text (`response`).
//! - Turns that text into grocery lines (`items`).
//!
//! It never touches storage; callers reconcile the returned lines.

pub mod analyzer;
pub mod gemini;
pub mod items;
pub mod prompt;
pub mod response;
pub mod result;

pub use analyzer::{GroceryAnalyzer, LlmGroceryAnalyzer, TextModel, attach_perish_windows};
pub use gemini::{GeminiConfig, GeminiModel};
pub use items::parse_items;
pub use response::ModelResponse;
pub use result::AiError;
