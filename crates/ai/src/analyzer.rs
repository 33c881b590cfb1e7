use std::collections::HashMap;

use async_trait::async_trait;

use pantry_core::UserId;
use pantry_groceries::{GroceryLine, match_key};

use crate::items::parse_items;
use crate::prompt::{build_perishability_prompt, build_receipt_prompt};
use crate::response::ModelResponse;
use crate::result::AiError;

/// Transport seam: send a prompt, get the raw response back.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<ModelResponse, AiError>;
}

/// Turns receipt text into grocery lines and estimates freshness windows.
///
/// Implementations never fail: an unusable model answer is an empty list.
#[async_trait]
pub trait GroceryAnalyzer: Send + Sync {
    async fn parse_receipt(&self, owner: UserId, ocr_text: &str) -> Vec<GroceryLine>;

    async fn estimate_perishability(&self, names: &[String]) -> Vec<GroceryLine>;
}

/// `GroceryAnalyzer` backed by any `TextModel`.
pub struct LlmGroceryAnalyzer<M> {
    model: M,
}

impl<M: TextModel> LlmGroceryAnalyzer<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    async fn ask(&self, prompt: &str, purpose: &'static str) -> Vec<GroceryLine> {
        match self.model.generate(prompt).await {
            Ok(response) => {
                let lines = parse_items(&response.into_text());
                tracing::debug!(purpose, items = lines.len(), "model answered");
                lines
            }
            Err(e) => {
                tracing::warn!(purpose, error = %e, "model call failed; treating as no items");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl<M: TextModel> GroceryAnalyzer for LlmGroceryAnalyzer<M> {
    async fn parse_receipt(&self, owner: UserId, ocr_text: &str) -> Vec<GroceryLine> {
        if ocr_text.trim().is_empty() {
            return Vec::new();
        }
        let prompt = build_receipt_prompt(&owner.to_string(), ocr_text);
        self.ask(&prompt, "receipt").await
    }

    async fn estimate_perishability(&self, names: &[String]) -> Vec<GroceryLine> {
        if names.is_empty() {
            return Vec::new();
        }
        let prompt = build_perishability_prompt(names);
        self.ask(&prompt, "perishability").await
    }
}

/// Fill in freshness windows from `estimates`, matched by case-insensitive name.
///
/// Lines that already carry a window keep it.
pub fn attach_perish_windows(lines: Vec<GroceryLine>, estimates: &[GroceryLine]) -> Vec<GroceryLine> {
    let by_key: HashMap<String, _> = estimates
        .iter()
        .filter_map(|e| e.perish.map(|w| (e.key(), w)))
        .collect();

    lines
        .into_iter()
        .map(|line| {
            if line.perish.is_some() {
                return line;
            }
            let window = by_key.get(&match_key(&line.name)).copied();
            line.with_perish(window)
        })
        .collect()
}
