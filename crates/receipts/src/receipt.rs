use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pantry_core::{EntryId, ReceiptId, UserId};

/// A processed receipt: where the image lives, what OCR read, which entries it touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub owner: UserId,
    pub file_path: String,
    pub raw_text: String,
    pub grocery_items: Vec<EntryId>,
    pub created_at: DateTime<Utc>,
}

impl Receipt {
    pub fn new(
        owner: UserId,
        file_path: impl Into<String>,
        raw_text: impl Into<String>,
        grocery_items: Vec<EntryId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReceiptId::new(),
            owner,
            file_path: file_path.into(),
            raw_text: raw_text.into(),
            grocery_items,
            created_at,
        }
    }
}
