//! Infrastructure layer: persistence, inventory reconciliation, accounts and OCR.

pub mod accounts;
pub mod ocr;
pub mod reconciler;
pub mod store;

pub use accounts::{AccountError, AccountService, Session};
pub use ocr::{OcrEngine, OcrError, PreprocessMethod, TesseractOcr};
pub use reconciler::{ReconcileError, Reconciler};
pub use store::{
    Decremented, GroceryStore, InMemoryGroceryStore, InMemoryReceiptStore, InMemoryRecipeStore,
    InMemoryUserStore, PostgresGroceryStore, PostgresReceiptStore, PostgresRecipeStore,
    PostgresUserStore, ReceiptStore, RecipeStore, StoreError, StoreResult, UniqueField, UserStore,
    ensure_schema,
};
