//! Service wiring: stores, reconciler, collaborators and settings shared by handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use pantry_ai::{GeminiModel, GroceryAnalyzer, LlmGroceryAnalyzer};
use pantry_auth::Hs256Jwt;
use pantry_infra::{
    AccountService, GroceryStore, InMemoryGroceryStore, InMemoryReceiptStore, InMemoryRecipeStore,
    InMemoryUserStore, OcrEngine, PostgresGroceryStore, PostgresReceiptStore, PostgresRecipeStore,
    PostgresUserStore, PreprocessMethod, ReceiptStore, RecipeStore, Reconciler, TesseractOcr,
    UserStore, ensure_schema,
};
use pantry_receipts::UploadPolicy;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppServices {
    pub accounts: AccountService,
    pub jwt: Arc<Hs256Jwt>,
    pub groceries: Arc<dyn GroceryStore>,
    pub reconciler: Reconciler,
    pub receipts: Arc<dyn ReceiptStore>,
    pub recipes: Arc<dyn RecipeStore>,
    /// `None` when no language model is configured.
    pub analyzer: Option<Arc<dyn GroceryAnalyzer>>,
    pub ocr: Arc<dyn OcrEngine>,
    pub upload_policy: UploadPolicy,
    pub upload_dir: PathBuf,
}

struct Stores {
    users: Arc<dyn UserStore>,
    groceries: Arc<dyn GroceryStore>,
    receipts: Arc<dyn ReceiptStore>,
    recipes: Arc<dyn RecipeStore>,
}

impl Stores {
    fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::new()),
            groceries: Arc::new(InMemoryGroceryStore::new()),
            receipts: Arc::new(InMemoryReceiptStore::new()),
            recipes: Arc::new(InMemoryRecipeStore::new()),
        }
    }

    fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserStore::new(pool.clone())),
            groceries: Arc::new(PostgresGroceryStore::new(pool.clone())),
            receipts: Arc::new(PostgresReceiptStore::new(pool.clone())),
            recipes: Arc::new(PostgresRecipeStore::new(pool)),
        }
    }
}

impl AppServices {
    fn assemble(stores: Stores, jwt: Hs256Jwt) -> Self {
        let jwt = Arc::new(jwt);
        Self {
            accounts: AccountService::new(stores.users, jwt.clone()),
            jwt,
            reconciler: Reconciler::new(stores.groceries.clone()),
            groceries: stores.groceries,
            receipts: stores.receipts,
            recipes: stores.recipes,
            analyzer: None,
            ocr: Arc::new(TesseractOcr::new(PreprocessMethod::default())),
            upload_policy: UploadPolicy::default(),
            upload_dir: PathBuf::from("./uploads"),
        }
    }

    /// In-memory stores, no language model, default upload policy.
    pub fn in_memory(jwt_secret: &str) -> Self {
        Self::assemble(
            Stores::in_memory(),
            Hs256Jwt::new(jwt_secret.as_bytes(), chrono::Duration::minutes(60)),
        )
    }

    /// Wire everything from configuration; connects to Postgres when configured.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let stores = match &config.database_url {
            Some(url) => {
                let pool = PgPool::connect(url)
                    .await
                    .context("failed to connect to Postgres")?;
                ensure_schema(&pool)
                    .await
                    .context("failed to prepare the database schema")?;
                tracing::info!("using Postgres stores");
                Stores::postgres(pool)
            }
            None => {
                tracing::info!("DATABASE_URL not set; using in-memory stores");
                Stores::in_memory()
            }
        };

        let jwt = Hs256Jwt::new(config.jwt_secret.as_bytes(), config.access_token_ttl());
        let mut services = Self::assemble(stores, jwt)
            .with_ocr(Arc::new(TesseractOcr::new(config.ocr_preprocess)))
            .with_upload_policy(config.upload_policy())
            .with_upload_dir(config.upload_dir.clone());

        match config.llm() {
            Some(llm) => {
                tracing::info!(model = %llm.model, "receipt parsing enabled");
                let analyzer = LlmGroceryAnalyzer::new(GeminiModel::new(llm));
                services = services.with_analyzer(Arc::new(analyzer));
            }
            None => tracing::warn!("no language model configured; receipt upload is disabled"),
        }

        Ok(services)
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn GroceryAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = ocr;
        self
    }

    pub fn with_upload_policy(mut self, policy: UploadPolicy) -> Self {
        self.upload_policy = policy;
        self
    }

    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }
}
