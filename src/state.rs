use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::ai::{GeminiClient, SafetyAnalyzer};
use crate::config::AppConfig;
use crate::ocr::{OcrEngine, TesseractCli};
use crate::storage::{S3Storage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub ocr: Arc<dyn OcrEngine>,
    pub analyzer: Arc<dyn SafetyAnalyzer>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let storage = Arc::new(S3Storage::connect(&config.storage).await?) as Arc<dyn StorageClient>;
        let ocr = Arc::new(TesseractCli::new(&config.ocr)) as Arc<dyn OcrEngine>;
        let analyzer = Arc::new(GeminiClient::new(&config.ai)?) as Arc<dyn SafetyAnalyzer>;
        if config.ai.api_key.is_none() {
            tracing::warn!("GOOGLE_AI_API_KEY not set; uploads will fail at the analysis step");
        }

        Ok(Self::from_parts(db, config, storage, ocr, analyzer))
    }

    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
        ocr: Arc<dyn OcrEngine>,
        analyzer: Arc<dyn SafetyAnalyzer>,
    ) -> Self {
        Self {
            db,
            config,
            storage,
            ocr,
            analyzer,
        }
    }
}


#[cfg(test)]
impl AppState {
    /// Lazily connecting pool, so nothing touches a database unless a query runs.
    pub fn fake() -> Self {
        Self::fake_with_ocr_text("Water, Sugar, Citric Acid, Sodium Benzoate")
    }

    pub fn fake_with_ocr_text(text: &str) -> Self {
        let db = PgPoolOptions::new()
            .connect_lazy(testing::FAKE_DB_URL)
            .expect("lazy pool ok");
        testing::with_pool(db, text)
    }
}
