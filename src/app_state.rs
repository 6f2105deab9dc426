use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::services::{
    batch::BatchRunner, batch_store::BatchStore, ocr::LabelExtractor,
    pipeline::VerificationPipeline, storage::LocalStorage,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<LocalStorage>,
    pub extractor: Arc<dyn LabelExtractor>,
    pub batches: Arc<BatchRunner>,
    pub store: Arc<BatchStore>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        storage: LocalStorage,
        extractor: Arc<dyn LabelExtractor>,
    ) -> Self {
        let storage = Arc::new(storage);
        let store = Arc::new(BatchStore::new(
            config.batch_store_capacity,
            Duration::from_secs(config.batch_ttl_seconds),
        ));
        let pipeline = Arc::new(VerificationPipeline::new(
            Arc::clone(&extractor),
            Arc::clone(&storage),
        ));
        let batches = Arc::new(BatchRunner::new(
            pipeline,
            Arc::clone(&store),
            config.batch_concurrency,
            config.effective_max_batch_size(),
        ));

        Self {
            config: Arc::new(config),
            storage,
            extractor,
            batches,
            store,
        }
    }
}
