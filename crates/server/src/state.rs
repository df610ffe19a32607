//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::db::Storage;
use crate::prompts::PromptService;
use crate::sync::SyncService;
use crate::vector::ProductIndexer;

/// Application state shared across all handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: Option<PgPool>,
    storage: Arc<dyn Storage>,
    sync: Arc<SyncService>,
    indexer: Arc<ProductIndexer>,
    prompts: Arc<PromptService>,
}

impl AppState {
    #[must_use]
    pub fn new(
        pool: Option<PgPool>,
        storage: Arc<dyn Storage>,
        sync: Arc<SyncService>,
        indexer: Arc<ProductIndexer>,
        prompts: Arc<PromptService>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                pool,
                storage,
                sync,
                indexer,
                prompts,
            }),
        }
    }

    /// Database pool, absent when running against in-memory storage.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.inner.storage
    }

    #[must_use]
    pub fn sync(&self) -> &SyncService {
        &self.inner.sync
    }

    #[must_use]
    pub fn indexer(&self) -> &ProductIndexer {
        &self.inner.indexer
    }

    #[must_use]
    pub fn prompts(&self) -> &PromptService {
        &self.inner.prompts
    }
}
