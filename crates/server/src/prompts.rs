//! Editable system prompt, cached in front of storage.
//!
//! The prompt changes rarely but is read on every AI request downstream, so
//! reads go through a short TTL cache. Updates write through and invalidate.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cache::TtlCache;
use crate::db::{Storage, StorageError};

/// How long a loaded prompt stays cached.
const PROMPT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Storage-backed prompt store with a read cache.
pub struct PromptService {
    storage: Arc<dyn Storage>,
    cache: TtlCache<Option<String>>,
}

impl PromptService {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            cache: TtlCache::new(PROMPT_CACHE_TTL),
        }
    }

    /// The current prompt, or `None` when none has been stored yet.
    ///
    /// # Errors
    ///
    /// Fails when storage fails and no cached copy exists.
    pub async fn get(&self) -> Result<Option<String>, StorageError> {
        self.cache
            .get_or_load(|| self.storage.get_prompt())
            .await
    }

    /// Replace the stored prompt and drop the cached copy.
    ///
    /// # Errors
    ///
    /// Fails when the storage write fails; the cache is left untouched in
    /// that case so readers keep the previous prompt.
    pub async fn update(&self, body: &str) -> Result<(), StorageError> {
        self.storage.put_prompt(body).await?;
        self.cache.invalidate().await;
        info!(len = body.len(), "system prompt updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStorage;

    #[tokio::test]
    async fn update_is_visible_immediately() {
        let storage = Arc::new(MemoryStorage::new());
        let prompts = PromptService::new(storage);

        assert_eq!(prompts.get().await.expect("get"), None);

        prompts.update("be helpful").await.expect("update");
        assert_eq!(
            prompts.get().await.expect("get"),
            Some("be helpful".to_string())
        );

        // A second update must not be masked by the cache.
        prompts.update("be terse").await.expect("update");
        assert_eq!(
            prompts.get().await.expect("get"),
            Some("be terse".to_string())
        );
    }
}
