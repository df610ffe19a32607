//! Sync orchestration between the commerce backend, storage and the vector
//! index.
//!
//! Imports are best-effort per record: one bad product is tallied and logged
//! without aborting the batch. Sync timestamps advance only after a run with
//! at least one success, so "last synced" never claims success for a run
//! that imported nothing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use shopflow_core::{CompanyInfo, ImportReport, Product};

use crate::cache::TtlCache;
use crate::commerce::{CommerceError, CommerceProvider, MappingError, map_external};
use crate::db::{Storage, StorageError};
use crate::vector::indexer::IndexerError;
use crate::vector::ProductIndexer;

/// How long a fetched company profile stays cached.
const COMPANY_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Errors from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A full sync is already running; only one may run at a time.
    #[error("a sync is already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    Commerce(#[from] CommerceError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Indexer(#[from] IndexerError),
}

/// Outcome of a full backend-to-index sync.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Whether the store profile was imported.
    pub company_imported: bool,
    /// Products imported from the commerce backend.
    pub imported: ImportReport,
    /// Products written to the vector index.
    pub indexed: ImportReport,
    /// One entry per leg that failed outright.
    pub errors: Vec<String>,
}

/// Orchestrates imports and indexing. One instance per process.
pub struct SyncService {
    provider: Arc<dyn CommerceProvider>,
    storage: Arc<dyn Storage>,
    indexer: Arc<ProductIndexer>,
    company_cache: TtlCache<Option<CompanyInfo>>,
    sync_running: AtomicBool,
}

/// Resets the running flag even when the sync future is cancelled.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SyncService {
    #[must_use]
    pub fn new(
        provider: Arc<dyn CommerceProvider>,
        storage: Arc<dyn Storage>,
        indexer: Arc<ProductIndexer>,
    ) -> Self {
        Self {
            provider,
            storage,
            indexer,
            company_cache: TtlCache::new(COMPANY_CACHE_TTL),
            sync_running: AtomicBool::new(false),
        }
    }

    /// Whether a full sync is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.sync_running.load(Ordering::SeqCst)
    }

    /// Import the full product catalog from the commerce backend, page by
    /// page, strictly sequentially.
    ///
    /// # Errors
    ///
    /// Fails when a page cannot be fetched; individual bad records are
    /// tallied in the report instead.
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn import_products(&self) -> Result<ImportReport, SyncError> {
        let mut report = ImportReport::default();
        let mut page_token = None;

        loop {
            let page = self.provider.list_products(page_token).await?;

            for raw in &page.items {
                match map_external(raw) {
                    Ok(product) => match self.storage.upsert_product(&product).await {
                        Ok(()) => report.success += 1,
                        Err(err) => {
                            warn!(product_id = %product.id, error = %err, "failed to store product");
                            report.errors += 1;
                        }
                    },
                    Err(err) => {
                        warn!(error = %err, "skipping unmappable product");
                        report.errors += 1;
                    }
                }
            }

            match page.next {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        if report.success > 0
            && let Err(err) = self.storage.record_sync(self.provider.sync_kind()).await
        {
            // Products are already stored; the stale timestamp is a lesser
            // evil than reporting the import as failed.
            warn!(error = %err, "failed to record sync timestamp");
        }

        info!(
            success = report.success,
            errors = report.errors,
            "product import finished"
        );
        Ok(report)
    }

    /// Import a single product by backend id. Returns `None` when the
    /// backend does not know the id.
    ///
    /// # Errors
    ///
    /// Fails when the backend call, mapping or storage write fails.
    #[instrument(skip(self))]
    pub async fn import_one(&self, id: &str) -> Result<Option<Product>, SyncError> {
        let Some(raw) = self.provider.get_product(id).await? else {
            return Ok(None);
        };

        let product = map_external(&raw)?;
        self.storage.upsert_product(&product).await?;
        Ok(Some(product))
    }

    /// Fetch the store profile from the backend and persist it, dropping any
    /// cached copy.
    ///
    /// # Errors
    ///
    /// Fails when the backend call or storage write fails.
    #[instrument(skip(self))]
    pub async fn import_company(&self) -> Result<CompanyInfo, SyncError> {
        let info = self.provider.store_info().await?;
        self.storage.put_company_info(&info).await?;
        self.company_cache.invalidate().await;
        info!(company = %info.name, "company info imported");
        Ok(info)
    }

    /// Cached read of the stored company profile (5 minute TTL, stale
    /// fallback when the database is briefly unavailable).
    ///
    /// # Errors
    ///
    /// Fails when storage fails and no cached copy exists.
    pub async fn company_info(&self) -> Result<Option<CompanyInfo>, SyncError> {
        Ok(self
            .company_cache
            .get_or_load(|| self.storage.get_company_info())
            .await?)
    }

    /// Run a full sync: company info first, then products, then the vector
    /// index. Each leg is independent; a failed leg is recorded in the
    /// report's error list and the remaining legs still run.
    ///
    /// # Errors
    ///
    /// Fails with [`SyncError::AlreadyRunning`] when another full sync holds
    /// the guard; concurrent full syncs would race each other's writes.
    #[instrument(skip(self))]
    pub async fn sync_all(&self) -> Result<SyncReport, SyncError> {
        if self
            .sync_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SyncError::AlreadyRunning);
        }
        let _guard = RunningGuard(&self.sync_running);

        let mut errors = Vec::new();

        let company_imported = match self.import_company().await {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "company info import failed");
                errors.push(format!("company info: {err}"));
                false
            }
        };

        let imported = match self.import_products().await {
            Ok(report) => report,
            Err(err) => {
                warn!(error = %err, "product import failed");
                errors.push(format!("products: {err}"));
                ImportReport::default()
            }
        };

        let indexed = match self.indexer.sync_all().await {
            Ok(report) => report,
            Err(err) => {
                warn!(error = %err, "index sync failed");
                errors.push(format!("index: {err}"));
                ImportReport::default()
            }
        };

        Ok(SyncReport {
            company_imported,
            imported,
            indexed,
            errors,
        })
    }
}
