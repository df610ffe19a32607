//! In-memory [`Storage`] implementation for tests.
//!
//! Mirrors the `PostgreSQL` semantics that matter to callers, in particular
//! that an upsert of an existing product keeps its stored
//! `description_extra`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use shopflow_core::{CompanyInfo, Product, SyncKind, SyncMetadata};

use super::{Storage, StorageError};

/// Map-backed storage with no persistence.
#[derive(Default)]
pub struct MemoryStorage {
    products: RwLock<BTreeMap<String, Product>>,
    company: RwLock<Option<CompanyInfo>>,
    sync: RwLock<SyncMetadata>,
    prompt: RwLock<Option<String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_product(&self, id: &str) -> Result<Option<Product>, StorageError> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StorageError> {
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn upsert_product(&self, product: &Product) -> Result<(), StorageError> {
        let mut products = self.products.write().await;
        let mut incoming = product.clone();
        if let Some(existing) = products.get(&product.id) {
            incoming.description_extra = existing.description_extra.clone();
        }
        products.insert(incoming.id.clone(), incoming);
        Ok(())
    }

    async fn update_description_extra(
        &self,
        id: &str,
        description_extra: &str,
    ) -> Result<Product, StorageError> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("product {id}")))?;
        product.description_extra = description_extra.to_string();
        Ok(product.clone())
    }

    async fn get_company_info(&self) -> Result<Option<CompanyInfo>, StorageError> {
        Ok(self.company.read().await.clone())
    }

    async fn put_company_info(&self, info: &CompanyInfo) -> Result<(), StorageError> {
        *self.company.write().await = Some(info.clone());
        Ok(())
    }

    async fn sync_metadata(&self) -> Result<SyncMetadata, StorageError> {
        Ok(self.sync.read().await.clone())
    }

    async fn record_sync(&self, kind: SyncKind) -> Result<(), StorageError> {
        let now = Utc::now();
        let mut sync = self.sync.write().await;
        match kind {
            SyncKind::Shopify => sync.last_shopify_sync = Some(now),
            SyncKind::WooCommerce => sync.last_woo_commerce_sync = Some(now),
            SyncKind::Qdrant => sync.last_qdrant_sync = Some(now),
        }
        sync.updated_at = Some(now);
        Ok(())
    }

    async fn get_prompt(&self) -> Result<Option<String>, StorageError> {
        Ok(self.prompt.read().await.clone())
    }

    async fn put_prompt(&self, body: &str) -> Result<(), StorageError> {
        *self.prompt.write().await = Some(body.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: "Boots".to_string(),
            description: "dry".to_string(),
            description_extra: String::new(),
            price: 10.0,
            stock: 1,
            image_url: String::new(),
            product_url: String::new(),
            embeddings: None,
        }
    }

    #[tokio::test]
    async fn upsert_preserves_description_extra() {
        let storage = MemoryStorage::new();
        storage.upsert_product(&product("1")).await.expect("insert");
        storage
            .update_description_extra("1", "hand-written")
            .await
            .expect("update");

        // Re-import with fresher backend data.
        let mut fresh = product("1");
        fresh.price = 12.0;
        storage.upsert_product(&fresh).await.expect("upsert");

        let stored = storage.get_product("1").await.expect("get").expect("some");
        assert_eq!(stored.price, 12.0);
        assert_eq!(stored.description_extra, "hand-written");
    }

    #[tokio::test]
    async fn update_description_extra_on_missing_product_fails() {
        let storage = MemoryStorage::new();
        let result = storage.update_description_extra("missing", "x").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn record_sync_advances_only_its_own_timestamp() {
        let storage = MemoryStorage::new();
        storage.record_sync(SyncKind::Shopify).await.expect("record");

        let meta = storage.sync_metadata().await.expect("meta");
        assert!(meta.last_shopify_sync.is_some());
        assert!(meta.last_woo_commerce_sync.is_none());
        assert!(meta.last_qdrant_sync.is_none());
        assert!(meta.updated_at.is_some());
    }
}
