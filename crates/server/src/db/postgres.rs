//! `PostgreSQL`-backed [`Storage`] implementation.
//!
//! JSON-shaped columns (`policies`, `contact_info`, `embeddings`) are stored
//! as serialized TEXT; a row that fails to decode surfaces as
//! [`StorageError::DataCorruption`] rather than silently dropping data.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use shopflow_core::{COMPANY_ID, CompanyInfo, Product, SyncKind, SyncMetadata};

use super::{Storage, StorageError};

/// Row key for the single sync-metadata record.
const SYNC_ROW_ID: &str = "sync";
/// Row key for the single editable prompt.
const PROMPT_ROW_ID: &str = "system";

/// Product and company storage on `PostgreSQL`.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn get_product(&self, id: &str) -> Result<Option<Product>, StorageError> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT id, name, description, description_extra, price, stock, \
             image_url, product_url, embeddings \
             FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProductRow::into_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>, StorageError> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            "SELECT id, name, description, description_extra, price, stock, \
             image_url, product_url, embeddings \
             FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProductRow::into_product).collect()
    }

    async fn upsert_product(&self, product: &Product) -> Result<(), StorageError> {
        let embeddings = product
            .embeddings
            .as_ref()
            .map(|vector| serde_json::to_string(vector))
            .transpose()
            .map_err(|err| StorageError::DataCorruption(err.to_string()))?;

        // description_extra is deliberately absent from the UPDATE arm so a
        // re-import keeps whatever the admin has written.
        sqlx::query(
            "INSERT INTO products \
             (id, name, description, description_extra, price, stock, \
              image_url, product_url, embeddings, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW()) \
             ON CONFLICT (id) DO UPDATE SET \
               name = EXCLUDED.name, \
               description = EXCLUDED.description, \
               price = EXCLUDED.price, \
               stock = EXCLUDED.stock, \
               image_url = EXCLUDED.image_url, \
               product_url = EXCLUDED.product_url, \
               embeddings = EXCLUDED.embeddings, \
               updated_at = NOW()",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.description_extra)
        .bind(product.price)
        .bind(i64::from(product.stock))
        .bind(&product.image_url)
        .bind(&product.product_url)
        .bind(embeddings)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_description_extra(
        &self,
        id: &str,
        description_extra: &str,
    ) -> Result<Product, StorageError> {
        let row: Option<ProductRow> = sqlx::query_as(
            "UPDATE products SET description_extra = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, name, description, description_extra, price, stock, \
                       image_url, product_url, embeddings",
        )
        .bind(id)
        .bind(description_extra)
        .fetch_optional(&self.pool)
        .await?;

        row.map_or_else(
            || Err(StorageError::NotFound(format!("product {id}"))),
            ProductRow::into_product,
        )
    }

    async fn get_company_info(&self) -> Result<Option<CompanyInfo>, StorageError> {
        let row: Option<CompanyRow> = sqlx::query_as(
            "SELECT id, name, description, policies, contact_info, updated_at \
             FROM company_info WHERE id = $1",
        )
        .bind(COMPANY_ID)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CompanyRow::into_company).transpose()
    }

    async fn put_company_info(&self, info: &CompanyInfo) -> Result<(), StorageError> {
        let policies = serde_json::to_string(&info.policies)
            .map_err(|err| StorageError::DataCorruption(err.to_string()))?;
        let contact_info = serde_json::to_string(&info.contact_info)
            .map_err(|err| StorageError::DataCorruption(err.to_string()))?;

        sqlx::query(
            "INSERT INTO company_info \
             (id, name, description, policies, contact_info, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) \
             ON CONFLICT (id) DO UPDATE SET \
               name = EXCLUDED.name, \
               description = EXCLUDED.description, \
               policies = EXCLUDED.policies, \
               contact_info = EXCLUDED.contact_info, \
               updated_at = NOW()",
        )
        .bind(&info.id)
        .bind(&info.name)
        .bind(&info.description)
        .bind(policies)
        .bind(contact_info)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn sync_metadata(&self) -> Result<SyncMetadata, StorageError> {
        let row: Option<SyncRow> = sqlx::query_as(
            "SELECT last_shopify_sync, last_woo_commerce_sync, last_qdrant_sync, updated_at \
             FROM sync_metadata WHERE id = $1",
        )
        .bind(SYNC_ROW_ID)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SyncRow::into_metadata).unwrap_or_default())
    }

    async fn record_sync(&self, kind: SyncKind) -> Result<(), StorageError> {
        // Column names cannot be bound, so each source gets its own statement.
        let sql = match kind {
            SyncKind::Shopify => {
                "INSERT INTO sync_metadata (id, last_shopify_sync, updated_at) \
                 VALUES ($1, NOW(), NOW()) \
                 ON CONFLICT (id) DO UPDATE SET last_shopify_sync = NOW(), updated_at = NOW()"
            }
            SyncKind::WooCommerce => {
                "INSERT INTO sync_metadata (id, last_woo_commerce_sync, updated_at) \
                 VALUES ($1, NOW(), NOW()) \
                 ON CONFLICT (id) DO UPDATE SET last_woo_commerce_sync = NOW(), updated_at = NOW()"
            }
            SyncKind::Qdrant => {
                "INSERT INTO sync_metadata (id, last_qdrant_sync, updated_at) \
                 VALUES ($1, NOW(), NOW()) \
                 ON CONFLICT (id) DO UPDATE SET last_qdrant_sync = NOW(), updated_at = NOW()"
            }
        };

        sqlx::query(sql).bind(SYNC_ROW_ID).execute(&self.pool).await?;
        Ok(())
    }

    async fn get_prompt(&self) -> Result<Option<String>, StorageError> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM prompts WHERE id = $1")
                .bind(PROMPT_ROW_ID)
                .fetch_optional(&self.pool)
                .await?;
        Ok(body)
    }

    async fn put_prompt(&self, body: &str) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO prompts (id, body, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (id) DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()",
        )
        .bind(PROMPT_ROW_ID)
        .bind(body)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// =============================================================================
// Row types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: String,
    description_extra: String,
    price: f64,
    stock: i64,
    image_url: String,
    product_url: String,
    embeddings: Option<String>,
}

impl ProductRow {
    fn into_product(self) -> Result<Product, StorageError> {
        let stock = u32::try_from(self.stock).map_err(|_| {
            StorageError::DataCorruption(format!(
                "product {}: stock {} out of range",
                self.id, self.stock
            ))
        })?;
        let embeddings = self
            .embeddings
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|err| {
                StorageError::DataCorruption(format!("product {}: embeddings: {err}", self.id))
            })?;

        Ok(Product {
            id: self.id,
            name: self.name,
            description: self.description,
            description_extra: self.description_extra,
            price: self.price,
            stock,
            image_url: self.image_url,
            product_url: self.product_url,
            embeddings,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CompanyRow {
    id: String,
    name: String,
    description: String,
    policies: String,
    contact_info: String,
    updated_at: DateTime<Utc>,
}

impl CompanyRow {
    fn into_company(self) -> Result<CompanyInfo, StorageError> {
        let policies = serde_json::from_str(&self.policies)
            .map_err(|err| StorageError::DataCorruption(format!("policies: {err}")))?;
        let contact_info = serde_json::from_str(&self.contact_info)
            .map_err(|err| StorageError::DataCorruption(format!("contact_info: {err}")))?;

        Ok(CompanyInfo {
            id: self.id,
            name: self.name,
            description: self.description,
            policies,
            contact_info,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SyncRow {
    last_shopify_sync: Option<DateTime<Utc>>,
    last_woo_commerce_sync: Option<DateTime<Utc>>,
    last_qdrant_sync: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl SyncRow {
    fn into_metadata(self) -> SyncMetadata {
        SyncMetadata {
            last_shopify_sync: self.last_shopify_sync,
            last_woo_commerce_sync: self.last_woo_commerce_sync,
            last_qdrant_sync: self.last_qdrant_sync,
            updated_at: Some(self.updated_at),
        }
    }
}
