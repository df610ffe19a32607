//! Persistent storage for products, company info, sync metadata and prompts.
//!
//! ## Tables
//!
//! - `products` - Internal product catalog (one row per backend product)
//! - `company_info` - Single-row store profile
//! - `sync_metadata` - Single-row record of last successful sync per source
//! - `prompts` - Single-row editable system prompt
//!
//! Queries are built at runtime (no compile-time database required) and the
//! surface is a trait so the sync pipeline can be exercised against the
//! in-memory implementation in tests.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use shopflow_core::{CompanyInfo, Product, SyncKind, SyncMetadata};

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Storage operations required by the sync pipeline and HTTP surface.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fetch a single product by id.
    async fn get_product(&self, id: &str) -> Result<Option<Product>, StorageError>;

    /// Fetch the full product catalog.
    async fn list_products(&self) -> Result<Vec<Product>, StorageError>;

    /// Insert or update a product. On update the stored `description_extra`
    /// is preserved: re-imports must not wipe curated text.
    async fn upsert_product(&self, product: &Product) -> Result<(), StorageError>;

    /// Replace the curated extra description of an existing product,
    /// returning the updated record.
    async fn update_description_extra(
        &self,
        id: &str,
        description_extra: &str,
    ) -> Result<Product, StorageError>;

    /// Fetch the store profile, if one has been imported.
    async fn get_company_info(&self) -> Result<Option<CompanyInfo>, StorageError>;

    /// Insert or replace the store profile.
    async fn put_company_info(&self, info: &CompanyInfo) -> Result<(), StorageError>;

    /// Fetch sync timestamps. Returns the default (all `None`) when no sync
    /// has ever been recorded.
    async fn sync_metadata(&self) -> Result<SyncMetadata, StorageError>;

    /// Advance the timestamp for one sync source to now.
    async fn record_sync(&self, kind: SyncKind) -> Result<(), StorageError>;

    /// Fetch the editable system prompt, if one has been stored.
    async fn get_prompt(&self) -> Result<Option<String>, StorageError>;

    /// Store the system prompt.
    async fn put_prompt(&self, body: &str) -> Result<(), StorageError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
