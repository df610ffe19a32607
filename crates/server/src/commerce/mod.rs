//! Commerce backend clients.
//!
//! One [`CommerceProvider`] implementation per backend (Shopify,
//! WooCommerce) behind a shared capability interface, so the sync pipeline
//! is written once. Provider-specific pagination and auth quirks live inside
//! each implementation.

pub mod convert;
pub mod rate_limit;
pub mod shopify;
pub mod woocommerce;

pub use convert::{MappingError, map_external};
pub use rate_limit::FixedWindowLimiter;
pub use shopify::ShopifyClient;
pub use woocommerce::WooCommerceClient;

use async_trait::async_trait;
use thiserror::Error;

use shopflow_core::{CompanyInfo, SyncKind};

/// Errors from a commerce backend client.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend responded non-2xx. Status and body are surfaced for
    /// diagnostics; requests are not retried here.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
}

/// A product as the backend reports it, before validation.
///
/// Numeric fields are kept as raw strings so the mapper
/// ([`convert::map_external`]) owns all defensive parsing in one place.
#[derive(Debug, Clone, Default)]
pub struct ExternalProduct {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: String,
    /// Raw price string as reported by the backend.
    pub price: Option<String>,
    /// Raw stock quantity as reported by the backend.
    pub stock: Option<String>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
}

/// One page of products plus the token for the next page, if any.
#[derive(Debug, Default)]
pub struct ProductPage {
    pub items: Vec<ExternalProduct>,
    /// Opaque provider-specific continuation token. Shopify: the `rel="next"`
    /// link's query string; WooCommerce: the next page number.
    pub next: Option<String>,
}

/// Capability interface over one commerce backend.
#[async_trait]
pub trait CommerceProvider: Send + Sync {
    /// Lowercase provider name used in logs.
    fn name(&self) -> &'static str;

    /// Which sync-metadata timestamp this provider advances.
    fn sync_kind(&self) -> SyncKind;

    /// Fetch one page of products. `page` is the token returned by the
    /// previous call, or `None` for the first page.
    async fn list_products(&self, page: Option<String>) -> Result<ProductPage, CommerceError>;

    /// Fetch a single product by its backend id, or `None` when the backend
    /// reports it missing.
    async fn get_product(&self, id: &str) -> Result<Option<ExternalProduct>, CommerceError>;

    /// Fetch store-level information as a [`CompanyInfo`] record.
    async fn store_info(&self) -> Result<CompanyInfo, CommerceError>;
}
