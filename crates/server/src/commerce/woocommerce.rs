//! WooCommerce REST API client.
//!
//! Uses the v3 endpoints under `/wp-json/wc/v3` with consumer key/secret
//! query authentication over HTTPS. Pagination is page-numbered: the client
//! requests successive `page=N` batches until a batch comes back shorter
//! than the page size. Every request first awaits the 100 req/15min
//! fixed-window limiter.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, instrument};

use shopflow_core::{CompanyInfo, SyncKind};

use super::rate_limit::FixedWindowLimiter;
use super::{CommerceError, CommerceProvider, ExternalProduct, ProductPage};
use crate::config::WooCommerceConfig;

/// Products fetched per page.
const PAGE_SIZE: u32 = 50;

/// Client for the WooCommerce REST API.
#[derive(Clone)]
pub struct WooCommerceClient {
    inner: Arc<WooCommerceClientInner>,
}

struct WooCommerceClientInner {
    client: reqwest::Client,
    /// `https://{store}/wp-json/wc/v3`
    base_url: String,
    store_name: String,
    consumer_key: secrecy::SecretString,
    consumer_secret: secrecy::SecretString,
    limiter: FixedWindowLimiter,
}

impl WooCommerceClient {
    /// Create a new client from validated configuration.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be constructed.
    #[must_use]
    pub fn new(config: &WooCommerceConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            inner: Arc::new(WooCommerceClientInner {
                client,
                base_url: format!("{}/wp-json/wc/v3", config.store_url.trim_end_matches('/')),
                store_name: config.store_name.clone(),
                consumer_key: config.consumer_key.clone(),
                consumer_secret: config.consumer_secret.clone(),
                limiter: FixedWindowLimiter::woocommerce(),
            }),
        }
    }

    /// Rate-limited GET with credentials appended as query parameters.
    /// Returns the raw response for the caller to inspect.
    async fn send_get(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, CommerceError> {
        self.inner.limiter.check_rate_limit().await;
        let url = format!("{}{}", self.inner.base_url, endpoint);
        let response = self
            .inner
            .client
            .get(&url)
            .query(query)
            .query(&[
                (
                    "consumer_key",
                    self.inner.consumer_key.expose_secret().to_string(),
                ),
                (
                    "consumer_secret",
                    self.inner.consumer_secret.expose_secret().to_string(),
                ),
            ])
            .send()
            .await?;
        debug!(endpoint, status = %response.status(), "WooCommerce API request");
        Ok(response)
    }

    /// Rate-limited GET that fails with [`CommerceError::Api`] on non-2xx.
    async fn get(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, CommerceError> {
        let response = self.send_get(endpoint, query).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CommerceError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl CommerceProvider for WooCommerceClient {
    fn name(&self) -> &'static str {
        "woocommerce"
    }

    fn sync_kind(&self) -> SyncKind {
        SyncKind::WooCommerce
    }

    #[instrument(skip(self))]
    async fn list_products(&self, page: Option<String>) -> Result<ProductPage, CommerceError> {
        let page_number: u32 = page.as_deref().and_then(|p| p.parse().ok()).unwrap_or(1);

        let response = self
            .get(
                "/products",
                &[
                    ("page", page_number.to_string()),
                    ("per_page", PAGE_SIZE.to_string()),
                ],
            )
            .await?;

        let batch: Vec<WooProduct> = response.json().await?;

        // A full batch may be the last one; the follow-up request then
        // returns an empty batch and terminates the loop.
        let next = (batch.len() as u32 >= PAGE_SIZE).then(|| (page_number + 1).to_string());
        let items = batch.into_iter().map(WooProduct::into_external).collect();

        Ok(ProductPage { items, next })
    }

    #[instrument(skip(self))]
    async fn get_product(&self, id: &str) -> Result<Option<ExternalProduct>, CommerceError> {
        let response = self.send_get(&format!("/products/{id}"), &[]).await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CommerceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let product: WooProduct = response.json().await?;
        Ok(Some(product.into_external()))
    }

    /// WooCommerce exposes no store-profile endpoint comparable to Shopify's
    /// `/shop.json`, so company info is synthesized from configuration.
    async fn store_info(&self) -> Result<CompanyInfo, CommerceError> {
        Ok(CompanyInfo::new(
            self.inner.store_name.clone(),
            String::new(),
            Vec::new(),
            serde_json::Map::new(),
        ))
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct WooProduct {
    id: i64,
    name: Option<String>,
    description: Option<String>,
    price: Option<String>,
    stock_quantity: Option<i64>,
    permalink: Option<String>,
    #[serde(default)]
    images: Vec<WooImage>,
}

#[derive(Debug, Deserialize)]
struct WooImage {
    src: Option<String>,
}

impl WooProduct {
    fn into_external(self) -> ExternalProduct {
        ExternalProduct {
            id: Some(self.id.to_string()),
            name: self.name,
            description: self.description.unwrap_or_default(),
            price: self.price,
            stock: self.stock_quantity.map(|quantity| quantity.to_string()),
            image_url: self.images.into_iter().next().and_then(|image| image.src),
            product_url: self.permalink,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(id: i64) -> WooProduct {
        WooProduct {
            id,
            name: Some("Raincoat".to_string()),
            description: Some("Stays dry".to_string()),
            price: Some("59.00".to_string()),
            stock_quantity: Some(4),
            permalink: Some("https://shop.example.com/product/raincoat".to_string()),
            images: vec![WooImage {
                src: Some("https://shop.example.com/r.jpg".to_string()),
            }],
        }
    }

    #[test]
    fn wire_product_converts_to_external() {
        let external = wire(11).into_external();
        assert_eq!(external.id.as_deref(), Some("11"));
        assert_eq!(external.name.as_deref(), Some("Raincoat"));
        assert_eq!(external.price.as_deref(), Some("59.00"));
        assert_eq!(external.stock.as_deref(), Some("4"));
        assert_eq!(
            external.image_url.as_deref(),
            Some("https://shop.example.com/r.jpg")
        );
    }

    #[test]
    fn null_stock_maps_to_none() {
        let mut product = wire(12);
        product.stock_quantity = None;
        product.images = vec![];
        let external = product.into_external();
        assert_eq!(external.stock, None);
        assert_eq!(external.image_url, None);
    }
}
