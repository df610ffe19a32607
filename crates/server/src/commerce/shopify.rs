//! Shopify REST Admin API client.
//!
//! Read-only consumption of `/products.json`, `/shop.json` and
//! `/policies.json`. Pagination is cursor-based: the next page is taken from
//! the `Link` response header's `rel="next"` entry. Every request first
//! awaits the 40 req/s fixed-window limiter.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, instrument};

use shopflow_core::{CompanyInfo, SyncKind};

use super::rate_limit::FixedWindowLimiter;
use super::{CommerceError, CommerceProvider, ExternalProduct, ProductPage};
use crate::config::ShopifyConfig;

/// Products fetched per page.
const PAGE_SIZE: u32 = 50;

/// Client for the Shopify REST Admin API.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    client: reqwest::Client,
    /// `https://{store}.myshopify.com/admin/api/{version}`
    base_url: String,
    /// Store domain without scheme, used to build product page URLs.
    store_domain: String,
    limiter: FixedWindowLimiter,
}

impl ShopifyClient {
    /// Create a new client from validated configuration.
    ///
    /// # Panics
    ///
    /// Panics if the access token contains invalid header characters; the
    /// config loader has already validated it is present.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "X-Shopify-Access-Token",
            HeaderValue::from_str(config.access_token.expose_secret())
                .expect("Invalid access token for header"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            inner: Arc::new(ShopifyClientInner {
                client,
                base_url: format!(
                    "https://{}/admin/api/{}",
                    config.store_domain, config.api_version
                ),
                store_domain: config.store_domain.clone(),
                limiter: FixedWindowLimiter::shopify(),
            }),
        }
    }

    /// Rate-limited GET returning the raw response for the caller to
    /// inspect (status is not yet checked).
    async fn send_get(&self, endpoint: &str) -> Result<reqwest::Response, CommerceError> {
        self.inner.limiter.check_rate_limit().await;
        let url = format!("{}{}", self.inner.base_url, endpoint);
        let response = self.inner.client.get(&url).send().await?;
        debug!(endpoint, status = %response.status(), "Shopify API request");
        Ok(response)
    }

    /// Rate-limited GET that fails with [`CommerceError::Api`] on non-2xx.
    async fn get(&self, endpoint: &str) -> Result<reqwest::Response, CommerceError> {
        let response = self.send_get(endpoint).await?;
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
impl CommerceProvider for ShopifyClient {
    fn name(&self) -> &'static str {
        "shopify"
    }

    fn sync_kind(&self) -> SyncKind {
        SyncKind::Shopify
    }

    #[instrument(skip(self))]
    async fn list_products(&self, page: Option<String>) -> Result<ProductPage, CommerceError> {
        let endpoint = page.map_or_else(
            || format!("/products.json?limit={PAGE_SIZE}"),
            |params| format!("/products.json?{params}"),
        );

        let response = self.get(&endpoint).await?;

        // The Link header must be read before the body consumes the response.
        let next = response
            .headers()
            .get("link")
            .and_then(|value| value.to_str().ok())
            .and_then(extract_next_page);

        let body: ProductsResponse = response.json().await?;
        let items = body
            .products
            .into_iter()
            .map(|product| product.into_external(&self.inner.store_domain))
            .collect();

        Ok(ProductPage { items, next })
    }

    #[instrument(skip(self))]
    async fn get_product(&self, id: &str) -> Result<Option<ExternalProduct>, CommerceError> {
        let response = self.send_get(&format!("/products/{id}.json")).await?;
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

        let body: ProductResponse = response.json().await?;
        Ok(Some(
            body.product.into_external(&self.inner.store_domain),
        ))
    }

    #[instrument(skip(self))]
    async fn store_info(&self) -> Result<CompanyInfo, CommerceError> {
        let shop: ShopResponse = self.get("/shop.json").await?.json().await?;
        let policies: PoliciesResponse = self.get("/policies.json").await?.json().await?;

        let shop = shop.shop;
        let mut contact_info = serde_json::Map::new();
        contact_info.insert("email".to_string(), shop.email.unwrap_or_default().into());
        contact_info.insert("phone".to_string(), shop.phone.unwrap_or_default().into());
        contact_info.insert(
            "address".to_string(),
            serde_json::json!({
                "address1": shop.address1.unwrap_or_default(),
                "address2": shop.address2.unwrap_or_default(),
                "city": shop.city.unwrap_or_default(),
                "province": shop.province.unwrap_or_default(),
                "country": shop.country.unwrap_or_default(),
                "zip": shop.zip.unwrap_or_default(),
            }),
        );

        Ok(CompanyInfo::new(
            shop.name.unwrap_or_default(),
            shop.description.unwrap_or_default(),
            policies
                .policies
                .into_iter()
                .filter_map(|policy| policy.body)
                .collect(),
            contact_info,
        ))
    }
}

/// Extract the next page's query parameters from a `Link` header.
///
/// Shopify formats it as `<https://...?page_info=abc&limit=50>; rel="next"`,
/// optionally alongside a `rel="previous"` entry. Returns the query string
/// of the `rel="next"` link, or `None` on the last page.
fn extract_next_page(link_header: &str) -> Option<String> {
    link_header.split(',').find_map(|part| {
        if !part.contains("rel=\"next\"") {
            return None;
        }
        let url = part.trim().strip_prefix('<')?;
        let url = url.split('>').next()?;
        url.split_once('?').map(|(_, query)| query.to_string())
    })
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct ProductsResponse {
    #[serde(default)]
    products: Vec<ShopifyProduct>,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    product: ShopifyProduct,
}

#[derive(Debug, Deserialize)]
struct ShopifyProduct {
    id: i64,
    title: Option<String>,
    body_html: Option<String>,
    handle: Option<String>,
    #[serde(default)]
    variants: Vec<ShopifyVariant>,
    image: Option<ShopifyImage>,
}

#[derive(Debug, Deserialize)]
struct ShopifyVariant {
    price: Option<String>,
    inventory_quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ShopifyImage {
    src: Option<String>,
}

impl ShopifyProduct {
    fn into_external(self, store_domain: &str) -> ExternalProduct {
        let first_variant = self.variants.into_iter().next();
        ExternalProduct {
            id: Some(self.id.to_string()),
            name: self.title,
            description: self.body_html.unwrap_or_default(),
            price: first_variant.as_ref().and_then(|v| v.price.clone()),
            stock: first_variant
                .and_then(|v| v.inventory_quantity)
                .map(|quantity| quantity.to_string()),
            image_url: self.image.and_then(|image| image.src),
            product_url: self
                .handle
                .map(|handle| format!("https://{store_domain}/products/{handle}")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ShopResponse {
    shop: Shop,
}

#[derive(Debug, Deserialize)]
struct Shop {
    name: Option<String>,
    description: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address1: Option<String>,
    address2: Option<String>,
    city: Option<String>,
    province: Option<String>,
    country: Option<String>,
    zip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PoliciesResponse {
    #[serde(default)]
    policies: Vec<Policy>,
}

#[derive(Debug, Deserialize)]
struct Policy {
    body: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_next_link_query_params() {
        let header = "<https://shop.myshopify.com/admin/api/2024-01/products.json?page_info=abc123&limit=50>; rel=\"next\"";
        assert_eq!(
            extract_next_page(header),
            Some("page_info=abc123&limit=50".to_string())
        );
    }

    #[test]
    fn skips_previous_link() {
        let header = "<https://shop.myshopify.com/x?page_info=prev>; rel=\"previous\", <https://shop.myshopify.com/x?page_info=next&limit=50>; rel=\"next\"";
        assert_eq!(
            extract_next_page(header),
            Some("page_info=next&limit=50".to_string())
        );
    }

    #[test]
    fn no_next_link_means_last_page() {
        let header = "<https://shop.myshopify.com/x?page_info=prev>; rel=\"previous\"";
        assert_eq!(extract_next_page(header), None);
        assert_eq!(extract_next_page(""), None);
    }

    #[test]
    fn wire_product_converts_to_external() {
        let product = ShopifyProduct {
            id: 7,
            title: Some("Boots".to_string()),
            body_html: Some("<p>dry</p>".to_string()),
            handle: Some("boots".to_string()),
            variants: vec![ShopifyVariant {
                price: Some("19.99".to_string()),
                inventory_quantity: Some(3),
            }],
            image: Some(ShopifyImage {
                src: Some("https://cdn.example.com/b.jpg".to_string()),
            }),
        };

        let external = product.into_external("shop.myshopify.com");
        assert_eq!(external.id.as_deref(), Some("7"));
        assert_eq!(external.price.as_deref(), Some("19.99"));
        assert_eq!(external.stock.as_deref(), Some("3"));
        assert_eq!(
            external.product_url.as_deref(),
            Some("https://shop.myshopify.com/products/boots")
        );
    }

    #[test]
    fn wire_product_without_variants_has_no_price() {
        let product = ShopifyProduct {
            id: 8,
            title: Some("Hat".to_string()),
            body_html: None,
            handle: None,
            variants: vec![],
            image: None,
        };

        let external = product.into_external("shop.myshopify.com");
        assert_eq!(external.price, None);
        assert_eq!(external.stock, None);
        assert_eq!(external.product_url, None);
        assert_eq!(external.description, "");
    }
}
