//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `COMMERCE_PROVIDER` - Which backend to sync from: `shopify` or `woocommerce`
//! - `QDRANT_URL` - Qdrant base URL (e.g., <http://localhost:6333>)
//! - `OPENAI_API_KEY` - `OpenAI` API key for embeddings
//!
//! ## Required for `COMMERCE_PROVIDER=shopify`
//! - `SHOPIFY_STORE` - Store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_ACCESS_TOKEN` - Admin API access token
//!
//! ## Required for `COMMERCE_PROVIDER=woocommerce`
//! - `WOOCOMMERCE_URL` - Store base URL (must be https)
//! - `WOOCOMMERCE_STORE_NAME` - Human-readable store name
//! - `WOOCOMMERCE_CONSUMER_KEY` - REST API consumer key (ck_...)
//! - `WOOCOMMERCE_CONSUMER_SECRET` - REST API consumer secret (cs_...)
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 3000)
//! - `SHOPIFY_API_VERSION` - API version (default: 2024-01)
//! - `QDRANT_API_KEY` - Qdrant API key (for hosted clusters)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_SHOPIFY_API_VERSION: &str = "2024-01";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which commerce backend this deployment syncs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Shopify,
    WooCommerce,
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Selected commerce backend
    pub provider: ProviderKind,
    /// Shopify configuration (present when `provider` is Shopify)
    pub shopify: Option<ShopifyConfig>,
    /// WooCommerce configuration (present when `provider` is WooCommerce)
    pub woocommerce: Option<WooCommerceConfig>,
    /// Qdrant vector store configuration
    pub qdrant: QdrantConfig,
    /// `OpenAI` API key for embeddings
    pub openai_api_key: SecretString,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

/// Shopify Admin API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Store domain (e.g., your-store.myshopify.com)
    pub store_domain: String,
    /// API version (e.g., 2024-01)
    pub api_version: String,
    /// Admin API access token
    pub access_token: SecretString,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store_domain", &self.store_domain)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// WooCommerce REST API configuration.
///
/// Implements `Debug` manually to redact the consumer credentials.
#[derive(Clone)]
pub struct WooCommerceConfig {
    /// Store base URL (https)
    pub store_url: String,
    /// Human-readable store name (WooCommerce has no store-profile endpoint)
    pub store_name: String,
    /// REST API consumer key (ck_...)
    pub consumer_key: SecretString,
    /// REST API consumer secret (cs_...)
    pub consumer_secret: SecretString,
}

impl std::fmt::Debug for WooCommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooCommerceConfig")
            .field("store_url", &self.store_url)
            .field("store_name", &self.store_name)
            .field("consumer_key", &"[REDACTED]")
            .field("consumer_secret", &"[REDACTED]")
            .finish()
    }
}

/// Qdrant vector store configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct QdrantConfig {
    /// Base URL (e.g., <http://localhost:6333>)
    pub url: String,
    /// API key for hosted clusters (optional)
    pub api_key: Option<SecretString>,
}

impl std::fmt::Debug for QdrantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(get_required_env("DATABASE_URL")?);
        let host = get_env_or_default("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;

        let provider = match get_required_env("COMMERCE_PROVIDER")?.to_lowercase().as_str() {
            "shopify" => ProviderKind::Shopify,
            "woocommerce" => ProviderKind::WooCommerce,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "COMMERCE_PROVIDER".to_string(),
                    format!("expected 'shopify' or 'woocommerce', got '{other}'"),
                ));
            }
        };

        let shopify = match provider {
            ProviderKind::Shopify => Some(ShopifyConfig::from_env()?),
            ProviderKind::WooCommerce => None,
        };
        let woocommerce = match provider {
            ProviderKind::WooCommerce => Some(WooCommerceConfig::from_env()?),
            ProviderKind::Shopify => None,
        };

        let qdrant = QdrantConfig::from_env()?;
        let openai_api_key = SecretString::from(get_required_env("OPENAI_API_KEY")?);
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            provider,
            shopify,
            woocommerce,
            qdrant,
            openai_api_key,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let store_domain = get_required_env("SHOPIFY_STORE")?;
        validate_store_domain(&store_domain)?;

        Ok(Self {
            store_domain,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_SHOPIFY_API_VERSION),
            access_token: SecretString::from(get_required_env("SHOPIFY_ACCESS_TOKEN")?),
        })
    }
}

impl WooCommerceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let store_url = get_required_env("WOOCOMMERCE_URL")?;
        validate_store_url(&store_url)?;

        let consumer_key = get_required_env("WOOCOMMERCE_CONSUMER_KEY")?;
        validate_prefix("WOOCOMMERCE_CONSUMER_KEY", &consumer_key, "ck_")?;
        let consumer_secret = get_required_env("WOOCOMMERCE_CONSUMER_SECRET")?;
        validate_prefix("WOOCOMMERCE_CONSUMER_SECRET", &consumer_secret, "cs_")?;

        Ok(Self {
            store_url,
            store_name: get_required_env("WOOCOMMERCE_STORE_NAME")?,
            consumer_key: SecretString::from(consumer_key),
            consumer_secret: SecretString::from(consumer_secret),
        })
    }
}

impl QdrantConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: get_required_env("QDRANT_URL")?,
            api_key: get_optional_env("QDRANT_API_KEY").map(SecretString::from),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// A Shopify store domain must be the bare `*.myshopify.com` host, without a
/// scheme. Catches the common mistake of pasting the full admin URL.
fn validate_store_domain(domain: &str) -> Result<(), ConfigError> {
    if domain.contains("://") {
        return Err(ConfigError::InvalidEnvVar(
            "SHOPIFY_STORE".to_string(),
            "must be a bare domain without scheme".to_string(),
        ));
    }
    if !domain.ends_with(".myshopify.com") {
        return Err(ConfigError::InvalidEnvVar(
            "SHOPIFY_STORE".to_string(),
            "must end with .myshopify.com".to_string(),
        ));
    }
    Ok(())
}

/// Consumer credentials travel as query parameters, so the store URL must be
/// https for them to stay confidential in transit.
fn validate_store_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|e| {
        ConfigError::InvalidEnvVar("WOOCOMMERCE_URL".to_string(), e.to_string())
    })?;
    if url.scheme() != "https" {
        return Err(ConfigError::InvalidEnvVar(
            "WOOCOMMERCE_URL".to_string(),
            "must use https".to_string(),
        ));
    }
    Ok(())
}

fn validate_prefix(var_name: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
    if value.starts_with(prefix) {
        return Ok(());
    }
    Err(ConfigError::InvalidEnvVar(
        var_name.to_string(),
        format!("must start with '{prefix}'"),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_store_domain_accepts_bare_domain() {
        assert!(validate_store_domain("acme.myshopify.com").is_ok());
    }

    #[test]
    fn test_validate_store_domain_rejects_scheme() {
        assert!(validate_store_domain("https://acme.myshopify.com").is_err());
    }

    #[test]
    fn test_validate_store_domain_rejects_other_hosts() {
        assert!(validate_store_domain("acme.example.com").is_err());
    }

    #[test]
    fn test_validate_store_url_requires_https() {
        assert!(validate_store_url("https://shop.example.com").is_ok());
        assert!(validate_store_url("http://shop.example.com").is_err());
        assert!(validate_store_url("not a url").is_err());
    }

    #[test]
    fn test_validate_credential_prefixes() {
        assert!(validate_prefix("K", "ck_abc123", "ck_").is_ok());
        assert!(validate_prefix("K", "cs_abc123", "ck_").is_err());
        assert!(validate_prefix("S", "cs_abc123", "cs_").is_ok());
    }

    #[test]
    fn test_shopify_config_debug_redacts_secrets() {
        let config = ShopifyConfig {
            store_domain: "acme.myshopify.com".to_string(),
            api_version: "2024-01".to_string(),
            access_token: SecretString::from("shpat_super_secret_token"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("acme.myshopify.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("shpat_super_secret_token"));
    }

    #[test]
    fn test_woocommerce_config_debug_redacts_secrets() {
        let config = WooCommerceConfig {
            store_url: "https://shop.example.com".to_string(),
            store_name: "Acme".to_string(),
            consumer_key: SecretString::from("ck_super_secret"),
            consumer_secret: SecretString::from("cs_super_secret"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("https://shop.example.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("ck_super_secret"));
        assert!(!debug_output.contains("cs_super_secret"));
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            provider: ProviderKind::Shopify,
            shopify: None,
            woocommerce: None,
            qdrant: QdrantConfig {
                url: "http://localhost:6333".to_string(),
                api_key: None,
            },
            openai_api_key: SecretString::from("sk-test"),
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }
}
