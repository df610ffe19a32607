//! Synchronization bookkeeping types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which external system a sync timestamp belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    /// Product/company import from Shopify.
    Shopify,
    /// Product/company import from WooCommerce.
    WooCommerce,
    /// Embedding upsert into the vector index.
    Qdrant,
}

impl SyncKind {
    /// Stable lowercase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shopify => "shopify",
            Self::WooCommerce => "woocommerce",
            Self::Qdrant => "qdrant",
        }
    }
}

impl std::fmt::Display for SyncKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Singleton record tracking when each sync last completed with at least one
/// success. A timestamp is only advanced by a successful run; failed or
/// empty runs leave it untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    pub last_shopify_sync: Option<DateTime<Utc>>,
    pub last_woo_commerce_sync: Option<DateTime<Utc>>,
    pub last_qdrant_sync: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Per-item tally of a best-effort batch import. One bad record increments
/// `errors` without aborting the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub success: u32,
    pub errors: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_kind_names() {
        assert_eq!(SyncKind::Shopify.as_str(), "shopify");
        assert_eq!(SyncKind::WooCommerce.as_str(), "woocommerce");
        assert_eq!(SyncKind::Qdrant.as_str(), "qdrant");
    }

    #[test]
    fn metadata_serializes_camel_case() {
        let meta = SyncMetadata::default();
        let json = serde_json::to_value(&meta).expect("serialize");
        assert!(json.get("lastShopifySync").is_some());
        assert!(json.get("lastQdrantSync").is_some());
    }
}
