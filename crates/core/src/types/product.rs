//! Catalog product entity.

use serde::{Deserialize, Serialize};

/// A catalog product imported from a commerce backend.
///
/// `id` is the stable external identifier (Shopify/WooCommerce product id as
/// a string) and is the join key between the document store and the vector
/// index. It never changes after first import.
///
/// `description_extra` is admin-curated search-enrichment text. It is never
/// written by an import: re-imports overwrite every other field but must
/// preserve it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Stable external identifier.
    pub id: String,
    /// Product title.
    pub name: String,
    /// Product description (HTML allowed).
    #[serde(default)]
    pub description: String,
    /// Admin-curated free text, used only for search enrichment.
    #[serde(default)]
    pub description_extra: String,
    /// Price in the store currency. Never negative; malformed source values
    /// are coerced to `0.0` at mapping time.
    #[serde(default)]
    pub price: f64,
    /// Units in stock. Never negative; malformed source values are coerced
    /// to `0` at mapping time.
    #[serde(default)]
    pub stock: u32,
    /// Absolute URL of the primary product image, or empty when absent or
    /// malformed.
    #[serde(default)]
    pub image_url: String,
    /// Public URL of the product page.
    #[serde(default)]
    pub product_url: String,
    /// Optional embedding vector, populated by the vector sync.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<f32>>,
}

impl Product {
    /// Text used as the embedding input: name, description and curated
    /// extra text concatenated and trimmed.
    #[must_use]
    pub fn embedding_text(&self) -> String {
        format!(
            "{} {} {}",
            self.name, self.description, self.description_extra
        )
        .trim()
        .to_string()
    }
}
