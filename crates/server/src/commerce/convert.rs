//! External-to-internal product mapping.
//!
//! Numeric fields parse defensively: a malformed or negative price/stock is
//! logged and coerced to zero rather than failing the record, because a
//! partial import beats a hard failure on one bad row. Only a missing id or
//! name rejects the record outright.

use thiserror::Error;
use tracing::warn;
use url::Url;

use shopflow_core::Product;

use super::ExternalProduct;

/// A record the mapper cannot accept.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    /// The backend record carries no usable id.
    #[error("product record is missing an id")]
    MissingId,

    /// The backend record carries no name.
    #[error("product {0} is missing a name")]
    MissingName(String),
}

/// Convert a raw backend product into the internal [`Product`] model.
///
/// `description_extra` is never populated by an import; it is admin-only
/// input preserved across re-imports by the storage layer.
///
/// # Errors
///
/// Returns [`MappingError`] when the record lacks an id or a name.
pub fn map_external(raw: &ExternalProduct) -> Result<Product, MappingError> {
    let id = raw
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or(MappingError::MissingId)?
        .to_string();

    let name = raw
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| MappingError::MissingName(id.clone()))?
        .to_string();

    let price = parse_price(&id, raw.price.as_deref());
    let stock = parse_stock(&id, raw.stock.as_deref());
    let image_url = validate_image_url(&id, raw.image_url.as_deref());

    Ok(Product {
        id,
        name,
        description: raw.description.clone(),
        description_extra: String::new(),
        price,
        stock,
        image_url,
        product_url: raw.product_url.clone().unwrap_or_default(),
        embeddings: None,
    })
}

/// Parse a raw price, coercing malformed or negative values to `0.0`.
fn parse_price(id: &str, raw: Option<&str>) -> f64 {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return 0.0;
    };
    match raw.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => price,
        _ => {
            warn!(product_id = %id, price = %raw, "invalid price, coercing to 0");
            0.0
        }
    }
}

/// Parse a raw stock quantity, coercing malformed or negative values to `0`.
fn parse_stock(id: &str, raw: Option<&str>) -> u32 {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return 0;
    };
    match raw.parse::<i64>() {
        Ok(stock) if (0..=i64::from(u32::MAX)).contains(&stock) => {
            u32::try_from(stock).unwrap_or(0)
        }
        _ => {
            warn!(product_id = %id, stock = %raw, "invalid stock, coercing to 0");
            0
        }
    }
}

/// Keep only well-formed absolute http(s) URLs; anything else becomes empty
/// rather than being stored malformed.
fn validate_image_url(id: &str, raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
        return String::new();
    };
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => raw.to_string(),
        _ => {
            warn!(product_id = %id, image_url = %raw, "invalid image URL, dropping");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> ExternalProduct {
        ExternalProduct {
            id: Some("42".to_string()),
            name: Some("Waterproof Boots".to_string()),
            description: "<p>Keeps feet dry</p>".to_string(),
            price: Some("89.99".to_string()),
            stock: Some("12".to_string()),
            image_url: Some("https://cdn.example.com/boots.jpg".to_string()),
            product_url: Some("https://shop.example.com/products/boots".to_string()),
        }
    }

    #[test]
    fn maps_a_complete_record() {
        let product = map_external(&raw()).expect("map");
        assert_eq!(product.id, "42");
        assert_eq!(product.name, "Waterproof Boots");
        assert!((product.price - 89.99).abs() < f64::EPSILON);
        assert_eq!(product.stock, 12);
        assert_eq!(product.image_url, "https://cdn.example.com/boots.jpg");
    }

    #[test]
    fn import_never_populates_description_extra() {
        let product = map_external(&raw()).expect("map");
        assert_eq!(product.description_extra, "");
    }

    #[test]
    fn missing_id_is_rejected() {
        let mut record = raw();
        record.id = None;
        assert_eq!(map_external(&record), Err(MappingError::MissingId));

        record.id = Some(String::new());
        assert_eq!(map_external(&record), Err(MappingError::MissingId));
    }

    #[test]
    fn missing_name_is_rejected() {
        let mut record = raw();
        record.name = None;
        assert_eq!(
            map_external(&record),
            Err(MappingError::MissingName("42".to_string()))
        );
    }

    #[test]
    fn missing_price_and_stock_coerce_to_zero() {
        let mut record = raw();
        record.price = None;
        record.stock = None;
        let product = map_external(&record).expect("map");
        assert_eq!(product.price, 0.0);
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn malformed_price_coerces_to_zero_not_nan() {
        let mut record = raw();
        record.price = Some("not-a-number".to_string());
        let product = map_external(&record).expect("map");
        assert_eq!(product.price, 0.0);
        assert!(!product.price.is_nan());
    }

    #[test]
    fn negative_values_coerce_to_zero() {
        let mut record = raw();
        record.price = Some("-5.00".to_string());
        record.stock = Some("-3".to_string());
        let product = map_external(&record).expect("map");
        assert_eq!(product.price, 0.0);
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn nan_literal_price_coerces_to_zero() {
        let mut record = raw();
        record.price = Some("NaN".to_string());
        let product = map_external(&record).expect("map");
        assert_eq!(product.price, 0.0);
    }

    #[test]
    fn invalid_image_url_is_dropped() {
        let mut record = raw();
        record.image_url = Some("not a url".to_string());
        let product = map_external(&record).expect("map");
        assert_eq!(product.image_url, "");

        record.image_url = Some("ftp://example.com/a.jpg".to_string());
        let product = map_external(&record).expect("map");
        assert_eq!(product.image_url, "");
    }
}
