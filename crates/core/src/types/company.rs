//! Company/store information entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Singleton document id for the company record.
pub const COMPANY_ID: &str = "company";

/// Store-level information imported from the commerce backend.
///
/// A singleton entity (fixed id [`COMPANY_ID`]) that is overwritten
/// wholesale on each import and read-mostly otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    /// Always [`COMPANY_ID`].
    pub id: String,
    /// Store name.
    pub name: String,
    /// Store description.
    #[serde(default)]
    pub description: String,
    /// Policy texts (shipping, returns, ...) in the order the backend
    /// reports them.
    #[serde(default)]
    pub policies: Vec<String>,
    /// Open key-value contact details (email, phone, address, ...).
    #[serde(default)]
    pub contact_info: serde_json::Map<String, serde_json::Value>,
    /// Last import time.
    pub updated_at: DateTime<Utc>,
}

impl CompanyInfo {
    /// Create a new record with the fixed singleton id, stamped now.
    #[must_use]
    pub fn new(
        name: String,
        description: String,
        policies: Vec<String>,
        contact_info: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: COMPANY_ID.to_string(),
            name,
            description,
            policies,
            contact_info,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_singleton_id() {
        let info = CompanyInfo::new(
            "Acme".to_string(),
            String::new(),
            vec![],
            serde_json::Map::new(),
        );
        assert_eq!(info.id, COMPANY_ID);
    }
}
