//! Domain types shared across Shopflow components.
//!
//! All types serialize with camelCase field names so JSON payloads stay
//! compatible with the admin clients consuming this API
//! (`descriptionExtra`, `imageUrl`, `lastShopifySync`, ...).

mod company;
mod product;
mod sync;

pub use company::{COMPANY_ID, CompanyInfo};
pub use product::Product;
pub use sync::{ImportReport, SyncKind, SyncMetadata};
