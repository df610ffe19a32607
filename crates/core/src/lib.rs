//! Shopflow Core - Shared domain types.
//!
//! This crate provides the entities shared between the sync pipeline, the
//! storage layer, and the HTTP surface:
//!
//! - [`types::Product`] - catalog entry imported from a commerce backend
//! - [`types::CompanyInfo`] - singleton store/company record
//! - [`types::SyncMetadata`] - per-provider last-sync bookkeeping
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
