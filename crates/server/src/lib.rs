//! Shopflow server - commerce catalog sync and semantic product search.
//!
//! Imports products and store information from a commerce backend (Shopify
//! or WooCommerce) into `PostgreSQL`, indexes products into a Qdrant vector
//! collection for semantic search, and serves a JSON API over both.
//!
//! # Architecture
//!
//! - One [`commerce::CommerceProvider`] implementation per backend, behind a
//!   fixed-window outbound rate limiter
//! - [`sync::SyncService`] drives paginated imports with per-item error
//!   tallies and single-writer guarding
//! - [`vector::ProductIndexer`] embeds products (`OpenAI`) and upserts them
//!   into Qdrant under deterministic name-based UUIDs
//! - [`cache::TtlCache`] serves company info and prompt text with explicit
//!   invalidation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod commerce;
pub mod config;
pub mod db;
pub mod error;
pub mod prompts;
pub mod routes;
pub mod state;
pub mod sync;
pub mod vector;
