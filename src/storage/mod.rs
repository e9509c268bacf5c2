//! Persistence for discovery results.
//!
//! Thin SQLite layer: one `hosts` row per crawled site, one `feeds` row per
//! validated feed. The discovery engine knows nothing about it; it is
//! handed finished [`crate::discover::DiscoveryResult`] values.

mod db;

pub use db::{Database, StorageError, StoredFeed};
