//! feedscout: batch RSS/Atom feed discovery.
//!
//! Given a list of website URLs, feedscout probes each site with two
//! concurrent strategies (links declared in the site's HTML and a fixed
//! list of well-known feed paths), validates every candidate as a real
//! RSS or Atom document, extracts pub/sub hub links from validated feeds,
//! and hands the normalized, deduplicated results to the storage and
//! export layers.
//!
//! The interesting parts live in [`discover`]; [`storage`] and [`export`]
//! are thin plumbing around finished [`discover::DiscoveryResult`]s.

pub mod config;
pub mod discover;
pub mod export;
pub mod storage;
pub mod util;
