//! Feed discovery engine: multi-strategy probing, validation, and hub
//! extraction.
//!
//! Given a site URL, the engine combines two candidate sources (links
//! declared in the site's HTML and a fixed list of well-known feed paths),
//! validates every candidate over HTTP, and extracts pub/sub hub links
//! from the feeds that validate.
//!
//! # Architecture
//!
//! - [`client`] - HTTP fetching with timeout, retry-with-backoff, and
//!   size-capped body reads
//! - [`probe`] - well-known-path candidate generation (pure, no I/O)
//! - [`extract`] - HTML `<link>`/anchor scanning with URL resolution
//! - [`validate`] - candidate fetching and RSS/Atom classification
//! - [`hub`] - `rel="hub"` extraction from validated feed bodies
//! - [`engine`] - orchestration: dedup, bounded concurrency, per-site
//!   deadline, status aggregation
//!
//! Per-candidate failures never escalate; a site only reports `Failed`
//! when nothing about it could be reached at all.

mod client;
mod engine;
mod extract;
mod hub;
mod probe;
mod validate;

pub mod types;

pub use client::{FetchClient, FetchError, FetchResponse, Method};
pub use engine::DiscoveryEngine;
pub use types::{
    Candidate, DiscoveryResult, DiscoveryStatus, FeedFormat, FeedRecord, HubRecord, SiteTarget,
    Strategy,
};
