use crate::discover::types::{Candidate, SiteTarget, Strategy};
use url::Url;

/// Conventional feed locations, probed in this order on every site.
pub const WELL_KNOWN_PATHS: &[&str] = &[
    "/feed",
    "/rss",
    "/atom.xml",
    "/feed.xml",
    "/rss.xml",
    "/index.xml",
    "/feeds",
    "/atom",
    "/blog/feed",
    "/blog/rss",
    "/news/rss",
    "/feed/rss",
    "/syndication",
    "/rss-feed",
];

/// Suffixes tried under a non-root input path
/// (`https://host/blog` → `https://host/blog/feed`, ...).
const NESTED_SUFFIXES: &[&str] = &["/feed", "/feed.xml", "/rss", "/rss.xml", "/atom.xml"];

/// Content management systems with predictable feed locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cms {
    WordPress,
    Drupal,
    Ghost,
    Medium,
}

impl Cms {
    fn feed_paths(self) -> &'static [&'static str] {
        match self {
            Cms::WordPress => &["/feed", "/comments/feed", "/blog/feed"],
            Cms::Drupal => &["/rss.xml", "/feed"],
            Cms::Ghost => &["/rss/"],
            Cms::Medium => &["/feed"],
        }
    }
}

/// Sniffs root-page HTML for CMS fingerprints. First match wins; the
/// markers are ordered by how unambiguous they are.
pub fn detect_cms(html: &str) -> Option<Cms> {
    let text = html.to_ascii_lowercase();
    if text.contains("wp-content") || text.contains("wp-includes") {
        return Some(Cms::WordPress);
    }
    if text.contains("drupal") {
        return Some(Cms::Drupal);
    }
    if text.contains("/ghost/") {
        return Some(Cms::Ghost);
    }
    if text.contains("medium.com") {
        return Some(Cms::Medium);
    }
    None
}

/// Generates well-known-path candidates for a site.
///
/// Deterministic: the same site and root page always yield the same list
/// in the same order, so discovery is reproducible. No fetching happens
/// here; validation runs uniformly downstream.
///
/// When root-page HTML is available, CMS-specific paths lead the list;
/// when the input URL carries its own path, nested variants
/// (`/blog/feed` etc.) trail it.
pub fn probe(site: &SiteTarget, root_html: Option<&str>) -> Vec<Candidate> {
    let root = site.root();
    let mut candidates = Vec::new();

    if let Some(cms) = root_html.and_then(detect_cms) {
        tracing::debug!(site = %site, cms = ?cms, "detected CMS");
        for path in cms.feed_paths() {
            push_joined(&mut candidates, &root, path);
        }
    }

    for path in WELL_KNOWN_PATHS {
        push_joined(&mut candidates, &root, path);
    }

    let site_path = site.url().path().trim_end_matches('/');
    if !site_path.is_empty() {
        for suffix in NESTED_SUFFIXES {
            let nested = format!("{site_path}{suffix}");
            push_joined(&mut candidates, &root, &nested);
        }
    }

    candidates
}

fn push_joined(out: &mut Vec<Candidate>, root: &Url, path: &str) {
    if let Ok(url) = root.join(path) {
        out.push(Candidate {
            url,
            strategy: Strategy::WellKnownPath,
        });
    }
}
