use std::fmt;
use url::Url;

/// An input website to discover feeds for.
///
/// Built from a validated input-list entry; immutable for the lifetime of
/// one discovery run.
#[derive(Debug, Clone)]
pub struct SiteTarget {
    url: Url,
}

impl SiteTarget {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Scheme + host (+ explicit port) with the path cleared; the base
    /// that well-known paths resolve against.
    pub fn root(&self) -> Url {
        let mut root = self.url.clone();
        root.set_path("/");
        root.set_query(None);
        root.set_fragment(None);
        root
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for SiteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// How a candidate URL was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Guessed from the fixed list of conventional feed paths.
    WellKnownPath,
    /// Declared by the site's HTML (`<link rel="alternate">` or a feed-ish
    /// anchor href).
    HtmlLink,
    /// Declared by a `rel="hub"` link in the site's HTML.
    HubLink,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::WellKnownPath => "well-known-path",
            Strategy::HtmlLink => "html-link",
            Strategy::HubLink => "hub-link",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unvalidated URL suspected of being a feed.
///
/// Ephemeral: candidates exist only between generation and validation
/// inside one `discover` call.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub url: Url,
    pub strategy: Strategy,
}

/// The syndication format of a validated feed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    Atom,
}

impl FeedFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedFormat::Rss => "rss",
            FeedFormat::Atom => "atom",
        }
    }
}

impl fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated feed: the unit that gets persisted and exported.
#[derive(Debug, Clone)]
pub struct FeedRecord {
    /// Canonical absolute URL (normalized form).
    pub url: String,
    pub format: FeedFormat,
    /// Channel/feed title, when the document carries one.
    pub title: Option<String>,
    pub strategy: Strategy,
    /// The site this feed was discovered for.
    pub site: String,
}

/// A pub/sub hub advertised by a validated feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubRecord {
    /// Normalized URL of the feed that advertised the hub.
    pub feed_url: String,
    /// Normalized URL of the hub endpoint.
    pub hub_url: String,
}

/// Aggregate outcome for one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStatus {
    /// At least one feed validated.
    Ok,
    /// Site reachable but nothing validated, or the per-site deadline cut
    /// validation short.
    Partial,
    /// The site could not be reached at all.
    Failed,
}

impl DiscoveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DiscoveryStatus::Ok => "ok",
            DiscoveryStatus::Partial => "partial",
            DiscoveryStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DiscoveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything discovered for one site.
///
/// Feed URLs are unique after normalization within one result. Order
/// carries no meaning: candidates validate concurrently, so consumers must
/// not read importance into position.
#[derive(Debug)]
pub struct DiscoveryResult {
    pub site: String,
    pub feeds: Vec<FeedRecord>,
    pub hubs: Vec<HubRecord>,
    pub status: DiscoveryStatus,
    /// Cause summary when the site was unreachable or the deadline fired.
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_clears_path_and_query() {
        let url = Url::parse("https://example.com/blog/archive?page=2#top").unwrap();
        let site = SiteTarget::new(url);
        assert_eq!(site.root().as_str(), "https://example.com/");
    }

    #[test]
    fn test_root_keeps_explicit_port() {
        let url = Url::parse("http://example.com:8080/blog").unwrap();
        let site = SiteTarget::new(url);
        assert_eq!(site.root().as_str(), "http://example.com:8080/");
    }

    #[test]
    fn test_strategy_labels() {
        assert_eq!(Strategy::WellKnownPath.as_str(), "well-known-path");
        assert_eq!(Strategy::HtmlLink.as_str(), "html-link");
        assert_eq!(Strategy::HubLink.as_str(), "hub-link");
    }
}
