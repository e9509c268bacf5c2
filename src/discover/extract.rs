use crate::discover::types::{Candidate, Strategy};
use url::Url;

/// Cap on anchor-derived candidates per page. Index pages can carry
/// hundreds of article links that merely mention "rss" or ".xml"; without
/// a cap they would swamp validation.
const MAX_ANCHOR_CANDIDATES: usize = 30;

/// Substrings that make an anchor href worth validating as a feed.
const ANCHOR_HINTS: &[&str] = &["rss", "feed", "atom", ".xml"];

/// Scans an HTML document for feed and hub declarations.
///
/// Three sources, in order: `<link rel="alternate">` tags with an RSS/Atom
/// type, `<link rel="hub">` tags, and anchor hrefs that look feed-ish.
/// Relative URLs (relative-path, absolute-path, and protocol-relative
/// forms) resolve against `base`.
///
/// Uses simple string scanning rather than an HTML parser; malformed
/// markup degrades to "no candidates found" and never fails a discovery.
pub fn extract(base: &Url, html: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    scan_link_tags(base, html, &mut candidates);
    scan_anchor_tags(base, html, &mut candidates);
    candidates
}

fn scan_link_tags(base: &Url, html: &str, out: &mut Vec<Candidate>) {
    // ASCII lowering preserves byte offsets, so slices into the original
    // document stay aligned.
    let html_lower = html.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(link_start) = html_lower[search_from..].find("<link") {
        let abs_start = search_from + link_start;
        let remaining = &html_lower[abs_start..];

        let tag_end = match remaining.find('>') {
            Some(pos) => pos,
            None => break,
        };
        let tag = &remaining[..=tag_end];

        let strategy = if contains_attr(tag, "rel", "alternate") && is_feed_type(tag) {
            Some(Strategy::HtmlLink)
        } else if contains_attr(tag, "rel", "hub") {
            Some(Strategy::HubLink)
        } else {
            None
        };

        if let Some(strategy) = strategy {
            // href from the original-case slice to preserve URL casing
            let original_tag = &html[abs_start..abs_start + tag_end + 1];
            if let Some(href) = extract_attr_value(original_tag, "href") {
                push_resolved(out, base, href, strategy);
            }
        }

        search_from = abs_start + tag_end + 1;
    }
}

fn scan_anchor_tags(base: &Url, html: &str, out: &mut Vec<Candidate>) {
    let html_lower = html.to_ascii_lowercase();
    let mut search_from = 0;
    let mut emitted = 0;

    while let Some(a_start) = html_lower[search_from..].find("<a") {
        let abs_start = search_from + a_start;
        let remaining = &html_lower[abs_start..];

        // "<a" must be the whole tag name ("<abbr" etc. don't count)
        let next = remaining.as_bytes().get(2).copied();
        let is_anchor = matches!(next, Some(b' ' | b'\t' | b'\n' | b'\r'));

        let tag_end = match remaining.find('>') {
            Some(pos) => pos,
            None => break,
        };

        if is_anchor {
            let original_tag = &html[abs_start..abs_start + tag_end + 1];
            if let Some(href) = extract_attr_value(original_tag, "href") {
                let href_lower = href.to_ascii_lowercase();
                if ANCHOR_HINTS.iter().any(|hint| href_lower.contains(hint)) {
                    push_resolved(out, base, href, Strategy::HtmlLink);
                    emitted += 1;
                    if emitted >= MAX_ANCHOR_CANDIDATES {
                        tracing::debug!(base = %base, "anchor candidate cap reached");
                        break;
                    }
                }
            }
        }

        search_from = abs_start + tag_end + 1;
    }
}

fn push_resolved(out: &mut Vec<Candidate>, base: &Url, href: &str, strategy: Strategy) {
    match base.join(href) {
        // join() can produce non-http URLs from hrefs like "javascript:..."
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            out.push(Candidate { url, strategy });
        }
        _ => {}
    }
}

/// Checks whether a lowercased tag contains an attribute with the given
/// value, in either quote style.
fn contains_attr(tag: &str, attr_name: &str, attr_value: &str) -> bool {
    let pattern_double = format!("{attr_name}=\"{attr_value}\"");
    let pattern_single = format!("{attr_name}='{attr_value}'");
    tag.contains(&pattern_double) || tag.contains(&pattern_single)
}

/// Checks whether a lowercased `<link>` tag declares an RSS or Atom type.
fn is_feed_type(tag: &str) -> bool {
    tag.contains("application/rss+xml") || tag.contains("application/atom+xml")
}

/// Extracts the value of an attribute from a tag string (case-preserving).
fn extract_attr_value<'a>(tag: &'a str, attr_name: &str) -> Option<&'a str> {
    let tag_lower = tag.to_ascii_lowercase();
    let attr_prefix = format!("{attr_name}=");

    let attr_start = tag_lower.find(&attr_prefix)?;
    let value_start = attr_start + attr_prefix.len();

    if value_start >= tag.len() {
        return None;
    }

    let rest = &tag[value_start..];
    let quote = rest.as_bytes().first()?;

    if *quote != b'"' && *quote != b'\'' {
        return None;
    }

    let quote_char = *quote as char;
    let inner = &rest[1..];
    let end = inner.find(quote_char)?;

    Some(&inner[..end])
}
