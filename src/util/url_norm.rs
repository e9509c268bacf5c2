use thiserror::Error;
use url::Url;

/// Errors for operator-supplied site entries.
///
/// Each bad input line is reported individually; a malformed entry never
/// aborts the batch.
#[derive(Debug, Error)]
pub enum InputError {
    /// The entry could not be parsed as a URL.
    #[error("invalid URL: {0}")]
    Parse(#[from] url::ParseError),
    /// The entry uses a scheme other than http or https.
    #[error("unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The entry has no host component.
    #[error("URL has no host")]
    MissingHost,
}

/// Parses one input-list entry into a validated site URL.
///
/// Bare hostnames are accepted: `example.com` becomes
/// `https://example.com`. Anything that is not http(s) with a host is
/// rejected with a per-entry [`InputError`].
pub fn parse_site_url(input: &str) -> Result<Url, InputError> {
    let trimmed = input.trim();
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&with_scheme)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(InputError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().is_none() {
        return Err(InputError::MissingHost);
    }

    Ok(url)
}

/// Canonical comparison form of a URL.
///
/// Scheme and host are lowercased and default ports stripped (the `url`
/// parser guarantees both), the fragment is dropped, and the trailing
/// slash removed from the path so `/feed` and `/feed/` compare equal.
/// The query string is preserved. Idempotent: normalizing an
/// already-normalized URL yields the same string.
pub fn normalize(url: &Url) -> String {
    let mut out = format!("{}://{}", url.scheme(), url.host_str().unwrap_or(""));
    if let Some(port) = url.port() {
        out.push(':');
        out.push_str(&port.to_string());
    }
    out.push_str(url.path().trim_end_matches('/'));
    if let Some(query) = url.query() {
        out.push('?');
        out.push_str(query);
    }
    out
}

/// [`normalize`] for a raw string; `None` when the string is not a URL.
pub fn normalize_str(raw: &str) -> Option<String> {
    Url::parse(raw).ok().map(|url| normalize(&url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_bare_hostname_gets_https() {
        let url = parse_site_url("example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_explicit_scheme_preserved() {
        let url = parse_site_url("http://example.com/blog").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.path(), "/blog");
    }

    #[test]
    fn test_whitespace_trimmed() {
        let url = parse_site_url("  example.com  ").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_bad_scheme_rejected() {
        let err = parse_site_url("ftp://example.com").unwrap_err();
        assert!(matches!(err, InputError::UnsupportedScheme(_)));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_site_url("not a url at all").is_err());
    }

    #[test]
    fn test_normalize_strips_trailing_slash() {
        assert_eq!(
            normalize_str("https://example.com/feed/").unwrap(),
            "https://example.com/feed"
        );
    }

    #[test]
    fn test_normalize_strips_fragment() {
        assert_eq!(
            normalize_str("https://example.com/feed#section").unwrap(),
            "https://example.com/feed"
        );
    }

    #[test]
    fn test_normalize_strips_default_port() {
        assert_eq!(
            normalize_str("https://example.com:443/feed").unwrap(),
            "https://example.com/feed"
        );
        assert_eq!(
            normalize_str("http://example.com:80/feed").unwrap(),
            "http://example.com/feed"
        );
    }

    #[test]
    fn test_normalize_keeps_explicit_port() {
        assert_eq!(
            normalize_str("http://example.com:8080/feed").unwrap(),
            "http://example.com:8080/feed"
        );
    }

    #[test]
    fn test_normalize_lowercases_host() {
        assert_eq!(
            normalize_str("HTTPS://EXAMPLE.COM/Feed").unwrap(),
            "https://example.com/Feed"
        );
    }

    #[test]
    fn test_normalize_keeps_query() {
        assert_eq!(
            normalize_str("https://example.com/feed?format=rss").unwrap(),
            "https://example.com/feed?format=rss"
        );
    }

    #[test]
    fn test_normalize_root_url() {
        assert_eq!(
            normalize_str("https://example.com/").unwrap(),
            "https://example.com"
        );
    }

    proptest! {
        // Normalization must be idempotent for anything it produces.
        #[test]
        fn prop_normalize_idempotent(
            host in "[a-z][a-z0-9]{0,20}\\.(com|org|net)",
            path in "(/[a-zA-Z0-9._-]{1,12}){0,4}/?",
            query in proptest::option::of("[a-z]{1,8}=[a-z0-9]{1,8}"),
        ) {
            let mut raw = format!("https://{host}{path}");
            if let Some(q) = query {
                raw.push('?');
                raw.push_str(&q);
            }
            let once = normalize_str(&raw).unwrap();
            let twice = normalize_str(&once).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
