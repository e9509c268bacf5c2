use crate::discover::client::{FetchClient, FetchError};
use crate::discover::types::{Candidate, FeedFormat, FeedRecord, SiteTarget};
use crate::util::{normalize, strip_control_chars};
use quick_xml::events::Event;
use quick_xml::Reader;

/// A candidate confirmed to be a real feed.
///
/// The fetched body rides along so hub extraction does not fetch a second
/// time.
#[derive(Debug)]
pub struct ValidatedFeed {
    pub record: FeedRecord,
    pub body: Vec<u8>,
}

/// Fetches a candidate and confirms it is an RSS or Atom document.
///
/// `Ok(None)` means the guess was wrong (non-2xx, not XML, wrong root
/// element), which is a normal miss, not an error. `Err` is a
/// network-level failure; the orchestrator tallies those for its
/// unreachability verdict but never surfaces them per candidate.
///
/// Pure beyond the fetch: the same URL and body always classify the same
/// way.
pub async fn validate(
    client: &FetchClient,
    site: &SiteTarget,
    candidate: &Candidate,
) -> Result<Option<ValidatedFeed>, FetchError> {
    let response = client.get(&candidate.url).await?;

    if !response.is_success() {
        tracing::debug!(url = %candidate.url, status = response.status, "candidate rejected");
        return Ok(None);
    }

    let format = match classify_root(&response.body) {
        Some(format) => format,
        None => return Ok(None),
    };

    // The root element says feed; feed-rs settles well-formedness and
    // yields the title.
    let parsed = match feed_rs::parser::parse(&response.body[..]) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::debug!(
                url = %candidate.url,
                error = %err,
                "root element looked like a feed but the body does not parse"
            );
            return Ok(None);
        }
    };

    // Misconfigured servers ship feeds as text/html all the time, so the
    // header never overrides a successful parse; it is only worth a log line.
    if let Some(content_type) = &response.content_type {
        if !content_type.contains("xml")
            && !content_type.contains("rss")
            && !content_type.contains("atom")
        {
            tracing::debug!(
                url = %candidate.url,
                content_type = %content_type,
                "feed served with a non-XML content type"
            );
        }
    }

    let title = parsed
        .title
        .map(|t| strip_control_chars(&t.content).into_owned())
        .filter(|t| !t.is_empty());

    let record = FeedRecord {
        url: normalize(&candidate.url),
        format,
        title,
        strategy: candidate.strategy,
        site: site.as_str().to_owned(),
    };

    Ok(Some(ValidatedFeed {
        record,
        body: response.body,
    }))
}

/// Reads just far enough into a document to see its root element.
///
/// `rss` is RSS 2.x, `feed` is Atom; namespace prefixes are ignored.
/// Anything else (RDF, HTML, unrelated XML, non-XML) is not a feed.
pub fn classify_root(body: &[u8]) -> Option<FeedFormat> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return match local_name(e.name().as_ref()) {
                    b"rss" => Some(FeedFormat::Rss),
                    b"feed" => Some(FeedFormat::Atom),
                    _ => None,
                };
            }
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            // declarations, DOCTYPE, comments, leading whitespace
            _ => {}
        }
        buf.clear();
    }
}

/// Element name with any namespace prefix stripped.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}
