use crate::discover::types::{FeedRecord, HubRecord};
use crate::discover::validate::local_name;
use crate::util::normalize;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashSet;
use url::Url;

/// Extracts pub/sub hub declarations from a validated feed's own body.
///
/// Both conventions are recognized: `<link rel="hub">` in Atom feeds and
/// `<atom:link rel="hub">` inside RSS channels. Relative hrefs resolve
/// against the feed URL. One record per distinct hub after normalization.
///
/// This never fails a discovery: most feeds advertise no hub, and XML
/// trouble mid-scan just ends the scan with whatever was found.
pub fn extract_hubs(record: &FeedRecord, body: &[u8]) -> Vec<HubRecord> {
    let feed_url = match Url::parse(&record.url) {
        Ok(url) => url,
        Err(_) => return Vec::new(),
    };

    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut seen = HashSet::new();
    let mut hubs = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if local_name(e.name().as_ref()) == b"link" {
                    if let Some(href) = hub_href(&e, &reader) {
                        if let Ok(resolved) = feed_url.join(&href) {
                            let hub_url = normalize(&resolved);
                            if seen.insert(hub_url.clone()) {
                                hubs.push(HubRecord {
                                    feed_url: record.url.clone(),
                                    hub_url,
                                });
                            }
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                tracing::debug!(feed = %record.url, error = %err, "ending hub scan on XML error");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    hubs
}

/// Returns the href when the element is a hub link.
fn hub_href(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Option<String> {
    let mut rel_is_hub = false;
    let mut href = None;

    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"rel" => {
                rel_is_hub = attr.value.as_ref().eq_ignore_ascii_case(b"hub");
            }
            b"href" => {
                href = attr
                    .decode_and_unescape_value(reader.decoder())
                    .ok()
                    .map(|v| v.into_owned());
            }
            _ => {}
        }
    }

    if rel_is_hub {
        href
    } else {
        None
    }
}
