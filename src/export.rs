//! Delimited export of discovery results.
//!
//! One row per validated feed; a feed's hub URLs are joined into a single
//! cell. The discovery engine hands this module finished records and knows
//! nothing about the file format.

use crate::discover::types::DiscoveryResult;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export file: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes every feed across the batch to a CSV file.
///
/// Columns: site, feed_url, format, title, strategy, hub_urls (multiple
/// hubs joined with "; "). Returns the number of feed rows written.
pub fn write_csv(path: &Path, results: &[DiscoveryResult]) -> Result<usize, ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["site", "feed_url", "format", "title", "strategy", "hub_urls"])?;

    let mut rows = 0;
    for result in results {
        for feed in &result.feeds {
            let hub_urls = result
                .hubs
                .iter()
                .filter(|h| h.feed_url == feed.url)
                .map(|h| h.hub_url.as_str())
                .collect::<Vec<_>>()
                .join("; ");

            writer.write_record([
                result.site.as_str(),
                feed.url.as_str(),
                feed.format.as_str(),
                feed.title.as_deref().unwrap_or(""),
                feed.strategy.as_str(),
                hub_urls.as_str(),
            ])?;
            rows += 1;
        }
    }

    writer.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::types::{
        DiscoveryStatus, FeedFormat, FeedRecord, HubRecord, Strategy,
    };
    use pretty_assertions::assert_eq;

    fn sample_results() -> Vec<DiscoveryResult> {
        vec![DiscoveryResult {
            site: "https://example.com/".to_owned(),
            feeds: vec![
                FeedRecord {
                    url: "https://example.com/feed".to_owned(),
                    format: FeedFormat::Rss,
                    title: Some("Example".to_owned()),
                    strategy: Strategy::HtmlLink,
                    site: "https://example.com/".to_owned(),
                },
                FeedRecord {
                    url: "https://example.com/atom.xml".to_owned(),
                    format: FeedFormat::Atom,
                    title: None,
                    strategy: Strategy::WellKnownPath,
                    site: "https://example.com/".to_owned(),
                },
            ],
            hubs: vec![
                HubRecord {
                    feed_url: "https://example.com/feed".to_owned(),
                    hub_url: "https://hub-a.example.net".to_owned(),
                },
                HubRecord {
                    feed_url: "https://example.com/feed".to_owned(),
                    hub_url: "https://hub-b.example.net".to_owned(),
                },
            ],
            status: DiscoveryStatus::Ok,
            error: None,
        }]
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = std::env::temp_dir().join("feedscout_export_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("feeds.csv");

        let rows = write_csv(&path, &sample_results()).unwrap();
        assert_eq!(rows, 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "site");
        assert_eq!(&headers[5], "hub_urls");

        let records: Vec<csv::StringRecord> =
            reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][1], "https://example.com/feed");
        assert_eq!(&records[0][2], "rss");
        assert_eq!(
            &records[0][5],
            "https://hub-a.example.net; https://hub-b.example.net"
        );
        // Missing title exports as an empty cell
        assert_eq!(&records[1][3], "");
        assert_eq!(&records[1][4], "well-known-path");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_batch_writes_header_only() {
        let dir = std::env::temp_dir().join("feedscout_export_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("feeds.csv");

        let rows = write_csv(&path, &[]).unwrap();
        assert_eq!(rows, 0);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.records().count(), 0);

        std::fs::remove_dir_all(&dir).ok();
    }
}
