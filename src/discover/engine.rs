use crate::config::Config;
use crate::discover::client::FetchClient;
use crate::discover::types::{
    DiscoveryResult, DiscoveryStatus, FeedRecord, HubRecord, SiteTarget,
};
use crate::discover::{extract, hub, probe, validate};
use crate::util::normalize;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::time::Duration;

/// Composes the discovery strategies for one or many sites.
///
/// Owns the fetch client for the duration of a run; per-site state lives
/// entirely inside each `discover` call, so a single engine can drive many
/// sites concurrently.
pub struct DiscoveryEngine {
    client: FetchClient,
    concurrency: usize,
    max_concurrent_sites: usize,
    site_deadline: Duration,
}

impl DiscoveryEngine {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: FetchClient::new(config)?,
            concurrency: config.concurrency.max(1),
            max_concurrent_sites: config.max_concurrent_sites.max(1),
            site_deadline: config.site_deadline(),
        })
    }

    /// Discovers feeds for every site with bounded cross-site concurrency.
    ///
    /// Results arrive in completion order, one per input site no matter
    /// what happened to it; each is attributable through its `site` field.
    pub async fn discover_all(&self, sites: Vec<SiteTarget>) -> Vec<DiscoveryResult> {
        let total = sites.len();
        let mut done = 0usize;

        stream::iter(sites)
            .map(|site| async move { self.discover(&site).await })
            .buffer_unordered(self.max_concurrent_sites)
            .inspect(|result| {
                done += 1;
                tracing::info!(
                    site = %result.site,
                    status = %result.status,
                    feeds = result.feeds.len(),
                    hubs = result.hubs.len(),
                    completed = done,
                    total = total,
                    "site finished"
                );
            })
            .collect()
            .await
    }

    /// Runs multi-strategy discovery for a single site.
    ///
    /// Candidate generation: HTML-declared links first (a feed the site
    /// declares beats a path guess in the dedup tie-break), then the
    /// well-known-path probe list. All candidates validate concurrently
    /// under the per-site deadline; individual failures are absorbed, and
    /// only total unreachability turns into a `Failed` status.
    pub async fn discover(&self, site: &SiteTarget) -> DiscoveryResult {
        // Root page fetch feeds the HTML-link strategy and CMS sniffing.
        // Failing to get it is non-fatal: the probe list still runs.
        let root_fetch = self.client.get(site.url()).await;
        let (root_html, root_error) = match &root_fetch {
            Ok(response) if response.is_success() => (
                Some(String::from_utf8_lossy(&response.body).into_owned()),
                None,
            ),
            Ok(response) => {
                tracing::debug!(site = %site, status = response.status, "root page not usable");
                (None, None)
            }
            Err(err) => {
                tracing::debug!(site = %site, error = %err, "root page fetch failed");
                (None, Some(err))
            }
        };

        let mut candidates = Vec::new();
        if let Some(html) = &root_html {
            candidates.extend(extract::extract(site.url(), html));
        }
        candidates.extend(probe::probe(site, root_html.as_deref()));

        // One fetch per distinct URL: dedup on the normalized form before
        // validation, keeping the first-discovered strategy tag.
        let mut seen = HashSet::new();
        candidates.retain(|c| seen.insert(normalize(&c.url)));

        tracing::debug!(site = %site, candidates = candidates.len(), "validating candidates");

        let mut feeds: Vec<FeedRecord> = Vec::new();
        let mut hubs: Vec<HubRecord> = Vec::new();
        let mut seen_feeds: HashSet<String> = HashSet::new();
        let mut attempts = 0usize;
        let mut unreachable = 0usize;
        let mut deadline_hit = false;

        {
            let client = &self.client;
            let mut validations = stream::iter(candidates)
                .map(|candidate| async move {
                    let outcome = validate::validate(client, site, &candidate).await;
                    (candidate, outcome)
                })
                .buffer_unordered(self.concurrency);

            let deadline = tokio::time::sleep(self.site_deadline);
            tokio::pin!(deadline);

            loop {
                tokio::select! {
                    _ = &mut deadline => {
                        deadline_hit = true;
                        tracing::warn!(site = %site, "site deadline reached, abandoning in-flight candidates");
                        break;
                    }
                    next = validations.next() => {
                        let Some((candidate, outcome)) = next else { break };
                        attempts += 1;
                        match outcome {
                            Ok(Some(validated)) => {
                                // Redirects can land two candidates on one
                                // feed; keep the set unique post-validation too.
                                if seen_feeds.insert(validated.record.url.clone()) {
                                    hubs.extend(hub::extract_hubs(&validated.record, &validated.body));
                                    feeds.push(validated.record);
                                }
                            }
                            Ok(None) => {}
                            Err(err) => {
                                if err.is_unreachable() {
                                    unreachable += 1;
                                }
                                tracing::debug!(url = %candidate.url, error = %err, "candidate fetch failed");
                            }
                        }
                    }
                }
            }
        }

        // Failed means the site never answered: root fetch and every probe
        // died at the network level with nothing validated. A reachable
        // site with zero feeds, or a deadline cut, is Partial.
        let root_unreachable = root_error.map(|e| e.is_unreachable()).unwrap_or(false);
        let site_unreachable = root_unreachable
            && !deadline_hit
            && attempts > 0
            && unreachable == attempts
            && feeds.is_empty();

        let (status, error) = if site_unreachable {
            let cause = root_error.map(|e| format!("site unreachable: {e}"));
            (DiscoveryStatus::Failed, cause)
        } else if deadline_hit {
            (
                DiscoveryStatus::Partial,
                Some("site deadline reached before all candidates were validated".to_owned()),
            )
        } else if feeds.is_empty() {
            (DiscoveryStatus::Partial, None)
        } else {
            (DiscoveryStatus::Ok, None)
        };

        DiscoveryResult {
            site: site.as_str().to_owned(),
            feeds,
            hubs,
            status,
            error,
        }
    }
}
