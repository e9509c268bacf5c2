use crate::config::Config;
use futures::StreamExt;
use rand::Rng;
use std::error::Error as _;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// First backoff delay; doubles per retry (500ms, 1s, 2s, ...).
const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Network-level failure after retries are exhausted.
///
/// HTTP responses, including 4xx and 5xx, are never errors here; any
/// response the server produced comes back as a [`FetchResponse`]. These
/// variants mean no usable response arrived at all.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("connection refused")]
    ConnectionRefused,
    #[error("DNS lookup failed")]
    DnsFailure,
    #[error("too many redirects")]
    TooManyRedirects,
    #[error("network error: {0}")]
    Network(String),
}

impl FetchError {
    /// True when the failure suggests the host itself cannot be reached,
    /// as opposed to a reachable server misbehaving. Drives the
    /// site-unreachable verdict in the orchestrator.
    pub fn is_unreachable(&self) -> bool {
        !matches!(self, FetchError::TooManyRedirects)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
}

/// A completed HTTP exchange.
#[derive(Debug)]
pub struct FetchResponse {
    pub status: u16,
    /// Lowercased Content-Type header, when present.
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    /// The body exceeded the configured cap and was cut off.
    pub truncated: bool,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client with the fetch discipline the probing strategies rely on:
/// per-attempt timeout, retry with jittered exponential backoff on network
/// failures and 5xx (never 4xx), a configured User-Agent on every request,
/// and size-capped body reads. Stateless per call; cheap to clone.
#[derive(Clone)]
pub struct FetchClient {
    client: reqwest::Client,
    timeout: Duration,
    max_retries: u32,
    max_body_bytes: usize,
}

impl FetchClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .connect_timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            timeout: config.request_timeout(),
            max_retries: config.max_retries,
            max_body_bytes: config.max_body_bytes,
        })
    }

    pub async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        self.fetch(url, Method::Get).await
    }

    pub async fn head(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        self.fetch(url, Method::Head).await
    }

    /// Issues a request, retrying per policy until a response or exhausted
    /// retries. 5xx responses are retried; the final one is returned as a
    /// response rather than an error. 4xx responses return immediately:
    /// a definitive not-found/forbidden is not worth retrying.
    pub async fn fetch(&self, url: &Url, method: Method) -> Result<FetchResponse, FetchError> {
        let mut attempt: u32 = 0;

        loop {
            match self.try_once(url, method).await {
                Ok(response) => {
                    if response.status >= 500 && attempt < self.max_retries {
                        tracing::debug!(
                            url = %url,
                            status = response.status,
                            attempt = attempt,
                            "server error, backing off"
                        );
                        backoff(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    return Ok(response);
                }
                Err(err) => {
                    if attempt < self.max_retries {
                        tracing::debug!(
                            url = %url,
                            error = %err,
                            attempt = attempt,
                            "network failure, backing off"
                        );
                        backoff(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }

    async fn try_once(&self, url: &Url, method: Method) -> Result<FetchResponse, FetchError> {
        let request = match method {
            Method::Get => self.client.get(url.clone()),
            Method::Head => self.client.head(url.clone()),
        };

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(classify)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase());

        let (body, truncated) = tokio::time::timeout(self.timeout, self.read_capped(response))
            .await
            .map_err(|_| FetchError::Timeout)??;

        if truncated {
            tracing::debug!(url = %url, cap = self.max_body_bytes, "response body truncated");
        }

        Ok(FetchResponse {
            status,
            content_type,
            body,
            truncated,
        })
    }

    /// Streams the body up to the cap. Oversized bodies are truncated and
    /// flagged, not fatal; a giant page can still carry feed links in its
    /// head.
    async fn read_capped(&self, response: reqwest::Response) -> Result<(Vec<u8>, bool), FetchError> {
        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(classify)?;
            if bytes.len().saturating_add(chunk.len()) > self.max_body_bytes {
                let room = self.max_body_bytes - bytes.len();
                bytes.extend_from_slice(&chunk[..room]);
                return Ok((bytes, true));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok((bytes, false))
    }
}

async fn backoff(attempt: u32) {
    let base = BACKOFF_BASE * 2u32.saturating_pow(attempt);
    // Jitter up to +50% so a batch of failing candidates doesn't hammer a
    // recovering server in lockstep.
    let jitter = base.mul_f64(rand::thread_rng().gen_range(0.0..0.5));
    tokio::time::sleep(base + jitter).await;
}

/// Maps a reqwest error onto the fetch taxonomy.
fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout;
    }
    if err.is_redirect() {
        return FetchError::TooManyRedirects;
    }

    // Walk the cause chain: io::Error kinds are the reliable signal,
    // resolver errors only show up in message text.
    let mut refused = false;
    let mut text = err.to_string().to_ascii_lowercase();
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                refused = true;
            }
        }
        text.push_str(": ");
        text.push_str(&cause.to_string().to_ascii_lowercase());
        source = cause.source();
    }

    if refused {
        return FetchError::ConnectionRefused;
    }
    if text.contains("dns") || text.contains("resolve") || text.contains("lookup") {
        return FetchError::DnsFailure;
    }
    if err.is_connect() {
        return FetchError::ConnectionRefused;
    }
    FetchError::Network(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(max_retries: u32, max_body_bytes: usize) -> FetchClient {
        let config = Config {
            request_timeout_secs: 5,
            max_retries,
            max_body_bytes,
            ..Config::default()
        };
        FetchClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_success_carries_status_and_content_type() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("hello", "Text/HTML; charset=utf-8"),
            )
            .mount(&mock_server)
            .await;

        let client = test_client(3, 1024);
        let url = Url::parse(&format!("{}/page", mock_server.uri())).unwrap();
        let response = client.get(&url).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(
            response.content_type.as_deref(),
            Some("text/html; charset=utf-8")
        );
        assert_eq!(response.body, b"hello");
        assert!(!response.truncated);
    }

    #[tokio::test]
    async fn test_404_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1) // exactly one request: 4xx is definitive
            .mount(&mock_server)
            .await;

        let client = test_client(3, 1024);
        let url = Url::parse(&format!("{}/missing", mock_server.uri())).unwrap();
        let response = client.get(&url).await.unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_503_retried_until_success() {
        let mock_server = MockServer::start().await;

        // First two requests return 503, third succeeds
        Mock::given(path("/feed"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&mock_server)
            .await;
        Mock::given(path("/feed"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let client = test_client(3, 1024);
        let url = Url::parse(&format!("{}/feed", mock_server.uri())).unwrap();
        let response = client.get(&url).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"ok");
    }

    #[tokio::test]
    async fn test_500_exhausts_retries_and_returns_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2) // initial attempt + 1 retry
            .mount(&mock_server)
            .await;

        let client = test_client(1, 1024);
        let url = Url::parse(&format!("{}/feed", mock_server.uri())).unwrap();
        let response = client.get(&url).await.unwrap();
        assert_eq!(response.status, 500);
    }

    #[tokio::test]
    async fn test_oversized_body_truncated_not_fatal() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(100)))
            .mount(&mock_server)
            .await;

        let client = test_client(0, 16);
        let url = Url::parse(&format!("{}/big", mock_server.uri())).unwrap();
        let response = client.get(&url).await.unwrap();
        assert!(response.truncated);
        assert_eq!(response.body.len(), 16);
    }

    #[tokio::test]
    async fn test_head_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = test_client(0, 1024);
        let url = Url::parse(&format!("{}/page", mock_server.uri())).unwrap();
        let response = client.head(&url).await.unwrap();
        assert_eq!(response.status, 200);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused_classified() {
        // Port 1 is never listening
        let client = test_client(0, 1024);
        let url = Url::parse("http://127.0.0.1:1/feed").unwrap();
        let err = client.get(&url).await.unwrap_err();
        assert!(err.is_unreachable());
        assert!(matches!(
            err,
            FetchError::ConnectionRefused | FetchError::Network(_)
        ));
    }
}
