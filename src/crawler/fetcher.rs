//! HTTP fetch gateway
//!
//! This module handles all page retrieval for the crawler, including:
//! - Building one HTTP client per proxy (or one direct client)
//! - Presenting a browser-like identity on every request
//! - Classifying transport and HTTP failures for the retry path

use crate::config::{CrawlerConfig, IdentityConfig};
use crate::crawler::identity::Identity;
use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, DNT, PRAGMA, UPGRADE_INSECURE_REQUESTS,
    USER_AGENT,
};
use reqwest::{Client, Proxy};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,

    pub status: u16,
    pub body: String,
}

/// Why a fetch attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Connection,
    Http(u16),
    Protocol,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::Connection => f.write_str("connection error"),
            Self::Http(status) => write!(f, "HTTP {}", status),
            Self::Protocol => f.write_str("protocol error"),
        }
    }
}

/// A failed fetch attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub retryable: bool,
    pub message: String,
}

impl FetchFailure {
    /// Every transport failure is worth another attempt with a new identity
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            retryable: true,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, message)
    }

    pub fn http(status: u16) -> Self {
        Self::new(FailureKind::Http(status), format!("server answered {}", status))
    }
}

impl From<reqwest::Error> for FetchFailure {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            FailureKind::Timeout
        } else if e.is_connect() {
            FailureKind::Connection
        } else if let Some(status) = e.status() {
            FailureKind::Http(status.as_u16())
        } else {
            FailureKind::Protocol
        };
        Self::new(kind, e.to_string())
    }
}

/// Retrieves pages for the crawler
///
/// The coordinator only depends on this trait, so tests can substitute a
/// scripted fetcher for the network.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url, identity: &Identity) -> Result<FetchedPage, FetchFailure>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `timeout` - Whole-request deadline; exceeding it is a retryable timeout
/// * `proxy` - Optional proxy URL every request is routed through
///
/// # Example
///
/// ```
/// use agent_trawl::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(Duration::from_secs(60), None);
/// assert!(client.is_ok());
/// ```
pub fn build_http_client(timeout: Duration, proxy: Option<&str>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .default_headers(browser_headers())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        builder = builder.proxy(Proxy::all(proxy)?);
    }

    builder.build()
}

/// Navigation headers a desktop browser sends with a top-level page load
///
/// Accept-Encoding is left to reqwest, which only decompresses bodies when it
/// set that header itself.
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,\
             image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB,en-US;q=0.9,en;q=0.8"));
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(
        "sec-ch-ua",
        HeaderValue::from_static(r#""Chromium";v="124", "Not;A=Brand";v="8""#),
    );
    headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
    headers.insert("sec-ch-ua-platform", HeaderValue::from_static(r#""Windows""#));
    headers
}

/// Fetch gateway backed by `reqwest`
pub struct HttpFetcher {
    /// One client per proxy, or a single direct client
    clients: Vec<Client>,
}

impl HttpFetcher {
    pub fn new(crawler: &CrawlerConfig, identity: &IdentityConfig) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(crawler.request_timeout_secs);
        let clients = if identity.proxies.is_empty() {
            vec![build_http_client(timeout, None)?]
        } else {
            identity
                .proxies
                .iter()
                .map(|proxy| build_http_client(timeout, Some(proxy)))
                .collect::<Result<Vec<_>, _>>()?
        };

        tracing::debug!("Built {} HTTP client(s)", clients.len());
        Ok(Self { clients })
    }

    pub fn proxy_slots(&self) -> usize {
        self.clients.len()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, identity: &Identity) -> Result<FetchedPage, FetchFailure> {
        let client = self
            .clients
            .get(identity.proxy_slot % self.clients.len().max(1))
            .ok_or_else(|| FetchFailure::new(FailureKind::Protocol, "no HTTP client available"))?;

        let response = client
            .get(url.clone())
            .header(USER_AGENT, identity.user_agent.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::http(status.as_u16()));
        }

        let final_url = response.url().clone();
        let body = response.text().await?;

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(Duration::from_secs(5), None).is_ok());
    }

    #[test]
    fn test_build_http_client_with_proxy() {
        assert!(build_http_client(Duration::from_secs(5), Some("http://127.0.0.1:8080")).is_ok());
    }

    #[test]
    fn test_one_client_per_proxy() {
        let identity = IdentityConfig {
            user_agents: vec!["ua".to_string()],
            proxies: vec![
                "http://127.0.0.1:8080".to_string(),
                "http://127.0.0.1:8081".to_string(),
            ],
        };
        let fetcher = HttpFetcher::new(&CrawlerConfig::default(), &identity).unwrap();
        assert_eq!(fetcher.proxy_slots(), 2);
    }

    #[test]
    fn test_browser_headers_cover_navigation_set() {
        let headers = browser_headers();
        assert_eq!(headers.len(), 13);
        assert_eq!(headers[DNT], "1");
        assert_eq!(headers["sec-fetch-user"], "?1");
        assert_eq!(headers[CACHE_CONTROL], "max-age=0");
        assert_eq!(headers[PRAGMA], "no-cache");
        assert_eq!(headers["sec-ch-ua-mobile"], "?0");
        assert_eq!(headers["sec-ch-ua-platform"], "\"Windows\"");
        assert!(headers["sec-ch-ua"].to_str().unwrap().contains("Chromium"));
        assert!(!headers.contains_key(reqwest::header::ACCEPT_ENCODING));
    }

    #[test]
    fn test_failure_display() {
        let failure = FetchFailure::http(503);
        assert!(failure.retryable);
        assert_eq!(failure.to_string(), "HTTP 503: server answered 503");
        assert_eq!(FetchFailure::timeout("slow").to_string(), "timeout: slow");
    }

    // Live request behavior is covered with wiremock in the integration tests
}
