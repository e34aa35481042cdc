//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock directory servers and test
//! the full crawl cycle end-to-end, from the first listing page to the
//! dataset and summary files.

use agent_trawl::config::{parse_config, Config, CrawlerConfig, IdentityConfig};
use agent_trawl::crawler::{run_crawl, FailureKind, Fetcher, HttpFetcher, Identity};
use agent_trawl::output::{RunStatus, RunSummary};
use agent_trawl::{EntityRecord, ExtractionMethod};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Paths {
    _dir: TempDir,
    dataset: PathBuf,
    summary: PathBuf,
}

fn temp_paths(dataset_name: &str) -> Paths {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let dataset = dir.path().join(dataset_name);
    let summary = dir.path().join("summary.json");
    Paths {
        _dir: dir,
        dataset,
        summary,
    }
}

/// Creates a test configuration pointed at the mock server
fn create_test_config(server: &MockServer, paths: &Paths, crawler: &str, format: &str) -> Config {
    parse_config(&format!(
        r#"
[search]
start-url = "{uri}/estate-agents/find.html?locationIdentifier=REGION%5E904"

[crawler]
max-concurrency = 3
request-delay-ms = 0
request-jitter-ms = 0
retry-backoff-ms = 1
request-timeout-secs = 5
batch-size = 4
{crawler}

[identity]
user-agents = ["TestAgent/1.0"]

[output]
format = "{format}"
dataset-path = "{dataset}"
summary-path = "{summary}"
"#,
        uri = server.uri(),
        crawler = crawler,
        format = format,
        dataset = paths.dataset.display(),
        summary = paths.summary.display(),
    ))
    .expect("Test config should be valid")
}

fn listing_page(ids: impl IntoIterator<Item = u32>) -> String {
    let cards: String = ids
        .into_iter()
        .map(|id| {
            format!(
                r#"<div class="agentCard_agentCard__card">
                    <img src="/logos/{id}.png">
                    <a class="ksc_link" href="/estate-agents/agent/{id}/agent-{id}.html">Agent {id}</a>
                    <p>Tel: 0113 496 {id:04}</p>
                    <span>LETTINGS</span>
                </div>"#
            )
        })
        .collect();
    format!("<html><body><main>{}</main></body></html>", cards)
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn read_records(paths: &Paths) -> Vec<EntityRecord> {
    std::fs::read_to_string(&paths.dataset)
        .expect("Dataset should exist")
        .lines()
        .map(|line| serde_json::from_str(line).expect("Each line should be a record"))
        .collect()
}

fn read_summary(paths: &Paths) -> RunSummary {
    let content = std::fs::read_to_string(&paths.summary).expect("Summary should exist");
    serde_json::from_str(&content).expect("Summary should be valid JSON")
}

#[tokio::test]
async fn test_full_crawl_with_details() {
    let mock_server = MockServer::start().await;
    let paths = temp_paths("agents.jsonl");

    Mock::given(method("GET"))
        .and(path("/estate-agents/find.html"))
        .respond_with(html(listing_page(1..=12)))
        .mount(&mock_server)
        .await;

    // Agent 1 publishes structured data
    Mock::given(method("GET"))
        .and(path("/estate-agents/agent/1/agent-1.html"))
        .respond_with(html(
            r#"<html><head><script type="application/ld+json">
                {"@context":"https://schema.org","@type":"RealEstateAgent",
                 "name":"Acme Lettings","telephone":"0123 456789","email":"hello@acme.test"}
            </script></head><body><div class="phone">0999 999999</div></body></html>"#
                .to_string(),
        ))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    // Everyone else only has markup
    Mock::given(method("GET"))
        .and(path_regex(r"^/estate-agents/agent/\d+/"))
        .respond_with(html(
            r#"<html><body>
                <a href="mailto:office@agents.test"></a>
                <p>We have 8 properties to let and offer sales and mortgages.</p>
            </body></html>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, &paths, "max-results = 10\nmax-pages = 3", "jsonl");
    let summary = run_crawl(config).await.expect("Crawl should finish");

    assert_eq!(summary.status, RunStatus::Success);
    assert_eq!(summary.agents_scraped, 10);
    assert_eq!(summary.unique_agents, 10);
    assert_eq!(summary.pages_processed, 1);
    assert_eq!(read_summary(&paths), summary);

    let records = read_records(&paths);
    assert_eq!(records.len(), 10);

    let urls: HashSet<&str> = records.iter().map(|r| r.info.url.as_str()).collect();
    assert_eq!(urls.len(), 10);
    assert!(!urls.iter().any(|url| url.contains("/agent/11/") || url.contains("/agent/12/")));

    let acme = records
        .iter()
        .find(|r| r.info.url.contains("/agent/1/"))
        .expect("Agent 1 should be emitted");
    assert_eq!(acme.extraction_method, ExtractionMethod::StructuredData);
    assert_eq!(acme.info.name, "Acme Lettings");
    assert_eq!(acme.info.phone.as_deref(), Some("0123 456789"));
    assert_eq!(acme.email.as_deref(), Some("hello@acme.test"));

    let other = records
        .iter()
        .find(|r| r.info.url.contains("/agent/2/"))
        .expect("Agent 2 should be emitted");
    assert_eq!(other.extraction_method, ExtractionMethod::MarkupFallback);
    assert_eq!(other.info.name, "Agent 2");
    assert_eq!(other.info.phone.as_deref(), Some("0113 496 0002"));
    assert_eq!(other.email.as_deref(), Some("office@agents.test"));
    assert_eq!(other.properties_to_let, Some(8));
    assert_eq!(
        other.services_offered,
        Some(vec!["Sales".to_string(), "Mortgages".to_string()])
    );
    assert!(other.info.logo.as_deref().unwrap().ends_with("/logos/2.png"));
    assert!(other.scraped_at.is_some());
}

#[tokio::test]
async fn test_basic_cards_follow_offset_pagination() {
    let mock_server = MockServer::start().await;
    let paths = temp_paths("agents.jsonl");

    Mock::given(method("GET"))
        .and(path("/estate-agents/find.html"))
        .and(query_param("index", "10"))
        .respond_with(html(listing_page(6..=10)))
        .with_priority(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/estate-agents/find.html"))
        .respond_with(html(listing_page(1..=5)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/estate-agents/agent/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        &mock_server,
        &paths,
        "max-results = 50\nmax-pages = 2\ncollect-agent-details = false",
        "jsonl",
    );
    let summary = run_crawl(config).await.expect("Crawl should finish");

    assert_eq!(summary.pages_processed, 2);
    assert_eq!(summary.agents_scraped, 10);

    let records = read_records(&paths);
    assert_eq!(records.len(), 10);
    assert!(records
        .iter()
        .all(|r| r.extraction_method == ExtractionMethod::BasicCard));
    assert!(records.iter().all(|r| r.email.is_none()));
}

#[tokio::test]
async fn test_failing_profile_is_abandoned() {
    let mock_server = MockServer::start().await;
    let paths = temp_paths("agents.jsonl");

    Mock::given(method("GET"))
        .and(path("/estate-agents/find.html"))
        .respond_with(html(listing_page(1..=3)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/estate-agents/agent/2/agent-2.html"))
        .respond_with(ResponseTemplate::new(503))
        .with_priority(1)
        .expect(5)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/estate-agents/agent/\d+/"))
        .respond_with(html("<html><body><p>Friendly local agents.</p></body></html>".to_string()))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, &paths, "max-results = 10\nmax-pages = 1", "jsonl");
    let summary = run_crawl(config).await.expect("Crawl should finish");

    assert!(summary.is_success());
    assert_eq!(summary.unique_agents, 3);
    assert_eq!(summary.agents_scraped, 2);

    let records = read_records(&paths);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| !r.info.url.contains("/agent/2/")));
}

#[tokio::test]
async fn test_sqlite_dataset() {
    let mock_server = MockServer::start().await;
    let paths = temp_paths("agents.db");

    Mock::given(method("GET"))
        .and(path("/estate-agents/find.html"))
        .respond_with(html(listing_page(1..=6)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        &mock_server,
        &paths,
        "max-results = 6\nmax-pages = 1\ncollect-agent-details = false",
        "sqlite",
    );
    let summary = run_crawl(config).await.expect("Crawl should finish");
    assert_eq!(summary.agents_scraped, 6);

    let conn = rusqlite::Connection::open(&paths.dataset).expect("Database should exist");
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM agents", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 6);

    let branch: String = conn
        .query_row(
            "SELECT branch_type FROM agents WHERE agent_id = '4'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(branch, "LETTINGS");
}

#[tokio::test]
async fn test_invalid_start_url_fails_with_summary() {
    let mock_server = MockServer::start().await;
    let paths = temp_paths("agents.jsonl");

    let mut config = create_test_config(&mock_server, &paths, "", "jsonl");
    config.search.start_url = Some("ftp://example.com/agents".to_string());

    let summary = run_crawl(config).await.expect("Summary should be written");
    assert_eq!(summary.status, RunStatus::Error);
    assert!(summary.error.as_deref().unwrap().contains("start_url"));
    assert_eq!(read_summary(&paths).status, RunStatus::Error);
}

fn test_identity() -> Identity {
    Identity {
        user_agent: "TestAgent/1.0".to_string(),
        proxy_slot: 0,
    }
}

fn fetcher_with_timeout(secs: u64) -> HttpFetcher {
    let crawler = CrawlerConfig {
        request_timeout_secs: secs,
        ..CrawlerConfig::default()
    };
    let identity = IdentityConfig {
        user_agents: vec!["TestAgent/1.0".to_string()],
        proxies: Vec::new(),
    };
    HttpFetcher::new(&crawler, &identity).expect("Client should build")
}

#[tokio::test]
async fn test_fetcher_sends_identity_and_navigation_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", "TestAgent/1.0"))
        .and(header("dnt", "1"))
        .and(header("sec-fetch-user", "?1"))
        .and(header("pragma", "no-cache"))
        .and(header("sec-ch-ua-mobile", "?0"))
        .respond_with(html("<p>hello</p>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = url::Url::parse(&format!("{}/page", mock_server.uri())).unwrap();
    let page = fetcher_with_timeout(5)
        .fetch(&url, &test_identity())
        .await
        .expect("Fetch should succeed");

    assert_eq!(page.status, 200);
    assert_eq!(page.body, "<p>hello</p>");
}

#[tokio::test]
async fn test_fetcher_classifies_failures() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher_with_timeout(1);

    let missing = url::Url::parse(&format!("{}/missing", mock_server.uri())).unwrap();
    let failure = fetcher.fetch(&missing, &test_identity()).await.unwrap_err();
    assert_eq!(failure.kind, FailureKind::Http(404));

    let slow = url::Url::parse(&format!("{}/slow", mock_server.uri())).unwrap();
    let failure = fetcher.fetch(&slow, &test_identity()).await.unwrap_err();
    assert_eq!(failure.kind, FailureKind::Timeout);
    assert!(failure.retryable);
}
