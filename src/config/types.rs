use crate::record::BranchType;
use serde::Deserialize;

/// Main configuration structure for Agent-Trawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    pub output: OutputConfig,
}

/// What to search for; resolved into a single start URL before crawling
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Free-text location, mapped onto a known region when possible
    #[serde(rename = "search-location")]
    pub search_location: Option<String>,

    /// Directory location identifier (e.g. "REGION^87490"); wins over search-location
    #[serde(rename = "location-identifier")]
    pub location_identifier: Option<String>,

    /// Search radius in miles, as the directory expects it ("0.0", "5.0", ...)
    #[serde(default = "default_radius")]
    pub radius: String,

    #[serde(rename = "brand-name")]
    pub brand_name: Option<String>,

    #[serde(rename = "branch-type", default)]
    pub branch_type: BranchType,

    /// Explicit start URL; bypasses every other search field
    #[serde(rename = "start-url")]
    pub start_url: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_location: None,
            location_identifier: None,
            radius: default_radius(),
            brand_name: None,
            branch_type: BranchType::All,
            start_url: None,
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Visit each agent's profile page for richer data
    #[serde(rename = "collect-agent-details", default = "default_true")]
    pub collect_agent_details: bool,

    /// Maximum number of agents admitted and emitted
    #[serde(rename = "max-results", default = "default_max_results")]
    pub max_results: u32,

    /// Maximum number of listing pages to walk
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Number of requests processed in parallel
    #[serde(rename = "max-concurrency", default = "default_max_concurrency")]
    pub max_concurrency: u32,

    /// Base politeness delay after each processed page (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Upper bound of the random jitter added to the delay (milliseconds)
    #[serde(rename = "request-jitter-ms", default = "default_request_jitter_ms")]
    pub request_jitter_ms: u64,

    /// Total attempts per request before it is abandoned
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First retry backoff; doubles on each further attempt (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of records buffered before a batch is pushed to the sink
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            collect_agent_details: true,
            max_results: default_max_results(),
            max_pages: default_max_pages(),
            max_concurrency: default_max_concurrency(),
            request_delay_ms: default_request_delay_ms(),
            request_jitter_ms: default_request_jitter_ms(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            batch_size: default_batch_size(),
        }
    }
}

/// Client identities rotated between attempts
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    #[serde(rename = "user-agents", default = "default_user_agents")]
    pub user_agents: Vec<String>,

    /// Proxy URLs; empty means direct connections
    #[serde(default)]
    pub proxies: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_agents: default_user_agents(),
            proxies: Vec::new(),
        }
    }
}

/// Where finished records go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Jsonl,
    /// An `agents` table in a SQLite database
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Path to the dataset file (JSON lines or SQLite database)
    #[serde(rename = "dataset-path")]
    pub dataset_path: String,

    /// Path to the JSON run summary
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

fn default_true() -> bool {
    true
}

fn default_radius() -> String {
    "0.0".to_string()
}

fn default_max_results() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    5
}

fn default_max_concurrency() -> u32 {
    5
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_request_jitter_ms() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_batch_size() -> usize {
    15
}

pub(crate) fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:123.0) Gecko/20100101 Firefox/123.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    ]
    .iter()
    .map(|ua| ua.to_string())
    .collect()
}
