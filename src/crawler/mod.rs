//! Crawler module for listing and profile page processing
//!
//! This module contains the core crawling logic, including:
//! - The crawl frontier with its dedup set and counters
//! - HTTP fetching behind the [`Fetcher`] trait, with identity rotation
//! - Politeness delays and retry backoff
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod identity;
mod politeness;
mod request;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, FailureKind, FetchFailure, FetchedPage, Fetcher, HttpFetcher};
pub use frontier::{entity_key, Admission, Frontier, FrontierLimits, FrontierState};
pub use identity::{Identity, IdentityPool};
pub use politeness::{politeness_delay, retry_backoff, Pacing, MAX_BACKOFF};
pub use request::{CrawlRequest, RequestKind};
