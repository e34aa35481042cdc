//! Crawl coordinator - main crawl orchestration logic
//!
//! The coordinator owns a bounded pool of workers. Each worker:
//! - Fetches one request with a fresh identity
//! - Runs the extraction cascade on the page
//! - Admits new agents and queues detail or pagination requests
//! - Hands finished records to the output batcher
//!
//! Workers hold their concurrency permit through the politeness delay, so the
//! delay throttles the aggregate request rate. Failed attempts release the
//! permit before backing off. Requests a worker queues are dispatched to free
//! permits straight away, without waiting for that worker to finish.

use crate::config::{resolve_start_url, validate, Config, CrawlerConfig};
use crate::crawler::fetcher::{FetchFailure, FetchedPage, Fetcher, HttpFetcher};
use crate::crawler::frontier::{Frontier, FrontierLimits, FrontierState};
use crate::crawler::identity::IdentityPool;
use crate::crawler::politeness::Pacing;
use crate::crawler::request::{CrawlRequest, RequestKind};
use crate::extract::{extract_entity_details, extract_listing_entities, next_page_url, parse_document};
use crate::output::{open_sink, write_summary, OutputBatcher, RecordSink, RunSummary};
use crate::record::{EntityRecord, EntityStub, ExtractionMethod};
use crate::TrawlError;
use scraper::Html;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use url::Url;

/// State shared by every worker task
struct WorkerContext {
    frontier: Frontier,
    fetcher: Arc<dyn Fetcher>,
    identities: IdentityPool,
    batcher: Mutex<OutputBatcher>,
    pacing: Pacing,
    max_attempts: u32,
    collect_details: bool,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    context: Arc<WorkerContext>,
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
}

impl Coordinator {
    /// Creates a coordinator from its collaborators
    ///
    /// # Arguments
    ///
    /// * `crawler` - Limits, pacing, and retry settings
    /// * `start_url` - The first listing page
    /// * `fetcher` - Fetch gateway used for every request
    /// * `identities` - Identity pool rotated per attempt
    /// * `sink` - Destination for finished records
    pub fn new(
        crawler: &CrawlerConfig,
        start_url: Url,
        fetcher: Arc<dyn Fetcher>,
        identities: IdentityPool,
        sink: Box<dyn RecordSink>,
    ) -> Self {
        let limits = FrontierLimits {
            max_results: crawler.max_results,
            max_pages: crawler.max_pages,
        };
        let max_concurrency = crawler.max_concurrency.max(1) as usize;

        let context = WorkerContext {
            frontier: Frontier::new(limits, CrawlRequest::listing(start_url, 1)),
            fetcher,
            identities,
            batcher: Mutex::new(OutputBatcher::new(sink, crawler.batch_size)),
            pacing: Pacing::from_config(crawler),
            max_attempts: crawler.max_attempts.max(1),
            collect_details: crawler.collect_agent_details,
        };

        Self {
            context: Arc::new(context),
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        }
    }

    /// Builds the HTTP fetcher, identity pool, and configured sink
    ///
    /// Any error here is a configuration failure: nothing has been fetched yet.
    pub fn from_config(config: &Config) -> Result<Self, TrawlError> {
        validate(config)?;
        let start_url = resolve_start_url(&config.search)?;
        let fetcher = HttpFetcher::new(&config.crawler, &config.identity)?;
        let identities = IdentityPool::new(config.identity.user_agents.clone(), fetcher.proxy_slots());
        let sink = open_sink(&config.output)?;

        tracing::info!("Start URL: {}", start_url);
        Ok(Self::new(
            &config.crawler,
            start_url,
            Arc::new(fetcher),
            identities,
            sink,
        ))
    }

    /// Runs the crawl to completion and reports how it went
    ///
    /// The crawl ends when no request is pending and no worker is in flight.
    /// A sink failure aborts the remaining workers; whatever is still buffered
    /// gets one final flush attempt either way.
    pub async fn run(self) -> RunSummary {
        let limits = self.context.frontier.limits();
        tracing::info!(
            "Starting crawl: up to {} agents over {} listing pages, {} workers, details {}",
            limits.max_results,
            limits.max_pages,
            self.max_concurrency,
            if self.context.collect_details { "on" } else { "off" }
        );

        let start_time = Instant::now();
        let mut tasks: JoinSet<Result<(), TrawlError>> = JoinSet::new();
        let mut fatal: Option<TrawlError> = None;

        loop {
            let permit = tokio::select! {
                biased;

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = settle(joined) {
                        fatal = Some(e);
                        break;
                    }
                    continue;
                }

                permit = Arc::clone(&self.semaphore).acquire_owned() => permit,
            };
            let Ok(permit) = permit else {
                break;
            };

            if let Some(request) = self.context.frontier.next_request() {
                let context = Arc::clone(&self.context);
                tasks.spawn(async move { context.process(request, permit).await });
                continue;
            }

            // Nothing queued and nothing in flight: the crawl is done
            drop(permit);
            if tasks.is_empty() {
                break;
            }

            // Wake on whichever comes first: a worker queueing more work, or
            // a worker finishing
            tokio::select! {
                () = self.context.frontier.pushed() => {}
                Some(joined) = tasks.join_next() => {
                    if let Err(e) = settle(joined) {
                        fatal = Some(e);
                        break;
                    }
                }
            }
        }

        if fatal.is_some() {
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }

        let flushed = self.context.batcher.lock().await.finish().await;
        let state = self.context.frontier.snapshot();

        match (fatal, flushed) {
            (None, Ok(written)) => {
                tracing::info!(
                    "Crawl completed: {} agents written, {} listing pages in {:?}",
                    written,
                    state.current_page(),
                    start_time.elapsed()
                );
                RunSummary::completed(&state)
            }
            (None, Err(e)) => {
                tracing::error!("Final flush failed: {}", e);
                RunSummary::failed(&state, TrawlError::from(e))
            }
            (Some(e), flushed) => {
                if let Err(flush_error) = flushed {
                    tracing::error!("Final flush failed: {}", flush_error);
                }
                tracing::error!("Crawl aborted: {}", e);
                RunSummary::failed(&state, e)
            }
        }
    }
}

/// Maps a finished worker onto the run: sink errors and panics are fatal
fn settle(joined: Result<Result<(), TrawlError>, JoinError>) -> Result<(), TrawlError> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => Ok(()),
        Err(e) => Err(TrawlError::Worker(e.to_string())),
    }
}

impl WorkerContext {
    /// Processes one request while holding a concurrency permit
    async fn process(
        self: Arc<Self>,
        request: CrawlRequest,
        permit: OwnedSemaphorePermit,
    ) -> Result<(), TrawlError> {
        let identity = self.identities.next();
        tracing::debug!(
            "Fetching {} page {} (attempt {}/{})",
            request.label(),
            request.url,
            request.attempt,
            self.max_attempts
        );

        let page = match self.fetcher.fetch(&request.url, &identity).await {
            Ok(page) => page,
            Err(failure) => {
                drop(permit);
                self.retry_or_abandon(request, failure).await;
                return Ok(());
            }
        };

        let records = self.handle_page(&request, &page);
        if !records.is_empty() {
            let mut batcher = self.batcher.lock().await;
            for record in records {
                batcher.push(record.stamped()).await?;
            }
        }

        tokio::time::sleep(self.pacing.politeness_delay()).await;
        drop(permit);
        Ok(())
    }

    async fn retry_or_abandon(&self, request: CrawlRequest, failure: FetchFailure) {
        if failure.retryable && request.attempt < self.max_attempts {
            let backoff = self.pacing.retry_backoff(request.attempt);
            tracing::warn!(
                "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                request.attempt,
                self.max_attempts,
                request.url,
                failure,
                backoff
            );
            tokio::time::sleep(backoff).await;
            self.frontier.push(request.retry());
        } else {
            tracing::warn!(
                "Abandoning {} page {} after {} attempt(s): {}",
                request.label(),
                request.url,
                request.attempt,
                failure
            );
        }
    }

    /// Extraction and frontier updates for a fetched page; never awaits
    fn handle_page(&self, request: &CrawlRequest, page: &FetchedPage) -> Vec<EntityRecord> {
        let document = parse_document(&page.body);
        match &request.kind {
            RequestKind::Listing => self.handle_listing(&document, request, &page.url),
            RequestKind::Detail(seed) => self
                .handle_detail(&document, request, seed)
                .into_iter()
                .collect(),
        }
    }

    fn handle_listing(&self, document: &Html, request: &CrawlRequest, page_url: &Url) -> Vec<EntityRecord> {
        let extraction = extract_listing_entities(document, page_url);
        if let Some(reason) = extraction.reason() {
            tracing::warn!("Listing page {} yielded no agents: {}", request.page_index, reason);
        }

        let found = extraction.value().len();
        let admitted = self.frontier.admit_stubs(extraction.into_value());
        tracing::info!(
            "Listing page {}: {} agents found, {} admitted",
            request.page_index,
            found,
            admitted.len()
        );

        let max_results = self.frontier.limits().max_results;
        let mut records = Vec::new();
        for stub in admitted {
            if self.collect_details {
                match Url::parse(&stub.url) {
                    Ok(url) => self
                        .frontier
                        .push(CrawlRequest::detail(url, stub, request.page_index)),
                    Err(e) => tracing::warn!("Skipping profile of {}: {}", stub.name, e),
                }
            } else if let Some(position) = self.frontier.try_record_scraped() {
                tracing::info!("Agent {}/{}: {}", position, max_results, stub.name);
                records.push(EntityRecord::from_stub(stub, ExtractionMethod::BasicCard));
            }
        }

        self.queue_next_page(document, request);
        records
    }

    fn queue_next_page(&self, document: &Html, request: &CrawlRequest) {
        if !self.frontier.can_paginate() {
            tracing::debug!("Pagination stopped after page {}", request.page_index);
            return;
        }

        let next = match next_page_url(document, &request.url) {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!("No next page after {}: {}", request.url, e);
                return;
            }
        };

        if let Some(page_index) = self.frontier.try_advance_page() {
            tracing::debug!("Queueing listing page {}: {}", page_index, next);
            self.frontier.push(CrawlRequest::listing(next, page_index));
        }
    }

    fn handle_detail(&self, document: &Html, request: &CrawlRequest, seed: &EntityStub) -> Option<EntityRecord> {
        let extraction = extract_entity_details(document, seed);
        if let Some(reason) = extraction.reason() {
            tracing::warn!("Profile {} kept card data only: {}", request.url, reason);
        }
        let record = extraction.into_value().merged_over(seed);

        let Some(position) = self.frontier.try_record_scraped() else {
            tracing::debug!("Result quota reached, dropping {}", record.info.name);
            return None;
        };
        tracing::info!(
            "Agent {}/{}: {} ({})",
            position,
            self.frontier.limits().max_results,
            record.info.name,
            record.extraction_method
        );
        Some(record)
    }
}

/// Runs the main crawl operation
///
/// This function orchestrates the entire run:
///
/// 1. Validate the configuration and resolve the start URL
/// 2. Build the HTTP fetcher and identity pool
/// 3. Open the configured dataset sink
/// 4. Crawl listing and profile pages until the frontier drains
/// 5. Write the run summary, also when setup failed
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run finished, successfully or not; see its status
/// * `Err(TrawlError)` - The summary itself could not be written
///
/// # Example
///
/// ```no_run
/// use agent_trawl::config::load_config;
/// use agent_trawl::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("agent-trawl.toml"))?;
/// let summary = run_crawl(config).await?;
/// println!("{} agents scraped", summary.agents_scraped);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<RunSummary, TrawlError> {
    let summary = match Coordinator::from_config(&config) {
        Ok(coordinator) => coordinator.run().await,
        Err(e) => {
            tracing::error!("Crawl setup failed: {}", e);
            RunSummary::failed(&FrontierState::default(), e)
        }
    };

    write_summary(Path::new(&config.output.summary_path), &summary)?;
    Ok(summary)
}
