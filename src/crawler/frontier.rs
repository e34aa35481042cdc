//! Shared crawl state: pending requests, the dedup set, and the counters
//!
//! Every operation that reads and then updates the counters runs inside one
//! critical section, so concurrent workers can never push the crawl past its
//! result or page limits.

use crate::crawler::request::{CrawlRequest, RequestKind};
use crate::record::EntityStub;
use crate::url::normalize_url;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Bounds a crawl must stay within
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierLimits {
    pub max_results: u32,
    pub max_pages: u32,
}

/// Outcome of offering one entity URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// The URL was admitted earlier
    Duplicate,
    /// `max_results` entities are already queued
    QuotaFull,
    /// The URL cannot serve as a dedup key
    Invalid,
}

/// Counters and the dedup set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontierState {
    visited_entity_urls: HashSet<String>,
    queued_count: u32,
    scraped_count: u32,
    current_page: u32,
}

impl FrontierState {
    /// Takes a queue slot if one is left under `max_results`
    pub fn try_reserve_queue_slot(&mut self, max_results: u32) -> bool {
        if self.queued_count >= max_results {
            return false;
        }
        self.queued_count += 1;
        true
    }

    /// Records an entity URL; returns false if it was already present
    pub fn try_mark_visited(&mut self, key: &str) -> bool {
        self.visited_entity_urls.insert(key.to_string())
    }

    pub fn is_visited(&self, key: &str) -> bool {
        self.visited_entity_urls.contains(key)
    }

    pub fn queued_count(&self) -> u32 {
        self.queued_count
    }

    pub fn scraped_count(&self) -> u32 {
        self.scraped_count
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn unique_entities(&self) -> usize {
        self.visited_entity_urls.len()
    }
}

struct FrontierInner {
    state: FrontierState,
    queue: VecDeque<CrawlRequest>,
}

/// The crawl frontier, shared between the coordinator and its workers
pub struct Frontier {
    limits: FrontierLimits,
    inner: Mutex<FrontierInner>,
    pushed: Notify,
}

/// Dedup key for an entity URL: the normalized URL without its fragment
pub fn entity_key(url: &str) -> Option<String> {
    normalize_url(url).ok().map(String::from)
}

impl Frontier {
    /// Creates a frontier holding only the first listing page
    pub fn new(limits: FrontierLimits, start: CrawlRequest) -> Self {
        let state = FrontierState {
            current_page: start.page_index.max(1),
            ..FrontierState::default()
        };

        Self {
            limits,
            inner: Mutex::new(FrontierInner {
                state,
                queue: VecDeque::from([start]),
            }),
            pushed: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        // Critical sections never panic midway, so a poisoned lock still
        // holds consistent state
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn limits(&self) -> FrontierLimits {
        self.limits
    }

    /// Offers one entity URL for admission
    pub fn admit(&self, url: &str) -> Admission {
        let Some(key) = entity_key(url) else {
            return Admission::Invalid;
        };
        let mut inner = self.lock();
        Self::admit_locked(&mut inner.state, &key, self.limits.max_results)
    }

    fn admit_locked(state: &mut FrontierState, key: &str, max_results: u32) -> Admission {
        if state.is_visited(key) {
            return Admission::Duplicate;
        }
        if !state.try_reserve_queue_slot(max_results) {
            return Admission::QuotaFull;
        }
        state.try_mark_visited(key);
        Admission::Admitted
    }

    /// Admits a listing page's stubs in card order, all under one lock
    ///
    /// Stubs whose URL was already seen, or that arrive after the quota is
    /// reached, are dropped. Stubs with unusable URLs are dropped as well.
    pub fn admit_stubs(&self, stubs: Vec<EntityStub>) -> Vec<EntityStub> {
        let mut inner = self.lock();
        let mut admitted = Vec::new();
        let mut duplicates = 0;
        let mut over_quota = 0;
        let mut invalid = 0;

        for stub in stubs {
            let outcome = match entity_key(&stub.url) {
                Some(key) => Self::admit_locked(&mut inner.state, &key, self.limits.max_results),
                None => Admission::Invalid,
            };
            match outcome {
                Admission::Admitted => admitted.push(stub),
                Admission::Duplicate => duplicates += 1,
                Admission::QuotaFull => over_quota += 1,
                Admission::Invalid => {
                    tracing::debug!("Dropping card with unusable URL: {}", stub.url);
                    invalid += 1;
                }
            }
        }

        if duplicates > 0 || over_quota > 0 || invalid > 0 {
            tracing::debug!(
                "Admitted {} agents ({} duplicates, {} over quota, {} invalid)",
                admitted.len(),
                duplicates,
                over_quota,
                invalid
            );
        }
        admitted
    }

    /// True while another listing page may still be queued
    pub fn can_paginate(&self) -> bool {
        let inner = self.lock();
        inner.state.queued_count < self.limits.max_results
            && inner.state.current_page < self.limits.max_pages
    }

    /// Claims the next page number if both bounds still allow it
    pub fn try_advance_page(&self) -> Option<u32> {
        let mut inner = self.lock();
        let state = &mut inner.state;
        if state.queued_count >= self.limits.max_results || state.current_page >= self.limits.max_pages {
            return None;
        }
        state.current_page += 1;
        Some(state.current_page)
    }

    /// Counts one emitted record; returns its 1-based position, or None once
    /// `max_results` records have been counted
    pub fn try_record_scraped(&self) -> Option<u32> {
        let mut inner = self.lock();
        let state = &mut inner.state;
        if state.scraped_count >= self.limits.max_results {
            return None;
        }
        state.scraped_count += 1;
        Some(state.scraped_count)
    }

    pub fn push(&self, request: CrawlRequest) {
        self.lock().queue.push_back(request);
        self.pushed.notify_one();
    }

    /// Resolves once a request has been pushed since the last wake-up
    ///
    /// A push made while nobody is waiting is remembered, so the next call
    /// returns immediately.
    pub async fn pushed(&self) {
        self.pushed.notified().await;
    }

    /// Pops the next request worth fetching
    ///
    /// Detail requests are discarded once the result quota has been emitted,
    /// and listing requests once no further entity could be admitted.
    pub fn next_request(&self) -> Option<CrawlRequest> {
        let mut inner = self.lock();
        while let Some(request) = inner.queue.pop_front() {
            let state = &inner.state;
            let exhausted = match request.kind {
                RequestKind::Listing => state.queued_count >= self.limits.max_results,
                RequestKind::Detail(_) => state.scraped_count >= self.limits.max_results,
            };
            if exhausted {
                tracing::debug!("Quota reached, skipping {} request {}", request.label(), request.url);
                continue;
            }
            return Some(request);
        }
        None
    }

    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// A copy of the counters and dedup set
    pub fn snapshot(&self) -> FrontierState {
        self.lock().state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::BranchType;
    use std::sync::Arc;
    use url::Url;

    fn start() -> CrawlRequest {
        CrawlRequest::listing(Url::parse("https://example.com/find.html").unwrap(), 1)
    }

    fn frontier(max_results: u32, max_pages: u32) -> Frontier {
        Frontier::new(
            FrontierLimits {
                max_results,
                max_pages,
            },
            start(),
        )
    }

    fn stub(n: u32) -> EntityStub {
        EntityStub {
            agent_id: Some(n.to_string()),
            name: format!("Agent {}", n),
            url: format!("https://example.com/estate-agents/agent/{}.html", n),
            phone: None,
            logo: None,
            branch_type: BranchType::All,
            description: None,
            address: None,
        }
    }

    #[test]
    fn test_starts_on_page_one_with_start_request() {
        let frontier = frontier(10, 5);
        assert_eq!(frontier.snapshot().current_page(), 1);
        assert_eq!(frontier.pending(), 1);
        assert!(frontier.next_request().unwrap().is_listing());
        assert!(frontier.next_request().is_none());
    }

    #[test]
    fn test_quota_caps_admission() {
        let frontier = frontier(10, 5);
        let admitted = frontier.admit_stubs((1..=12).map(stub).collect());

        assert_eq!(admitted.len(), 10);
        assert_eq!(admitted.last().unwrap().name, "Agent 10");
        let state = frontier.snapshot();
        assert_eq!(state.queued_count(), 10);
        assert_eq!(state.unique_entities(), 10);
    }

    #[test]
    fn test_same_page_twice_admits_each_url_once() {
        let frontier = frontier(100, 5);
        let first = frontier.admit_stubs((1..=4).map(stub).collect());
        let second = frontier.admit_stubs((1..=4).map(stub).collect());

        assert_eq!(first.len(), 4);
        assert!(second.is_empty());
        assert_eq!(frontier.snapshot().queued_count(), 4);
    }

    #[test]
    fn test_fragment_does_not_defeat_dedup() {
        let frontier = frontier(100, 5);
        assert_eq!(frontier.admit("https://example.com/agent/1"), Admission::Admitted);
        assert_eq!(frontier.admit("https://example.com/agent/1#team"), Admission::Duplicate);
    }

    #[test]
    fn test_unusable_url_is_invalid_not_duplicate() {
        let frontier = frontier(5, 5);
        assert_eq!(frontier.admit("mailto:office@example.com"), Admission::Invalid);
        assert_eq!(frontier.admit("not a url"), Admission::Invalid);

        let mut bad = stub(1);
        bad.url = "javascript:void(0)".to_string();
        let admitted = frontier.admit_stubs(vec![bad, stub(2)]);
        assert_eq!(admitted.len(), 1);

        let state = frontier.snapshot();
        assert_eq!(state.queued_count(), 1);
        assert_eq!(state.unique_entities(), 1);
    }

    #[test]
    fn test_duplicate_does_not_consume_quota() {
        let frontier = frontier(2, 5);
        assert_eq!(frontier.admit("https://example.com/agent/1"), Admission::Admitted);
        assert_eq!(frontier.admit("https://example.com/agent/1"), Admission::Duplicate);
        assert_eq!(frontier.admit("https://example.com/agent/2"), Admission::Admitted);
        assert_eq!(frontier.admit("https://example.com/agent/3"), Admission::QuotaFull);
    }

    #[test]
    fn test_page_advance_respects_max_pages() {
        let frontier = frontier(100, 3);
        assert_eq!(frontier.try_advance_page(), Some(2));
        assert_eq!(frontier.try_advance_page(), Some(3));
        assert!(!frontier.can_paginate());
        assert_eq!(frontier.try_advance_page(), None);
        assert_eq!(frontier.snapshot().current_page(), 3);
    }

    #[test]
    fn test_page_advance_stops_when_quota_full() {
        let frontier = frontier(1, 5);
        frontier.admit("https://example.com/agent/1");
        assert_eq!(frontier.try_advance_page(), None);
    }

    #[test]
    fn test_scraped_count_is_capped() {
        let frontier = frontier(2, 5);
        assert_eq!(frontier.try_record_scraped(), Some(1));
        assert_eq!(frontier.try_record_scraped(), Some(2));
        assert_eq!(frontier.try_record_scraped(), None);
        assert_eq!(frontier.snapshot().scraped_count(), 2);
    }

    #[test]
    fn test_exhausted_requests_are_skipped() {
        let frontier = frontier(1, 5);
        frontier.next_request();
        frontier.admit("https://example.com/agent/1");

        let url = Url::parse("https://example.com/agent/1").unwrap();
        frontier.push(CrawlRequest::listing(Url::parse("https://example.com/find.html?index=10").unwrap(), 2));
        frontier.push(CrawlRequest::detail(url.clone(), stub(1), 1));
        frontier.push(CrawlRequest::detail(url, stub(1), 1));

        // The listing page can admit nothing more; the detail is still owed
        let next = frontier.next_request().unwrap();
        assert!(!next.is_listing());

        frontier.try_record_scraped();
        assert!(frontier.next_request().is_none());
    }

    #[tokio::test]
    async fn test_push_wakes_waiter() {
        let frontier = Arc::new(frontier(10, 5));
        frontier.next_request();

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.pushed().await })
        };
        tokio::task::yield_now().await;
        frontier.push(start());

        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("waiter should be woken by push")
            .unwrap();
        assert!(frontier.next_request().is_some());
    }

    #[test]
    fn test_concurrent_admission_never_exceeds_quota() {
        let frontier = Arc::new(frontier(25, 5));
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let frontier = Arc::clone(&frontier);
                std::thread::spawn(move || {
                    let stubs = (0..20).map(|n| stub(worker * 10 + n)).collect();
                    frontier.admit_stubs(stubs).len()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        let state = frontier.snapshot();
        assert_eq!(admitted, 25);
        assert_eq!(state.queued_count(), 25);
        assert_eq!(state.unique_entities(), 25);
    }
}
