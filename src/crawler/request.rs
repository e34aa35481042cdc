//! Units of work pulled from the frontier

use crate::record::EntityStub;
use url::Url;

/// What a fetched page is expected to contain
#[derive(Debug, Clone, PartialEq)]
pub enum RequestKind {
    /// A search results page listing many agents
    Listing,

    /// One agent's profile page, seeded with the card it was found on
    Detail(EntityStub),
}

/// A single page to fetch
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlRequest {
    pub url: Url,
    pub kind: RequestKind,

    /// 1-based attempt number
    pub attempt: u32,

    /// Listing page this request belongs to (1 for the start page)
    pub page_index: u32,
}

impl CrawlRequest {
    pub fn listing(url: Url, page_index: u32) -> Self {
        Self {
            url,
            kind: RequestKind::Listing,
            attempt: 1,
            page_index,
        }
    }

    pub fn detail(url: Url, seed: EntityStub, page_index: u32) -> Self {
        Self {
            url,
            kind: RequestKind::Detail(seed),
            attempt: 1,
            page_index,
        }
    }

    /// The same request, one attempt later
    pub fn retry(self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self
        }
    }

    pub fn is_listing(&self) -> bool {
        matches!(self.kind, RequestKind::Listing)
    }

    /// Short label for log lines
    pub fn label(&self) -> &'static str {
        match self.kind {
            RequestKind::Listing => "listing",
            RequestKind::Detail(_) => "detail",
        }
    }
}
