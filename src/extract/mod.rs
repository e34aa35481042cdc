//! Extraction cascade for listing and detail pages
//!
//! This module turns one parsed HTML document into structured agent data:
//! - Listing pages yield one [`EntityStub`](crate::record::EntityStub) per card
//! - Detail pages yield an [`EntityRecord`](crate::record::EntityRecord) seeded by the card
//! - Listing pages also yield the URL of the next page
//!
//! Every extractor is best-effort and total: problems surface as
//! [`Extraction::Degraded`](crate::record::Extraction::Degraded), never as errors.

mod detail;
pub mod facts;
mod listing;
mod pagination;
pub mod rules;
mod structured;
mod text;

pub use detail::extract_entity_details;
pub use facts::PageFacts;
pub use listing::{extract_card, extract_listing_entities};
pub use pagination::{find_next_link, next_page_url};
pub use structured::{find_business_block, is_business, structured_blocks, BusinessBlock};
pub use text::{clean_description, clean_text, element_text, truncate_chars, visible_text};

use scraper::Html;

/// Parses a response body into a document
///
/// HTML parsing is error-tolerant, so this never fails; malformed markup just
/// produces a sparser tree.
pub fn parse_document(body: &str) -> Html {
    Html::parse_document(body)
}
