//! URL handling module for Agent-Trawl
//!
//! This module resolves links found on pages into absolute URLs, derives agent
//! identifiers from profile URLs, and advances positional pagination offsets.

mod normalize;
mod offset;
mod resolve;

pub use normalize::normalize_url;
pub use offset::{advance_offset, OFFSET_PARAM, PAGE_SIZE};
pub use resolve::{entity_id_from_url, resolve_link};
