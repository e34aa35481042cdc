//! Data model for discovered agents
//!
//! An [`EntityStub`] is what a listing card yields; an [`EntityRecord`] is what
//! finally reaches the output sink, tagged with the strategy that produced it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Branch specialisation advertised on a listing card or requested in a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BranchType {
    #[default]
    All,
    Sales,
    Lettings,
}

impl BranchType {
    /// Returns the query-string / dataset representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Sales => "SALES",
            Self::Lettings => "LETTINGS",
        }
    }

    /// Parses a token case-insensitively
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "ALL" => Some(Self::All),
            "SALES" => Some(Self::Sales),
            "LETTINGS" => Some(Self::Lettings),
            _ => None,
        }
    }
}

impl fmt::Display for BranchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance tag recording which strategy produced a record's fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    /// An embedded JSON-LD business block supplied the fields
    StructuredData,
    /// Class-name and attribute patterns supplied the fields
    MarkupFallback,
    /// Only the listing card was used (detail collection disabled)
    BasicCard,
    /// The detail page could not be interpreted; the card data is returned as-is
    Failed,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StructuredData => "structured-data",
            Self::MarkupFallback => "markup-fallback",
            Self::BasicCard => "basic-card",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal agent data taken from a single listing card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityStub {
    /// Identifier parsed out of the profile URL, when the URL has a known shape
    pub agent_id: Option<String>,

    pub name: String,

    /// Absolute profile URL; this is the deduplication key
    pub url: String,

    pub phone: Option<String>,
    pub logo: Option<String>,
    pub branch_type: BranchType,
    pub description: Option<String>,
    pub address: Option<String>,
}

/// Final record handed to the output sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    #[serde(flatten)]
    pub info: EntityStub,

    pub email: Option<String>,
    pub website: Option<String>,
    pub properties_for_sale: Option<u32>,
    pub properties_to_let: Option<u32>,
    pub team_members: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub services_offered: Option<Vec<String>>,

    pub extraction_method: ExtractionMethod,

    /// RFC 3339 timestamp set when the record is emitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<String>,
}

impl EntityRecord {
    /// Wraps a stub without any detail-page enrichment
    pub fn from_stub(stub: EntityStub, method: ExtractionMethod) -> Self {
        Self {
            info: stub,
            email: None,
            website: None,
            properties_for_sale: None,
            properties_to_let: None,
            team_members: None,
            services_offered: None,
            extraction_method: method,
            scraped_at: None,
        }
    }

    /// Overlays this detail record on top of the seed stub.
    ///
    /// Fields present on `self` win; fields still absent are taken from the seed.
    pub fn merged_over(mut self, seed: &EntityStub) -> Self {
        let info = &mut self.info;
        if info.name.is_empty() {
            info.name = seed.name.clone();
        }
        if info.url.is_empty() {
            info.url = seed.url.clone();
        }
        fill(&mut info.agent_id, &seed.agent_id);
        fill(&mut info.phone, &seed.phone);
        fill(&mut info.logo, &seed.logo);
        fill(&mut info.description, &seed.description);
        fill(&mut info.address, &seed.address);
        self
    }

    /// Stamps the record with the current time
    pub fn stamped(mut self) -> Self {
        self.scraped_at = Some(chrono::Utc::now().to_rfc3339());
        self
    }
}

fn fill(slot: &mut Option<String>, seed: &Option<String>) {
    if slot.is_none() {
        slot.clone_from(seed);
    }
}

/// Outcome of a best-effort extraction.
///
/// Extraction never fails outright: a problem is reported alongside whatever
/// partial value could still be produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    Ok(T),
    Degraded(T, String),
}

impl<T> Extraction<T> {
    /// Returns the value, discarding any degradation reason
    pub fn into_value(self) -> T {
        match self {
            Self::Ok(value) | Self::Degraded(value, _) => value,
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Ok(value) | Self::Degraded(value, _) => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(..))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Ok(_) => None,
            Self::Degraded(_, reason) => Some(reason),
        }
    }
}
