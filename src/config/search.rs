//! Start URL resolution
//!
//! The crawler core only ever sees one absolute start URL. This module turns the
//! `[search]` section into that URL.

use crate::config::types::SearchConfig;
use crate::ConfigError;
use url::Url;

/// Agent search endpoint used when no explicit start URL is configured
pub const DEFAULT_SEARCH_URL: &str = "https://www.rightmove.co.uk/estate-agents/find.html";

/// Region identifiers for the locations people search most
const REGIONS: &[(&str, &str)] = &[
    ("london", "REGION^87490"),
    ("manchester", "REGION^904"),
    ("birmingham", "REGION^60"),
    ("leeds", "REGION^787"),
    ("liverpool", "REGION^1520"),
    ("bristol", "REGION^239"),
    ("edinburgh", "REGION^339"),
    ("glasgow", "REGION^394"),
    ("cardiff", "REGION^306"),
    ("belfast", "REGION^5882"),
];

const DEFAULT_REGION: &str = "REGION^87490";

/// Looks up the directory identifier for a well-known location name
pub fn region_identifier(location: &str) -> Option<&'static str> {
    let key = location.trim().to_lowercase();
    REGIONS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, id)| *id)
}

/// Resolves the search settings into the URL the crawl starts from
///
/// Precedence: explicit `start-url`, then `location-identifier`, then a
/// `search-location` mapped through the region table (or passed through as-is
/// for postcodes and custom identifiers), then London.
///
/// # Example
///
/// ```
/// use agent_trawl::config::{resolve_start_url, SearchConfig};
///
/// let search = SearchConfig {
///     search_location: Some("Leeds".to_string()),
///     ..SearchConfig::default()
/// };
/// let url = resolve_start_url(&search).unwrap();
/// assert!(url.as_str().contains("locationIdentifier=REGION%5E787"));
/// ```
pub fn resolve_start_url(search: &SearchConfig) -> Result<Url, ConfigError> {
    if let Some(start_url) = &search.start_url {
        return Url::parse(start_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start_url '{}': {}", start_url, e)));
    }

    let location = match (&search.location_identifier, &search.search_location) {
        (Some(identifier), _) => identifier.trim().to_string(),
        (None, Some(location)) => region_identifier(location)
            .map(str::to_string)
            .unwrap_or_else(|| location.trim().to_string()),
        (None, None) => DEFAULT_REGION.to_string(),
    };

    let mut url = Url::parse(DEFAULT_SEARCH_URL)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search endpoint: {}", e)))?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("locationIdentifier", &location);
        query.append_pair("radius", search.radius.trim());
        if let Some(brand) = search.brand_name.as_deref().map(str::trim) {
            if !brand.is_empty() {
                query.append_pair("brandName", brand);
            }
        }
        query.append_pair("branchType", search.branch_type.as_str());
    }

    Ok(url)
}
