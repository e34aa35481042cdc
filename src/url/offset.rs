use crate::UrlError;
use url::Url;

/// Query parameter the directory uses for its result offset
pub const OFFSET_PARAM: &str = "index";

/// Number of agents the directory shows per listing page
pub const PAGE_SIZE: u32 = 10;

/// Synthesizes the next listing page by bumping a positional offset parameter
///
/// A missing or non-numeric offset counts as 0. All other query parameters are
/// kept in their original order.
///
/// # Example
///
/// ```
/// use agent_trawl::url::{advance_offset, OFFSET_PARAM, PAGE_SIZE};
/// use url::Url;
///
/// let url = Url::parse("https://example.com/find.html?locationIdentifier=REGION%5E60").unwrap();
/// let next = advance_offset(&url, OFFSET_PARAM, PAGE_SIZE).unwrap();
/// assert_eq!(next.as_str(), "https://example.com/find.html?locationIdentifier=REGION%5E60&index=10");
/// ```
pub fn advance_offset(url: &Url, param: &str, step: u32) -> Result<Url, UrlError> {
    if url.cannot_be_a_base() {
        return Err(UrlError::Malformed(format!(
            "Cannot paginate non-hierarchical URL: {}",
            url
        )));
    }

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let current = pairs
        .iter()
        .find(|(key, _)| key == param)
        .and_then(|(_, value)| value.trim().parse::<u64>().ok())
        .unwrap_or(0);
    let next = (current + u64::from(step)).to_string();

    match pairs.iter_mut().find(|pair| pair.0 == param) {
        Some(pair) => pair.1 = next,
        None => pairs.push((param.to_string(), next)),
    }
    // Collapse duplicates of the offset parameter onto the first occurrence
    let mut seen = false;
    pairs.retain(|(key, _)| {
        if key != param {
            return true;
        }
        let keep = !seen;
        seen = true;
        keep
    });

    let mut next_url = url.clone();
    next_url.query_pairs_mut().clear().extend_pairs(pairs);
    Ok(next_url)
}
