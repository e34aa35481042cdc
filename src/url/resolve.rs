use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Known profile URL shapes: `/agent/<id>`, `/branch-view/<id>`, `branchId=<id>`
static ENTITY_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/agent/(\d+)|/branch-view/(\d+)|branchId[=:](\d+)")
        .expect("hardcoded regex pattern is valid")
});

/// Resolves a link href against the page it was found on
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// Protocol-relative (`//host/path`) and root-relative (`/path`) links are
/// resolved the same way a browser would.
///
/// # Example
///
/// ```
/// use agent_trawl::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://www.rightmove.co.uk/estate-agents/find.html").unwrap();
/// assert_eq!(
///     resolve_link("/estate-agents/agent/Acme/London-1234.html", &base).as_deref(),
///     Some("https://www.rightmove.co.uk/estate-agents/agent/Acme/London-1234.html"),
/// );
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}

/// Derives a stable agent identifier from a profile URL
///
/// Returns None when the URL has none of the known shapes; the URL itself then
/// remains the identity of the agent.
pub fn entity_id_from_url(url: &str) -> Option<String> {
    let captures = ENTITY_ID_RE.captures(url)?;
    (1..=3)
        .filter_map(|group| captures.get(group))
        .map(|m| m.as_str().to_string())
        .next()
}
