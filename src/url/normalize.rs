use crate::UrlError;
use url::Url;

/// Normalizes a URL into the form used as a deduplication key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not HTTP or HTTPS
/// 3. Lowercase the host (the `url` crate already does this for special schemes)
/// 4. Remove the fragment
///
/// Query strings are kept intact: branch URLs such as `?branchId=123` are only
/// distinguishable by their query.
///
/// # Examples
///
/// ```
/// use agent_trawl::url::normalize_url;
///
/// let url = normalize_url("https://WWW.Example.com/agent/12#contact").unwrap();
/// assert_eq!(url.as_str(), "https://www.example.com/agent/12");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::Malformed(format!("URL has no host: {}", url_str)));
    }

    url.set_fragment(None);

    Ok(url)
}
