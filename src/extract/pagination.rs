//! Next listing page discovery

use crate::extract::rules::{first_of, Rule};
use crate::extract::text::element_text;
use crate::url::{advance_offset, resolve_link, OFFSET_PARAM, PAGE_SIZE};
use crate::UrlError;
use scraper::{ElementRef, Html};
use url::Url;

/// A pagination control as found on the page
struct NextControl {
    disabled: bool,
    href: Option<String>,
}

const NEXT_RULES: &[Rule<NextControl>] = &[
    Rule::new(r#"button[class*="pagination_next"]"#, next_control),
    Rule::new(r#"a[class*="pagination_next"]"#, next_control),
    Rule::filtered("button", labelled_next, next_control),
];

fn labelled_next(element: &ElementRef<'_>) -> bool {
    element_text(element).contains("Next")
}

fn next_control(element: ElementRef<'_>) -> Option<NextControl> {
    let attrs = element.value();
    let disabled = attrs.attr("disabled").is_some()
        || attrs
            .attr("aria-disabled")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

    Some(NextControl {
        disabled,
        href: attrs.attr("href").map(str::to_string),
    })
}

/// Finds the href of an enabled next-page control, resolved against the page
pub fn find_next_link(document: &Html, page_url: &Url) -> Option<Url> {
    let control = first_of(document.root_element(), NEXT_RULES)?;
    if control.disabled {
        tracing::debug!("Next-page control is disabled");
        return None;
    }

    let href = control.href?;
    resolve_link(&href, page_url).and_then(|resolved| Url::parse(&resolved).ok())
}

/// Returns the URL of the listing page after `page_url`
///
/// An enabled next-page control's link is preferred. Without one, the next
/// page is synthesized by advancing the result offset by one page.
pub fn next_page_url(document: &Html, page_url: &Url) -> Result<Url, UrlError> {
    match find_next_link(document, page_url) {
        Some(url) => Ok(url),
        None => advance_offset(page_url, OFFSET_PARAM, PAGE_SIZE),
    }
}
