//! Ordered fallback rules
//!
//! Markup on directory pages drifts between redesigns, so no field is tied to a
//! single selector. Each field instead has an ordered list of rules; the first
//! rule that produces a value wins and the rest are never evaluated.

use scraper::{ElementRef, Html, Selector};

/// Minimum number of containers a selector family must match to be trusted
pub const SUBSTANTIAL_MATCH: usize = 5;

/// One step of a fallback chain: where to look, which element to accept, and
/// how to turn it into a value
pub struct Rule<T> {
    pub css: &'static str,
    pub accept: fn(&ElementRef<'_>) -> bool,
    pub extract: fn(ElementRef<'_>) -> Option<T>,
}

impl<T> Rule<T> {
    /// A rule that looks only at the first element its selector matches
    pub const fn new(css: &'static str, extract: fn(ElementRef<'_>) -> Option<T>) -> Self {
        Self {
            css,
            accept: any_element,
            extract,
        }
    }

    /// A rule that looks at the first matching element satisfying `accept`
    pub const fn filtered(
        css: &'static str,
        accept: fn(&ElementRef<'_>) -> bool,
        extract: fn(ElementRef<'_>) -> Option<T>,
    ) -> Self {
        Self {
            css,
            accept,
            extract,
        }
    }
}

fn any_element(_: &ElementRef<'_>) -> bool {
    true
}

/// Evaluates rules in order within `scope`, returning the first value produced
pub fn first_of<T>(scope: ElementRef<'_>, rules: &[Rule<T>]) -> Option<T> {
    rules.iter().find_map(|rule| {
        let selector = match Selector::parse(rule.css) {
            Ok(selector) => selector,
            Err(e) => {
                tracing::debug!("Skipping unparsable selector {}: {:?}", rule.css, e);
                return None;
            }
        };
        let element = scope.select(&selector).find(|el| (rule.accept)(el))?;
        (rule.extract)(element)
    })
}

/// Picks the container family to trust on a listing page
///
/// Families are tried in order and the first one matching at least
/// `threshold` elements is accepted. When none reaches the threshold, the
/// family with the most matches is used (the earliest one on ties), so a
/// short final page still yields its few agents.
pub fn select_containers<'a>(
    document: &'a Html,
    families: &[&'static str],
    threshold: usize,
) -> (Option<&'static str>, Vec<ElementRef<'a>>) {
    let mut best: (Option<&'static str>, Vec<ElementRef<'a>>) = (None, Vec::new());

    for &css in families {
        let Ok(selector) = Selector::parse(css) else {
            tracing::debug!("Skipping unparsable container selector {}", css);
            continue;
        };

        let found: Vec<ElementRef<'a>> = document.select(&selector).collect();
        tracing::trace!("Container family {} matched {} elements", css, found.len());

        if found.len() >= threshold {
            return (Some(css), found);
        }
        if found.len() > best.1.len() {
            best = (Some(css), found);
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_text(el: ElementRef<'_>) -> Option<String> {
        crate::extract::clean_text(&el.text().collect::<String>())
    }

    fn mentions_beta(el: &ElementRef<'_>) -> bool {
        el.text().any(|t| t.contains("beta"))
    }

    #[test]
    fn test_first_rule_wins() {
        let html = Html::parse_document(
            r#"<div class="a">alpha</div><div class="b">beta</div>"#,
        );
        let rules = [Rule::new("div.b", first_text), Rule::new("div.a", first_text)];
        assert_eq!(first_of(html.root_element(), &rules).as_deref(), Some("beta"));
    }

    #[test]
    fn test_falls_through_empty_values() {
        let html = Html::parse_document(r#"<span class="x"> </span><p>found</p>"#);
        let rules = [Rule::new("span.x", first_text), Rule::new("p", first_text)];
        assert_eq!(first_of(html.root_element(), &rules).as_deref(), Some("found"));
    }

    #[test]
    fn test_filtered_rule_scans_past_rejected_elements() {
        let html = Html::parse_document(r#"<i>alpha</i><i>beta</i>"#);
        let rules = [Rule::filtered("i", mentions_beta, first_text)];
        assert_eq!(first_of(html.root_element(), &rules).as_deref(), Some("beta"));
    }

    #[test]
    fn test_container_threshold_prefers_first_substantial_family() {
        let cards = "<li class='card'></li>".repeat(6);
        let html = Html::parse_document(&format!(
            "<ul>{}</ul><div class='row'></div><div class='row'></div>",
            cards
        ));
        let (family, found) = select_containers(&html, &["div.row", "li.card"], 5);
        assert_eq!(family, Some("li.card"));
        assert_eq!(found.len(), 6);
    }

    #[test]
    fn test_container_falls_back_to_largest_family() {
        let html = Html::parse_document(
            "<li class='card'></li><li class='card'></li><div class='row'></div>",
        );
        let (family, found) = select_containers(&html, &["div.row", "li.card", "p"], 5);
        assert_eq!(family, Some("li.card"));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_container_none_found() {
        let html = Html::parse_document("<p>nothing here</p>");
        let (family, found) = select_containers(&html, &["div.card"], 5);
        assert_eq!(family, None);
        assert!(found.is_empty());
    }
}
