//! Listing-page extraction: one [`EntityStub`] per agent card

use crate::extract::rules::{first_of, select_containers, Rule, SUBSTANTIAL_MATCH};
use crate::extract::text::{clean_text, element_text, truncate_chars};
use crate::record::{BranchType, EntityStub, Extraction};
use crate::url::{entity_id_from_url, normalize_url, resolve_link};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Card container families, most specific first
const CONTAINER_FAMILIES: &[&str] = &[
    r#"[class*="agentCard_agentCard"]"#,
    r#"div[class*="agentCard"]"#,
    r#"article[class*="agent"]"#,
    r#"div[class*="branch"]"#,
];

/// Name-and-profile-link rules within a card
const LINK_RULES: &[Rule<RawLink>] = &[
    Rule::new("a.ksc_link", raw_link),
    Rule::new(r#"a[class*="agentCard_ctaLink"]"#, raw_link),
];

/// Heading rule used when the profile link carries no text; the first `h2`
/// or `h3` in document order wins
const HEADING_RULES: &[Rule<String>] = &[Rule::new("h2, h3", heading_text)];

const DESCRIPTION_MIN_CHARS: usize = 20;
const DESCRIPTION_MAX_CHARS: usize = 200;
const ADDRESS_MIN_CHARS: usize = 10;
const ADDRESS_MAX_CHARS: usize = 150;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Tel[:\s]*([\d\s]+)").expect("hardcoded regex pattern is valid"));

static BRANCH_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(SALES|LETTINGS)").expect("hardcoded regex pattern is valid"));

struct RawLink {
    href: String,
    text: Option<String>,
}

fn raw_link(element: ElementRef<'_>) -> Option<RawLink> {
    let href = element.value().attr("href")?.to_string();
    Some(RawLink {
        href,
        text: clean_text(&element_text(&element)),
    })
}

fn heading_text(element: ElementRef<'_>) -> Option<String> {
    clean_text(&element_text(&element))
}

/// Extracts every usable agent card from a listing page
///
/// Cards without a profile link or a name are skipped. Every other field is
/// best-effort and simply absent when it cannot be found. A page where no
/// container family matches anything is reported as degraded with no stubs.
///
/// # Example
///
/// ```
/// use agent_trawl::extract::extract_listing_entities;
/// use scraper::Html;
/// use url::Url;
///
/// let html = Html::parse_document(r#"
///     <div class="agentCard_agentCard__x">
///         <a class="ksc_link" href="/estate-agents/agent/42/acme.html">Acme Lettings</a>
///         <p>Tel: 020 7946 0000</p>
///     </div>"#);
/// let page = Url::parse("https://www.rightmove.co.uk/estate-agents/find.html").unwrap();
///
/// let stubs = extract_listing_entities(&html, &page).into_value();
/// assert_eq!(stubs.len(), 1);
/// assert_eq!(stubs[0].agent_id.as_deref(), Some("42"));
/// assert_eq!(stubs[0].phone.as_deref(), Some("020 7946 0000"));
/// ```
pub fn extract_listing_entities(document: &Html, page_url: &Url) -> Extraction<Vec<EntityStub>> {
    let (family, cards) = select_containers(document, CONTAINER_FAMILIES, SUBSTANTIAL_MATCH);

    let Some(family) = family else {
        return Extraction::Degraded(
            Vec::new(),
            "no agent card containers matched any selector family".to_string(),
        );
    };
    tracing::debug!("Using container family {} ({} cards)", family, cards.len());

    let stubs: Vec<EntityStub> = cards
        .into_iter()
        .filter_map(|card| extract_card(card, page_url))
        .collect();

    if stubs.is_empty() {
        Extraction::Degraded(
            stubs,
            format!("containers matched {} but none had a usable profile link", family),
        )
    } else {
        Extraction::Ok(stubs)
    }
}

/// Extracts a single agent card; None when the card has no name or profile URL
pub fn extract_card(card: ElementRef<'_>, page_url: &Url) -> Option<EntityStub> {
    let link = first_of(card, LINK_RULES)?;
    let url = resolve_link(&link.href, page_url)
        .and_then(|resolved| normalize_url(&resolved).ok())?
        .to_string();
    let name = link.text.or_else(|| first_of(card, HEADING_RULES))?;

    let card_text = element_text(&card);

    Some(EntityStub {
        agent_id: entity_id_from_url(&url),
        name,
        url,
        phone: card_phone(&card_text),
        logo: card_logo(card, page_url),
        branch_type: card_branch_type(&card_text),
        description: card_description(card),
        address: card_address(card),
    })
}

/// Phone number following a "Tel" label
fn card_phone(card_text: &str) -> Option<String> {
    let captures = PHONE_RE.captures(card_text)?;
    clean_text(captures.get(1)?.as_str())
}

/// First image in the card, by `src` then lazy-loading `data-src`
fn card_logo(card: ElementRef<'_>, page_url: &Url) -> Option<String> {
    let selector = Selector::parse("img").ok()?;
    let img = card.select(&selector).next()?;
    let src = ["src", "data-src"]
        .iter()
        .filter_map(|attr| img.value().attr(attr))
        .find(|value| !value.trim().is_empty())?;
    resolve_link(src, page_url)
}

fn card_branch_type(card_text: &str) -> BranchType {
    BRANCH_TYPE_RE
        .captures(card_text)
        .and_then(|captures| captures.get(1))
        .and_then(|m| BranchType::from_token(m.as_str()))
        .unwrap_or(BranchType::All)
}

/// First substantial paragraph that is not the phone line
fn card_description(card: ElementRef<'_>) -> Option<String> {
    let selector = Selector::parse("p").ok()?;
    card.select(&selector)
        .map(|p| element_text(&p))
        .find(|text| text.chars().count() > DESCRIPTION_MIN_CHARS && !text.contains("Tel"))
        .and_then(|text| clean_text(&text))
        .map(|text| truncate_chars(&text, DESCRIPTION_MAX_CHARS))
}

/// First address-like node: comma separated and of plausible length
fn card_address(card: ElementRef<'_>) -> Option<String> {
    let selector = Selector::parse(r#"[class*="address"], span, div"#).ok()?;
    card.select(&selector)
        .map(|el| element_text(&el))
        .find(|text| {
            let len = text.chars().count();
            text.contains(',') && len > ADDRESS_MIN_CHARS && len < ADDRESS_MAX_CHARS
        })
        .and_then(|text| clean_text(&text))
}
