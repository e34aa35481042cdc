//! Detail-page extraction
//!
//! The cascade runs strongest source first: a JSON-LD business block, then
//! class-name and attribute rules for whatever is still missing, then facts
//! mined from the visible text. A field that is already present is never
//! replaced by a weaker source.

use crate::extract::facts::PageFacts;
use crate::extract::rules::{first_of, Rule};
use crate::extract::structured::find_business_block;
use crate::extract::text::{clean_description, clean_text, element_text, visible_text};
use crate::record::{EntityRecord, EntityStub, Extraction, ExtractionMethod};
use scraper::{ElementRef, Html};

/// Descriptions shorter than this are usually labels, not prose
const DESCRIPTION_MIN_CHARS: usize = 50;

const DESCRIPTION_RULES: &[Rule<String>] = &[
    Rule::new(r#"[class*="description"]"#, description),
    Rule::new(r#"[class*="about"]"#, description),
    Rule::new(r#"[class*="profile"]"#, description),
    Rule::new(r#"div[class*="text"] p"#, description),
    Rule::new("section p", description),
];

const PHONE_RULES: &[Rule<String>] = &[
    Rule::new(r#"[class*="phone"]"#, phone),
    Rule::new(r#"[class*="tel"]"#, phone),
    Rule::new(r#"a[href^="tel:"]"#, phone),
];

const EMAIL_RULES: &[Rule<String>] = &[
    Rule::new(r#"[class*="email"]"#, email),
    Rule::new(r#"a[href^="mailto:"]"#, email),
];

const WEBSITE_RULES: &[Rule<String>] = &[
    Rule::new(r#"[class*="website"]"#, website),
    Rule::new(r#"a[class*="web"]"#, website),
];

const ADDRESS_RULES: &[Rule<String>] = &[
    Rule::new(r#"[class*="address"]"#, single_line),
    Rule::new(r#"[itemprop="address"]"#, single_line),
];

fn description(element: ElementRef<'_>) -> Option<String> {
    clean_description(&element_text(&element))
        .filter(|text| text.chars().count() > DESCRIPTION_MIN_CHARS)
}

fn single_line(element: ElementRef<'_>) -> Option<String> {
    clean_text(&element_text(&element))
}

/// Element text, or the link target with its scheme prefix removed
fn text_or_href(element: ElementRef<'_>, scheme: &str) -> Option<String> {
    single_line(element).or_else(|| {
        let href = element.value().attr("href")?;
        let target = href
            .get(..scheme.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
            .map(|_| &href[scheme.len()..])
            .unwrap_or(href);
        clean_text(target)
    })
}

fn phone(element: ElementRef<'_>) -> Option<String> {
    text_or_href(element, "tel:")
}

fn email(element: ElementRef<'_>) -> Option<String> {
    text_or_href(element, "mailto:")
}

fn website(element: ElementRef<'_>) -> Option<String> {
    let href = element.value().attr("href")?.trim();
    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        Some(href.to_string())
    } else {
        None
    }
}

/// Builds the full record for an agent from its profile page
///
/// `seed` is the stub taken from the listing card; its values are the
/// starting point and are only replaced by structured data. A page with no
/// visible text and no structured data cannot be interpreted, and yields the
/// seed unchanged tagged [`ExtractionMethod::Failed`].
///
/// # Example
///
/// ```
/// use agent_trawl::extract::extract_entity_details;
/// use agent_trawl::{BranchType, EntityStub, ExtractionMethod};
/// use scraper::Html;
///
/// let seed = EntityStub {
///     agent_id: None,
///     name: "Acme".to_string(),
///     url: "https://example.com/agent/1".to_string(),
///     phone: None,
///     logo: None,
///     branch_type: BranchType::All,
///     description: None,
///     address: None,
/// };
/// let html = Html::parse_document(r#"<html><body>
///     <span class="phone">0113 496 0000</span>
///     <p>We have 12 properties for sale.</p>
/// </body></html>"#);
///
/// let record = extract_entity_details(&html, &seed).into_value();
/// assert_eq!(record.extraction_method, ExtractionMethod::MarkupFallback);
/// assert_eq!(record.info.phone.as_deref(), Some("0113 496 0000"));
/// assert_eq!(record.properties_for_sale, Some(12));
/// ```
pub fn extract_entity_details(document: &Html, seed: &EntityStub) -> Extraction<EntityRecord> {
    let page_text = visible_text(document);
    let structured = find_business_block(document);

    if structured.is_none() && page_text.trim().is_empty() {
        return Extraction::Degraded(
            EntityRecord::from_stub(seed.clone(), ExtractionMethod::Failed),
            "detail page has no readable content".to_string(),
        );
    }

    let method = if structured.as_ref().is_some_and(|block| block.name.is_some()) {
        ExtractionMethod::StructuredData
    } else {
        ExtractionMethod::MarkupFallback
    };
    let mut record = EntityRecord::from_stub(seed.clone(), method);

    if let Some(block) = structured {
        let info = &mut record.info;
        if let Some(name) = block.name {
            info.name = name;
        }
        overwrite(&mut info.phone, block.telephone);
        overwrite(&mut record.email, block.email);
        overwrite(&mut record.website, block.website);
        overwrite(&mut info.address, block.address);
        overwrite(&mut info.description, block.description);
    }

    let scope = document.root_element();
    let info = &mut record.info;
    fill_with(&mut info.description, || first_of(scope, DESCRIPTION_RULES));
    fill_with(&mut info.phone, || first_of(scope, PHONE_RULES));
    fill_with(&mut record.email, || first_of(scope, EMAIL_RULES));
    fill_with(&mut record.website, || first_of(scope, WEBSITE_RULES));
    fill_with(&mut info.address, || first_of(scope, ADDRESS_RULES));

    let facts = PageFacts::from_text(&page_text);
    record.properties_for_sale = facts.properties_for_sale;
    record.properties_to_let = facts.properties_to_let;
    record.team_members = facts.team_members;
    if !facts.services_offered.is_empty() {
        record.services_offered = Some(facts.services_offered);
    }

    Extraction::Ok(record)
}

/// Structured data outranks anything already present
fn overwrite(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Markup fallbacks only fill gaps
fn fill_with(slot: &mut Option<String>, find: impl FnOnce() -> Option<String>) {
    if slot.is_none() {
        *slot = find();
    }
}
