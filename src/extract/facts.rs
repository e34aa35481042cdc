//! Facts mined from free page text
//!
//! Each fact is a pure function over plain text so it can be exercised without
//! any HTML at all.

use regex::Regex;
use std::sync::LazyLock;

static FOR_SALE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*propert(?:y|ies)\s*for\s*sale").expect("hardcoded regex pattern is valid")
});

static TO_LET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*propert(?:y|ies)\s*to\s*let").expect("hardcoded regex pattern is valid")
});

static TEAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:team\s+members?|staff|agents?)\b")
        .expect("hardcoded regex pattern is valid")
});

/// Services recognised in page text, in reporting order
const SERVICE_VOCABULARY: &[&str] = &[
    "sales",
    "lettings",
    "mortgages",
    "conveyancing",
    "valuation",
    "property management",
];

/// Every fact the detail extractor mines from page text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFacts {
    pub properties_for_sale: Option<u32>,
    pub properties_to_let: Option<u32>,
    pub team_members: Option<u32>,
    pub services_offered: Vec<String>,
}

impl PageFacts {
    pub fn from_text(text: &str) -> Self {
        Self {
            properties_for_sale: properties_for_sale(text),
            properties_to_let: properties_to_let(text),
            team_members: team_members(text),
            services_offered: services_offered(text),
        }
    }
}

fn first_number(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// "123 properties for sale"
pub fn properties_for_sale(text: &str) -> Option<u32> {
    first_number(&FOR_SALE_RE, text)
}

/// "45 properties to let"
pub fn properties_to_let(text: &str) -> Option<u32> {
    first_number(&TO_LET_RE, text)
}

/// "12 team members", "8 staff", "3 agents"
pub fn team_members(text: &str) -> Option<u32> {
    first_number(&TEAM_RE, text)
}

/// Services from the fixed vocabulary mentioned anywhere in the text, title-cased
pub fn services_offered(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    SERVICE_VOCABULARY
        .iter()
        .filter(|service| lowered.contains(*service))
        .map(|service| title_case(service))
        .collect()
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
