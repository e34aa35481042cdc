//! Text normalization shared by every extractor

use scraper::{ElementRef, Html};

/// Elements whose text never reaches the reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Cleans a single-line field
///
/// Collapses every whitespace run to one space and trims. Returns None when
/// nothing is left, so an empty field is always absent rather than `""`.
///
/// # Example
///
/// ```
/// use agent_trawl::extract::clean_text;
///
/// assert_eq!(clean_text("  Acme \n\t Lettings "), Some("Acme Lettings".to_string()));
/// assert_eq!(clean_text(" \n "), None);
/// ```
pub fn clean_text(text: &str) -> Option<String> {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Cleans multi-paragraph text while keeping paragraph breaks
///
/// Line endings are normalized to `\n`, whitespace inside each line is
/// collapsed and trimmed, and any run of blank lines becomes exactly one blank
/// line. Leading and trailing blank lines are dropped.
///
/// # Example
///
/// ```
/// use agent_trawl::extract::clean_description;
///
/// let raw = "  We sell   homes.\r\n\r\n\r\n\r\n  We let them too.  ";
/// assert_eq!(
///     clean_description(raw).as_deref(),
///     Some("We sell homes.\n\nWe let them too."),
/// );
/// ```
pub fn clean_description(text: &str) -> Option<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut cleaned = String::with_capacity(normalized.len());
    let mut pending_blank = false;

    for line in normalized.split('\n') {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            pending_blank = true;
            continue;
        }

        if !cleaned.is_empty() {
            cleaned.push('\n');
            if pending_blank {
                cleaned.push('\n');
            }
        }
        pending_blank = false;
        cleaned.push_str(&line);
    }

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Truncates to a character budget, appending an ellipsis marker when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Concatenates the text nodes under an element, separated by single spaces
///
/// Adjacent inline elements would otherwise run together ("Tel:0123SALES").
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

/// Returns the text a reader would see on the page
///
/// Text inside script, style, noscript, and template elements is skipped.
pub fn visible_text(document: &Html) -> String {
    let mut text = String::new();

    for node in document.tree.root().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };

        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element())
            .map(|element| HIDDEN_ELEMENTS.contains(&element.name()))
            .unwrap_or(false);

        if !hidden {
            text.push_str(fragment);
            text.push(' ');
        }
    }

    text
}
