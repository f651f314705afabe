// src/analyze/text.rs
// =============================================================================
// Visible text, word counts and keyword density.
//
// Keyword density = occurrences of the keyword / total words * 100.
// A multi-word keyword ("rust crawler") counts phrase occurrences over
// consecutive tokens, still divided by the total word count.
// =============================================================================

use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Elements whose text is never shown to a reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg"];

fn word_regex() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"\w+").unwrap())
}

/// Text a visitor would see, whitespace collapsed to single spaces
pub fn visible_text(document: &Html) -> String {
    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !HIDDEN_ELEMENTS.contains(&child_element.value().name()) {
                collect_text(child_element, out);
            }
        }
    }
}

/// Lowercased Unicode word tokens
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    word_regex()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Percentage of the words in `text` taken up by `keyword`
pub fn keyword_density(text: &str, keyword: &str) -> f64 {
    let words = tokenize(text);
    let needle = tokenize(keyword);
    if words.is_empty() || needle.is_empty() || needle.len() > words.len() {
        return 0.0;
    }

    let count = words
        .windows(needle.len())
        .filter(|window| *window == needle.as_slice())
        .count();

    count as f64 / words.len() as f64 * 100.0
}

/// The `n` most frequent terms, ignoring numbers and words under 3 letters
///
/// Ties are broken alphabetically so the output is stable.
pub fn top_terms(text: &str, n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in tokenize(text) {
        if word.chars().count() < 3 || word.chars().all(|c| c.is_numeric()) {
            continue;
        }
        *counts.entry(word).or_insert(0) += 1;
    }

    let mut terms: Vec<(String, usize)> = counts.into_iter().collect();
    terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    terms.truncate(n);
    terms
}
