//! HTML classification of field values and normalization of edits.
//!
//! Rich-text editors wrap plain values in `<div>`/`<p>` elements. A row whose
//! source value is plain text gets those wrappers stripped on edit; a row whose
//! source value is real HTML stores edits verbatim.

use regex::Regex;
use std::sync::OnceLock;

static PARAGRAPH_WRAPPER_REGEX: OnceLock<Regex> = OnceLock::new();
static DIV_WRAPPER_REGEX: OnceLock<Regex> = OnceLock::new();
static HTML_TAG_REGEX: OnceLock<Regex> = OnceLock::new();

fn paragraph_wrapper() -> &'static Regex {
    PARAGRAPH_WRAPPER_REGEX.get_or_init(|| Regex::new(r"(?s)^<p(?:\s[^>]*)?>(.*)</p>$").unwrap())
}

fn div_wrapper() -> &'static Regex {
    DIV_WRAPPER_REGEX.get_or_init(|| Regex::new(r"(?s)^<div(?:\s[^>]*)?>(.*)</div>$").unwrap())
}

fn html_tag() -> &'static Regex {
    HTML_TAG_REGEX.get_or_init(|| Regex::new(r"(?i)<[a-z][\s\S]*>").unwrap())
}

/// Remove one wrapping element matched by `wrapper`, if the whole value is wrapped.
fn strip_one(wrapper: &Regex, value: &str) -> String {
    match wrapper.captures(value) {
        Some(caps) => caps[1].to_string(),
        None => value.to_string(),
    }
}

/// Strip at most one `<p …>…</p>` wrapping the trimmed value, then trim again.
pub fn strip_wrapping_paragraph(value: &str) -> String {
    strip_one(paragraph_wrapper(), value.trim()).trim().to_string()
}

/// Whether a source value carries real markup beyond a plain paragraph wrapper.
///
/// Wrapping paragraphs are peeled until none remains, so
/// `is_html(v) == is_html(&strip_wrapping_paragraph(v))` for every `v`.
pub fn is_html(value: &str) -> bool {
    let mut current = value.trim().to_string();
    loop {
        let stripped = strip_wrapping_paragraph(&current);
        if stripped == current {
            break;
        }
        current = stripped;
    }
    html_tag().is_match(&current)
}

/// Normalize a raw edit for storage.
///
/// HTML rows keep the raw value untouched. Plain rows lose at most one
/// wrapping `<div>` and then at most one wrapping `<p>`, and are trimmed.
pub fn normalize_edit(raw: &str, is_html_row: bool) -> String {
    if is_html_row {
        return raw.to_string();
    }
    let without_div = strip_one(div_wrapper(), raw);
    let without_p = strip_one(paragraph_wrapper(), &without_div);
    without_p.trim().to_string()
}
