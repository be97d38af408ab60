//! Addressable preview fragments.
//!
//! Every fragment carries its `(block id, field label)` key as a pair of
//! `data-*` attributes. That pair is the only contract between an editing row
//! and the element it highlights, so the attribute names never change.

use crate::blocks::{labels, BlockId};
use serde::Serialize;
use std::fmt;

pub const BLOCK_ATTR: &str = "data-block-id";
pub const FIELD_ATTR: &str = "data-field";

/// Label given to the placeholder emitted for an unknown block type.
pub const UNKNOWN_BLOCK_LABEL: &str = "Unknown Block";

/// Stable address of one translatable field in the preview.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FragmentKey {
    pub block_id: BlockId,
    pub field_label: String,
}

impl FragmentKey {
    pub fn new(block_id: BlockId, field_label: impl Into<String>) -> Self {
        Self {
            block_id,
            field_label: field_label.into(),
        }
    }
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.block_id, self.field_label)
    }
}

/// Markup shape chosen from a field label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    Title,
    Subtitle,
    Button,
    Heading,
    Html,
    Plain,
    /// Placeholder for a block whose type is not recognized
    Unknown,
}

impl FragmentKind {
    /// Pick the markup shape for a field label.
    ///
    /// Exact, case-sensitive matches first; any label containing "HTML" is
    /// raw HTML; everything else is a plain paragraph.
    pub fn for_label(label: &str) -> Self {
        match label {
            labels::HERO_TITLE => FragmentKind::Title,
            labels::HERO_SUBTITLE => FragmentKind::Subtitle,
            labels::BUTTON_TEXT => FragmentKind::Button,
            labels::HEADING => FragmentKind::Heading,
            _ if label.contains("HTML") => FragmentKind::Html,
            _ => FragmentKind::Plain,
        }
    }

    /// Inner markup for `content`.
    ///
    /// Content is inserted verbatim. Editors are trusted authors and HTML
    /// blocks depend on their markup reaching the preview unchanged.
    pub fn render(&self, content: &str) -> String {
        match self {
            FragmentKind::Title => format!("<h1 class=\"preview-hero-title\">{}</h1>", content),
            FragmentKind::Subtitle => {
                format!("<p class=\"preview-hero-subtitle\">{}</p>", content)
            }
            FragmentKind::Button => format!(
                "<button type=\"button\" class=\"preview-hero-button\">{}</button>",
                content
            ),
            FragmentKind::Heading => format!("<h2 class=\"preview-heading\">{}</h2>", content),
            FragmentKind::Html => format!("<div class=\"preview-html\">{}</div>", content),
            FragmentKind::Plain => format!("<p>{}</p>", content),
            FragmentKind::Unknown => format!(
                "<div class=\"preview-unknown\"><em>Unknown block type: {}</em></div>",
                escape_attr(content)
            ),
        }
    }
}

/// One rendered, addressable unit of the preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewFragment {
    pub key: FragmentKey,
    pub kind: FragmentKind,
    pub markup: String,
}

impl PreviewFragment {
    /// Render `content` for `key`, wrapped in its addressing attributes.
    pub fn new(key: FragmentKey, kind: FragmentKind, content: &str) -> Self {
        let markup = format!(
            "<div class=\"preview-block\" {}=\"{}\" {}=\"{}\">{}</div>",
            BLOCK_ATTR,
            key.block_id,
            FIELD_ATTR,
            escape_attr(&key.field_label),
            kind.render(content)
        );
        Self { key, kind, markup }
    }

    /// Attribute selector matching this fragment's element.
    pub fn selector(&self) -> String {
        selector_for(&self.key)
    }
}

/// Attribute selector for a key, e.g. `[data-block-id="42"][data-field="Button Text"]`.
pub fn selector_for(key: &FragmentKey) -> String {
    format!(
        "[{}=\"{}\"][{}=\"{}\"]",
        BLOCK_ATTR,
        key.block_id,
        FIELD_ATTR,
        escape_attr(&key.field_label)
    )
}

/// Escape a value for use inside a double-quoted attribute.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
