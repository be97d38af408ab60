//! Session-mode preview: one fragment per translatable field, in render order.

use super::fragment::{FragmentKey, FragmentKind, PreviewFragment, UNKNOWN_BLOCK_LABEL};
use crate::blocks::{fields_for, sort_for_render, Block, BlockKind, TranslatableField};
use tracing::debug;

/// Source of locale-scoped field values for the preview.
pub trait ValueLookup {
    fn value(&self, field: &TranslatableField, locale: &str) -> Option<String>;
}

impl<F> ValueLookup for F
where
    F: Fn(&TranslatableField, &str) -> Option<String>,
{
    fn value(&self, field: &TranslatableField, locale: &str) -> Option<String> {
        self(field, locale)
    }
}

/// Build the preview fragments for `blocks` as seen in `locale`.
///
/// Blocks are rendered in ascending sequence order. Image and user list blocks
/// contribute nothing; an unknown block type contributes a visible placeholder.
/// Missing values render as empty content.
pub fn build_fragments(
    blocks: &[Block],
    locale: &str,
    lookup: &impl ValueLookup,
) -> Vec<PreviewFragment> {
    let mut ordered = blocks.to_vec();
    sort_for_render(&mut ordered);

    let mut fragments = Vec::new();
    for block in &ordered {
        if let BlockKind::Unknown { block_type } = &block.kind {
            debug!(
                "Block {} ({}) has unknown type '{}', rendering placeholder",
                block.id, block.name, block_type
            );
            fragments.push(PreviewFragment::new(
                FragmentKey::new(block.id, UNKNOWN_BLOCK_LABEL),
                FragmentKind::Unknown,
                block_type,
            ));
            continue;
        }

        for field in fields_for(block) {
            let content = lookup.value(&field, locale).unwrap_or_default();
            fragments.push(PreviewFragment::new(
                FragmentKey::new(block.id, field.label),
                FragmentKind::for_label(field.label),
                &content,
            ));
        }
    }
    fragments
}

const PREVIEW_STYLES: &str = r#"<style>
    body {
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Arial, sans-serif;
        margin: 0;
    }
    .cms-page-preview { padding: 20px; }
    .preview-block { margin: 10px 0; }
    .preview-hero-title { font-size: 32px; }
    .preview-hero-subtitle { font-size: 16px; opacity: 0.9; }
    .preview-hero-button { border: none; padding: 12px 24px; border-radius: 4px; }
    .preview-heading { margin: 20px 0 10px 0; }
    .preview-unknown { color: #a94442; }
    [data-field]:hover {
        outline: 2px solid #4a90e2 !important;
        background-color: #f0f8ff !important;
        cursor: pointer;
    }
    [data-field].highlighted {
        outline: 3px solid #ff9800 !important;
        background-color: #fffbcc !important;
        animation: pulse 0.5s ease-in-out;
    }
    @keyframes pulse {
        0%, 100% { transform: scale(1); }
        50% { transform: scale(1.02); }
    }
</style>"#;

/// Join fragments into the preview body container.
pub fn render_body(fragments: &[PreviewFragment]) -> String {
    let mut parts = vec!["<div class=\"cms-page-preview\">".to_string()];
    parts.extend(fragments.iter().map(|f| f.markup.clone()));
    parts.push("</div>".to_string());
    parts.join("\n")
}

/// Complete HTML document for the preview frame, with highlight styles.
pub fn render_document(fragments: &[PreviewFragment]) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         {}\n</head>\n<body>\n{}\n</body>\n</html>\n",
        PREVIEW_STYLES,
        render_body(fragments)
    )
}
