//! Preview builder.
//!
//! - `fragment`: addressable fragments and the label → markup rule
//! - `builder`: session-mode fragments and the full preview document
//! - `page`: read-only page overview, one fragment per block

mod builder;
mod fragment;
pub mod page;

pub use builder::{build_fragments, render_body, render_document, ValueLookup};
pub use fragment::{
    escape_attr, selector_for, FragmentKey, FragmentKind, PreviewFragment, BLOCK_ATTR, FIELD_ATTR,
    UNKNOWN_BLOCK_LABEL,
};
pub use page::{load_page_overview, BlockFragment, PageBlockContent};
