//! Typed content blocks and their translatable fields.
//!
//! - `schema`: block variants, sub-component references and the field registry
//! - `markup`: HTML classification and edit normalization for field values

mod markup;
mod schema;

pub use markup::{is_html, normalize_edit, strip_wrapping_paragraph};
pub use schema::{
    fields_for, labels, models, refs, sort_for_render, Block, BlockId, BlockKind, BlockRecord,
    ComponentId, HeadingLevel, PageId, TranslatableField,
};
