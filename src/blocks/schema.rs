//! Block schema registry: which fields of each block type are translatable.
//!
//! Blocks arrive from the content store as loosely typed [`BlockRecord`]s and
//! are converted into a closed [`BlockKind`] variant. Unrecognized persisted
//! types survive as [`BlockKind::Unknown`] so the preview can show a
//! placeholder instead of dropping them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type PageId = u64;
pub type BlockId = u64;
pub type ComponentId = u64;

/// Sub-component model names and the fields holding their translatable text.
pub mod models {
    pub const TITLE: &str = "cms.block.title";
    pub const TEXT: &str = "cms.block.text";
    pub const HTML: &str = "cms.block.html";
    pub const IMAGE: &str = "cms.block.image";

    pub const TITLE_FIELD: &str = "title";
    pub const CONTENT_FIELD: &str = "content";
    pub const IMAGE_URL_FIELD: &str = "url";
    pub const IMAGE_ALT_FIELD: &str = "alt";
}

/// Keys of the sub-component references carried by a block record.
pub mod refs {
    pub const HTML: &str = "html_component_id";
    pub const TEXT: &str = "text_component_id";
    pub const HEADING_TITLE: &str = "heading_title_id";
    pub const HERO_TITLE: &str = "hero_title_id";
    pub const HERO_SUBTITLE: &str = "hero_subtitle_id";
    pub const HERO_BUTTON_TEXT: &str = "hero_button_text_id";
    pub const IMAGE: &str = "image_component_id";
}

/// Field labels. These double as preview addressing keys, so they are stable.
pub mod labels {
    pub const HTML_CONTENT: &str = "HTML Content";
    pub const TEXT_CONTENT: &str = "Text Content";
    pub const HEADING: &str = "Heading";
    pub const HERO_TITLE: &str = "Hero Title";
    pub const HERO_SUBTITLE: &str = "Hero Subtitle";
    pub const BUTTON_TEXT: &str = "Button Text";
}

/// A block descriptor as persisted by the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: BlockId,
    pub name: String,
    #[serde(rename = "type")]
    pub block_type: String,
    pub sequence: i64,
    /// Sub-component references keyed by `refs::*`
    #[serde(default)]
    pub refs: BTreeMap<String, ComponentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    H1,
    #[default]
    H2,
    H3,
    H4,
}

impl HeadingLevel {
    /// Parse a persisted level, falling back to `h2`.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("h1") => HeadingLevel::H1,
            Some("h3") => HeadingLevel::H3,
            Some("h4") => HeadingLevel::H4,
            _ => HeadingLevel::H2,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            HeadingLevel::H1 => "h1",
            HeadingLevel::H2 => "h2",
            HeadingLevel::H3 => "h3",
            HeadingLevel::H4 => "h4",
        }
    }
}

/// Closed set of block variants, each carrying its own sub-component references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Hero {
        title: Option<ComponentId>,
        subtitle: Option<ComponentId>,
        button_text: Option<ComponentId>,
    },
    Heading {
        title: Option<ComponentId>,
        level: HeadingLevel,
    },
    Text {
        content: Option<ComponentId>,
    },
    Html {
        content: Option<ComponentId>,
    },
    Image {
        image: Option<ComponentId>,
    },
    UserList,
    /// Persisted type this build does not know about
    Unknown {
        block_type: String,
    },
}

impl BlockKind {
    /// The persisted type tag for this variant.
    pub fn type_name(&self) -> &str {
        match self {
            BlockKind::Hero { .. } => "hero",
            BlockKind::Heading { .. } => "heading",
            BlockKind::Text { .. } => "text",
            BlockKind::Html { .. } => "html",
            BlockKind::Image { .. } => "image",
            BlockKind::UserList => "user_list",
            BlockKind::Unknown { block_type } => block_type,
        }
    }

    /// Image and user list blocks hold dynamic or non-textual content.
    pub fn is_translatable(&self) -> bool {
        !matches!(
            self,
            BlockKind::Image { .. } | BlockKind::UserList | BlockKind::Unknown { .. }
        )
    }
}

/// A typed block, ready for expansion into translatable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub id: BlockId,
    pub name: String,
    pub sequence: i64,
    pub kind: BlockKind,
}

impl From<BlockRecord> for Block {
    fn from(record: BlockRecord) -> Self {
        let get = |key: &str| record.refs.get(key).copied();
        let kind = match record.block_type.as_str() {
            "hero" => BlockKind::Hero {
                title: get(refs::HERO_TITLE),
                subtitle: get(refs::HERO_SUBTITLE),
                button_text: get(refs::HERO_BUTTON_TEXT),
            },
            "heading" => BlockKind::Heading {
                title: get(refs::HEADING_TITLE),
                level: HeadingLevel::parse(record.heading_level.as_deref()),
            },
            "text" => BlockKind::Text {
                content: get(refs::TEXT),
            },
            "html" => BlockKind::Html {
                content: get(refs::HTML),
            },
            "image" => BlockKind::Image {
                image: get(refs::IMAGE),
            },
            "user_list" => BlockKind::UserList,
            _ => BlockKind::Unknown {
                block_type: record.block_type.clone(),
            },
        };

        Block {
            id: record.id,
            name: record.name,
            sequence: record.sequence,
            kind,
        }
    }
}

/// One translatable field of a block, with the address of its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslatableField {
    pub label: &'static str,
    pub model: &'static str,
    pub component_id: ComponentId,
    pub field: &'static str,
}

impl TranslatableField {
    fn title(label: &'static str, component_id: ComponentId) -> Self {
        Self {
            label,
            model: models::TITLE,
            component_id,
            field: models::TITLE_FIELD,
        }
    }
}

/// Ordered translatable fields of a block.
///
/// Only fields whose sub-component reference exists are returned, so a hero
/// without a button yields two fields. Image, user list and unknown blocks
/// yield none.
pub fn fields_for(block: &Block) -> Vec<TranslatableField> {
    match &block.kind {
        BlockKind::Html { content } => content
            .map(|id| TranslatableField {
                label: labels::HTML_CONTENT,
                model: models::HTML,
                component_id: id,
                field: models::CONTENT_FIELD,
            })
            .into_iter()
            .collect(),
        BlockKind::Text { content } => content
            .map(|id| TranslatableField {
                label: labels::TEXT_CONTENT,
                model: models::TEXT,
                component_id: id,
                field: models::CONTENT_FIELD,
            })
            .into_iter()
            .collect(),
        BlockKind::Heading { title, .. } => title
            .map(|id| TranslatableField::title(labels::HEADING, id))
            .into_iter()
            .collect(),
        BlockKind::Hero {
            title,
            subtitle,
            button_text,
        } => [
            (labels::HERO_TITLE, *title),
            (labels::HERO_SUBTITLE, *subtitle),
            (labels::BUTTON_TEXT, *button_text),
        ]
        .into_iter()
        .filter_map(|(label, id)| id.map(|id| TranslatableField::title(label, id)))
        .collect(),
        BlockKind::Image { .. } | BlockKind::UserList | BlockKind::Unknown { .. } => Vec::new(),
    }
}

/// Sort blocks into render order: ascending sequence, ties broken by id.
pub fn sort_for_render(blocks: &mut [Block]) {
    blocks.sort_by_key(|block| (block.sequence, block.id));
}
