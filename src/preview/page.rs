//! Page overview mode: a read-only preview of every block of a page.
//!
//! Unlike the session preview this mode does not use translation rows. It
//! reads raw block values at one locale and emits one fragment per block,
//! including image and user list blocks.

use super::fragment::{escape_attr, BLOCK_ATTR, FIELD_ATTR};
use crate::blocks::{
    labels, models, sort_for_render, Block, BlockId, BlockKind, ComponentId, HeadingLevel, PageId,
};
use crate::error::StoreResult;
use crate::store::ContentStore;
use serde::Serialize;
use tracing::{debug, warn};

const DEFAULT_BUTTON_TEXT: &str = "Get Started";

/// Values of one block at one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageBlockContent {
    Hero {
        title: String,
        subtitle: String,
        button_text: String,
    },
    Heading {
        text: String,
        level: HeadingLevel,
    },
    Text {
        content: String,
    },
    Html {
        content: String,
    },
    Image {
        url: String,
        alt: String,
    },
    UserList,
    Unknown {
        block_type: String,
    },
}

/// One rendered block of the page overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockFragment {
    pub block_id: BlockId,
    pub block_type: String,
    pub markup: String,
}

fn field_attrs(block_id: BlockId, label: &str) -> String {
    format!(
        "{}=\"{}\" {}=\"{}\"",
        BLOCK_ATTR,
        block_id,
        FIELD_ATTR,
        escape_attr(label)
    )
}

/// Render one block. Field elements carry the same addressing attributes as
/// session fragments, so highlighting works on the overview too.
pub fn render_block(block_id: BlockId, content: &PageBlockContent) -> String {
    match content {
        PageBlockContent::Hero {
            title,
            subtitle,
            button_text,
        } => {
            let button = if button_text.is_empty() {
                DEFAULT_BUTTON_TEXT
            } else {
                button_text.as_str()
            };
            format!(
                "<section class=\"hero-section\" {}=\"{}\">\
                 <h1 {}>{}</h1>\
                 <p {}>{}</p>\
                 <button type=\"button\" {}>{}</button>\
                 </section>",
                BLOCK_ATTR,
                block_id,
                field_attrs(block_id, labels::HERO_TITLE),
                title,
                field_attrs(block_id, labels::HERO_SUBTITLE),
                subtitle,
                field_attrs(block_id, labels::BUTTON_TEXT),
                button
            )
        }
        PageBlockContent::Heading { text, level } => format!(
            "<{tag} {}>{}</{tag}>",
            field_attrs(block_id, labels::HEADING),
            text,
            tag = level.tag()
        ),
        PageBlockContent::Text { content } => format!(
            "<p {}>{}</p>",
            field_attrs(block_id, labels::TEXT_CONTENT),
            content
        ),
        PageBlockContent::Html { content } => format!(
            "<div {}>{}</div>",
            field_attrs(block_id, labels::HTML_CONTENT),
            content
        ),
        PageBlockContent::Image { url, alt } => format!(
            "<img {}=\"{}\" src=\"{}\" alt=\"{}\" style=\"max-width: 100%;\">",
            BLOCK_ATTR,
            block_id,
            escape_attr(url),
            escape_attr(alt)
        ),
        PageBlockContent::UserList => format!(
            "<div {}=\"{}\"><em>User List (dynamic content)</em></div>",
            BLOCK_ATTR, block_id
        ),
        PageBlockContent::Unknown { block_type } => format!(
            "<div class=\"preview-unknown\" {}=\"{}\"><em>Unknown block type: {}</em></div>",
            BLOCK_ATTR,
            block_id,
            escape_attr(block_type)
        ),
    }
}

async fn read_optional(
    store: &dyn ContentStore,
    model: &str,
    component_id: Option<ComponentId>,
    field: &str,
    locale: &str,
) -> StoreResult<String> {
    match component_id {
        Some(id) => store.read_field(model, id, field, locale).await,
        None => Ok(String::new()),
    }
}

/// Read the values of one block at `locale`.
pub async fn load_block_content(
    store: &dyn ContentStore,
    block: &Block,
    locale: &str,
) -> StoreResult<PageBlockContent> {
    let content = match &block.kind {
        BlockKind::Hero {
            title,
            subtitle,
            button_text,
        } => PageBlockContent::Hero {
            title: read_optional(store, models::TITLE, *title, models::TITLE_FIELD, locale).await?,
            subtitle: read_optional(store, models::TITLE, *subtitle, models::TITLE_FIELD, locale)
                .await?,
            button_text: read_optional(
                store,
                models::TITLE,
                *button_text,
                models::TITLE_FIELD,
                locale,
            )
            .await?,
        },
        BlockKind::Heading { title, level } => PageBlockContent::Heading {
            text: read_optional(store, models::TITLE, *title, models::TITLE_FIELD, locale).await?,
            level: *level,
        },
        BlockKind::Text { content } => PageBlockContent::Text {
            content: read_optional(store, models::TEXT, *content, models::CONTENT_FIELD, locale)
                .await?,
        },
        BlockKind::Html { content } => PageBlockContent::Html {
            content: read_optional(store, models::HTML, *content, models::CONTENT_FIELD, locale)
                .await?,
        },
        BlockKind::Image { image } => PageBlockContent::Image {
            url: read_optional(store, models::IMAGE, *image, models::IMAGE_URL_FIELD, locale)
                .await?,
            alt: read_optional(store, models::IMAGE, *image, models::IMAGE_ALT_FIELD, locale)
                .await?,
        },
        BlockKind::UserList => PageBlockContent::UserList,
        BlockKind::Unknown { block_type } => {
            warn!(
                "Block {} ({}) has unknown type '{}', rendering placeholder",
                block.id, block.name, block_type
            );
            PageBlockContent::Unknown {
                block_type: block_type.clone(),
            }
        }
    };
    Ok(content)
}

/// Render every block of a page at `locale`, in sequence order.
pub async fn load_page_overview(
    store: &dyn ContentStore,
    page_id: PageId,
    locale: &str,
) -> StoreResult<Vec<BlockFragment>> {
    let page = store.read_page(page_id).await?;
    let mut blocks = Vec::with_capacity(page.block_ids.len());
    for block_id in &page.block_ids {
        blocks.push(Block::from(store.read_block(*block_id).await?));
    }
    sort_for_render(&mut blocks);

    let mut fragments = Vec::with_capacity(blocks.len());
    for block in &blocks {
        let content = load_block_content(store, block, locale).await?;
        fragments.push(BlockFragment {
            block_id: block.id,
            block_type: block.kind.type_name().to_string(),
            markup: render_block(block.id, &content),
        });
    }

    debug!(
        "Rendered page {} overview in {}: {} blocks",
        page_id,
        locale,
        fragments.len()
    );
    Ok(fragments)
}
