use crate::blocks::PageId;
use crate::locale::BASELINE_LOCALE;
use anyhow::{Context, Result};
use std::time::Duration;

/// Quiet period before a content mutation triggers a preview rebuild
pub const DEFAULT_PREVIEW_DEBOUNCE: Duration = Duration::from_millis(500);

/// Settings for one translation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub baseline_locale: String,
    pub preview_debounce: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            baseline_locale: BASELINE_LOCALE.to_string(),
            preview_debounce: DEFAULT_PREVIEW_DEBOUNCE,
        }
    }
}

/// Configuration of the `cms-preview` binary.
#[derive(Debug, Clone)]
pub struct Config {
    // Content
    pub fixture_path: String,
    pub page_id: PageId,

    // Locales
    pub locale: Option<String>,

    // Session
    pub session: SessionConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let page_id = std::env::var("CMS_PAGE_ID").context("CMS_PAGE_ID not set")?;

        Ok(Self {
            fixture_path: std::env::var("CMS_FIXTURE").context("CMS_FIXTURE not set")?,
            page_id: page_id
                .trim()
                .parse()
                .with_context(|| format!("CMS_PAGE_ID is not a page id: {}", page_id))?,

            locale: std::env::var("CMS_LOCALE").ok().filter(|v| !v.is_empty()),

            session: SessionConfig {
                baseline_locale: std::env::var("CMS_BASELINE_LOCALE")
                    .unwrap_or_else(|_| BASELINE_LOCALE.to_string()),
                preview_debounce: std::env::var("CMS_PREVIEW_DEBOUNCE_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_PREVIEW_DEBOUNCE),
            },
        })
    }
}
