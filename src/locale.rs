//! Locale type consumed from the content store's locale catalog.
//!
//! Locales are not managed here: the catalog is owned by the content store and
//! this crate only reads the active set. The baseline locale is the source of
//! truth every translation is compared against.

use serde::{Deserialize, Serialize};

/// Source-of-truth locale used for comparison and default display.
pub const BASELINE_LOCALE: &str = "en_US";

/// A locale as listed by the content store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locale {
    /// Locale code (e.g., "fr_FR", "es_ES")
    pub code: String,

    /// Display name (e.g., "French / Français")
    pub name: String,
}

impl Locale {
    /// Create a locale from a code and a display name.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// The baseline locale entry.
    pub fn baseline() -> Self {
        Self::new(BASELINE_LOCALE, "English (US)")
    }

    /// Check if this is the baseline locale.
    pub fn is_baseline(&self) -> bool {
        self.code == BASELINE_LOCALE
    }
}
