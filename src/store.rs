//! Content store adapter: the persistence boundary for pages, blocks and
//! locale-scoped field values.
//!
//! The real backend lives outside this crate. [`MemoryStore`] is an in-process
//! implementation loaded from a JSON fixture; it backs the `cms-preview`
//! binary and the tests, and can inject latency and failures.

use crate::blocks::{BlockId, BlockRecord, ComponentId, PageId};
use crate::error::{StoreError, StoreResult};
use crate::locale::{Locale, BASELINE_LOCALE};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;

/// A page and its block ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: PageId,
    pub name: String,
    #[serde(default)]
    pub block_ids: Vec<BlockId>,
}

/// Read/write access to pages, blocks and per-locale field values.
///
/// All methods may suspend on I/O. Implementations must be shareable across
/// tasks; a session holds one behind an `Arc`.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read one field of a sub-component as seen in `locale`.
    async fn read_field(
        &self,
        model: &str,
        component_id: ComponentId,
        field: &str,
        locale: &str,
    ) -> StoreResult<String>;

    /// Write one field of a sub-component in `locale`.
    async fn write_field(
        &self,
        model: &str,
        component_id: ComponentId,
        field: &str,
        locale: &str,
        value: &str,
    ) -> StoreResult<()>;

    async fn read_block(&self, block_id: BlockId) -> StoreResult<BlockRecord>;

    async fn read_page(&self, page_id: PageId) -> StoreResult<PageRecord>;

    /// Active locales in catalog order, without `excluding`.
    async fn list_active_locales(&self, excluding: &str) -> StoreResult<Vec<Locale>>;
}

// ==================== In-memory store ====================

#[derive(Debug, Clone, Deserialize)]
struct LocaleEntry {
    code: String,
    name: String,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
struct FieldValue {
    model: String,
    id: ComponentId,
    field: String,
    locale: String,
    value: String,
}

/// JSON fixture layout accepted by [`MemoryStore::from_json_str`].
#[derive(Debug, Clone, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    locales: Vec<LocaleEntry>,
    #[serde(default)]
    pages: Vec<PageRecord>,
    #[serde(default)]
    blocks: Vec<BlockRecord>,
    #[serde(default)]
    values: Vec<FieldValue>,
}

type ValueKey = (String, ComponentId, String, String);

/// A write accepted by the store, in completion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub model: String,
    pub component_id: ComponentId,
    pub field: String,
    pub locale: String,
    pub value: String,
}

#[derive(Default)]
struct Faults {
    fail_reads: bool,
    fail_locales: bool,
    fail_writes: bool,
    read_delays: HashMap<String, Duration>,
    write_delays: VecDeque<Duration>,
}

#[derive(Default)]
struct Inner {
    locales: Vec<LocaleEntry>,
    pages: HashMap<PageId, PageRecord>,
    blocks: HashMap<BlockId, BlockRecord>,
    values: HashMap<ValueKey, String>,
    writes: Vec<WriteRecord>,
    field_reads: usize,
    faults: Faults,
    /// Fallback locale for untranslated values; `BASELINE_LOCALE` when unset
    baseline: Option<String>,
}

/// In-memory content store.
///
/// Untranslated values fall back to the baseline locale, then to `""`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a JSON fixture with `locales`, `pages`, `blocks` and `values`.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let fixture: Fixture =
            serde_json::from_str(json).context("Failed to parse content store fixture")?;
        let store = Self::new();
        {
            let mut inner = store.lock();
            inner.locales = fixture.locales;
            inner.pages = fixture.pages.into_iter().map(|p| (p.id, p)).collect();
            inner.blocks = fixture.blocks.into_iter().map(|b| (b.id, b)).collect();
            inner.values = fixture
                .values
                .into_iter()
                .map(|v| ((v.model, v.id, v.field, v.locale), v.value))
                .collect();
        }
        Ok(store)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        Self::from_json_str(&json)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_locale(self, code: &str, name: &str) -> Self {
        self.lock().locales.push(LocaleEntry {
            code: code.to_string(),
            name: name.to_string(),
            active: true,
        });
        self
    }

    pub fn with_inactive_locale(self, code: &str, name: &str) -> Self {
        self.lock().locales.push(LocaleEntry {
            code: code.to_string(),
            name: name.to_string(),
            active: false,
        });
        self
    }

    /// Fall back to `code` instead of `BASELINE_LOCALE` for untranslated values.
    pub fn with_baseline_locale(self, code: &str) -> Self {
        self.lock().baseline = Some(code.to_string());
        self
    }

    pub fn with_page(self, page: PageRecord) -> Self {
        self.lock().pages.insert(page.id, page);
        self
    }

    pub fn with_block(self, block: BlockRecord) -> Self {
        self.lock().blocks.insert(block.id, block);
        self
    }

    pub fn with_value(
        self,
        model: &str,
        component_id: ComponentId,
        field: &str,
        locale: &str,
        value: &str,
    ) -> Self {
        self.set_value(model, component_id, field, locale, value);
        self
    }

    pub fn set_value(
        &self,
        model: &str,
        component_id: ComponentId,
        field: &str,
        locale: &str,
        value: &str,
    ) {
        self.lock().values.insert(
            (
                model.to_string(),
                component_id,
                field.to_string(),
                locale.to_string(),
            ),
            value.to_string(),
        );
    }

    /// Stored value for exactly this locale, without baseline fallback.
    pub fn value(
        &self,
        model: &str,
        component_id: ComponentId,
        field: &str,
        locale: &str,
    ) -> Option<String> {
        self.lock()
            .values
            .get(&(
                model.to_string(),
                component_id,
                field.to_string(),
                locale.to_string(),
            ))
            .cloned()
    }

    /// Writes applied so far, in completion order.
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.lock().writes.clone()
    }

    /// Number of `read_field` calls served.
    pub fn field_reads(&self) -> usize {
        self.lock().field_reads
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().faults.fail_reads = fail;
    }

    pub fn set_fail_locales(&self, fail: bool) {
        self.lock().faults.fail_locales = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().faults.fail_writes = fail;
    }

    /// Delay every field read in `locale`.
    pub fn set_read_delay(&self, locale: &str, delay: Duration) {
        self.lock()
            .faults
            .read_delays
            .insert(locale.to_string(), delay);
    }

    /// Delay the next write not yet issued; queued delays are consumed in issue order.
    pub fn push_write_delay(&self, delay: Duration) {
        self.lock().faults.write_delays.push_back(delay);
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn read_field(
        &self,
        model: &str,
        component_id: ComponentId,
        field: &str,
        locale: &str,
    ) -> StoreResult<String> {
        let delay = self.lock().faults.read_delays.get(locale).copied();
        if let Some(delay) = delay {
            sleep(delay).await;
        }

        let mut inner = self.lock();
        if inner.faults.fail_reads {
            return Err(StoreError::Transport("read refused".to_string()));
        }
        inner.field_reads += 1;

        let key = |loc: &str| {
            (
                model.to_string(),
                component_id,
                field.to_string(),
                loc.to_string(),
            )
        };
        let value = inner
            .values
            .get(&key(locale))
            .or_else(|| {
                let baseline = inner.baseline.as_deref().unwrap_or(BASELINE_LOCALE);
                inner.values.get(&key(baseline))
            })
            .cloned()
            .unwrap_or_default();
        Ok(value)
    }

    async fn write_field(
        &self,
        model: &str,
        component_id: ComponentId,
        field: &str,
        locale: &str,
        value: &str,
    ) -> StoreResult<()> {
        let delay = self.lock().faults.write_delays.pop_front();
        if let Some(delay) = delay {
            sleep(delay).await;
        }

        let mut inner = self.lock();
        if inner.faults.fail_writes {
            return Err(StoreError::Rejected("write refused".to_string()));
        }
        inner.values.insert(
            (
                model.to_string(),
                component_id,
                field.to_string(),
                locale.to_string(),
            ),
            value.to_string(),
        );
        inner.writes.push(WriteRecord {
            model: model.to_string(),
            component_id,
            field: field.to_string(),
            locale: locale.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    async fn read_block(&self, block_id: BlockId) -> StoreResult<BlockRecord> {
        let inner = self.lock();
        if inner.faults.fail_reads {
            return Err(StoreError::Transport("read refused".to_string()));
        }
        inner
            .blocks
            .get(&block_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                model: "cms.block".to_string(),
                id: block_id,
            })
    }

    async fn read_page(&self, page_id: PageId) -> StoreResult<PageRecord> {
        let inner = self.lock();
        if inner.faults.fail_reads {
            return Err(StoreError::Transport("read refused".to_string()));
        }
        inner
            .pages
            .get(&page_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                model: "cms.page".to_string(),
                id: page_id,
            })
    }

    async fn list_active_locales(&self, excluding: &str) -> StoreResult<Vec<Locale>> {
        let inner = self.lock();
        if inner.faults.fail_locales {
            return Err(StoreError::Transport("locale catalog unavailable".to_string()));
        }
        Ok(inner
            .locales
            .iter()
            .filter(|entry| entry.active && entry.code != excluding)
            .map(|entry| Locale::new(entry.code.clone(), entry.name.clone()))
            .collect())
    }
}
