//! Translation session: per-locale rows for one page, loaded from and saved to
//! the content store.
//!
//! The session is a cheap, clonable handle. All state sits behind one mutex
//! that is never held across an await, so a locale change issued while a load
//! is in flight can supersede it. Every load carries a generation number and
//! its originating locale; a result that no longer matches the session is
//! discarded.
//!
//! Edits are optimistic: the row value changes immediately and the write goes
//! out right after. Writes to the same row run one at a time in issue order,
//! and a write that was overtaken by a newer edit of the same row is skipped.

use crate::blocks::{
    fields_for, is_html, normalize_edit, sort_for_render, Block, BlockId, BlockKind, ComponentId,
    PageId, TranslatableField,
};
use crate::config::SessionConfig;
use crate::error::{SessionError, StoreError, StoreResult};
use crate::locale::Locale;
use crate::metrics::{MetricsReport, SessionMetrics};
use crate::notify::{Notification, Notifier};
use crate::preview::{build_fragments, render_document, FragmentKey, PreviewFragment};
use crate::store::ContentStore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    LoadingLanguages,
    LoadingTranslations,
    Ready,
    /// The editor finished; all edits were already persisted
    Closed,
}

/// One editable (block, field) pair for the active locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationRow {
    pub block_id: BlockId,
    pub block_name: String,
    pub field_label: String,
    /// Value in the baseline locale
    pub source_value: String,
    /// Value in the active locale
    pub translated_value: String,
    /// Whether the source carries real markup; selects the edit normalization
    pub is_html: bool,
    pub component_model: String,
    pub component_id: ComponentId,
    pub component_field: String,
}

impl TranslationRow {
    pub fn key(&self) -> FragmentKey {
        FragmentKey::new(self.block_id, self.field_label.clone())
    }
}

/// Blocks and rows read for one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedTranslations {
    pub locale: String,
    /// Blocks in render order, image and user list blocks removed
    pub blocks: Vec<Block>,
    pub rows: Vec<TranslationRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Rows were replaced with the loaded set
    Applied { rows: usize },
    /// The load failed; the session now has no rows
    Failed,
    /// The active locale changed before the load finished; result discarded
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Saved,
    /// The store refused the write; the edited value stays in the row
    Failed,
    /// A newer edit of the same row was issued before this one was sent
    Superseded,
}

/// One line of the single-block, multi-locale view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixLine {
    pub field_label: String,
    pub locale: String,
    pub value: String,
    pub component_model: String,
    pub component_id: ComponentId,
    pub component_field: String,
}

type LaneKey = (String, FragmentKey);

/// Write lane of one row in one locale.
struct RowLane {
    issued: u64,
    lock: Arc<tokio::sync::Mutex<()>>,
}

struct Inner {
    state: SessionState,
    languages: Vec<Locale>,
    active_locale: Option<String>,
    blocks: Vec<Block>,
    rows: Vec<TranslationRow>,
    load_generation: u64,
    lanes: HashMap<LaneKey, RowLane>,
}

struct Shared {
    store: Arc<dyn ContentStore>,
    page_id: PageId,
    config: SessionConfig,
    inner: Mutex<Inner>,
    notifier: Notifier,
    metrics: Arc<SessionMetrics>,
}

/// Handle to a translation session for one page.
#[derive(Clone)]
pub struct TranslationSession {
    shared: Arc<Shared>,
}

struct PendingWrite {
    block_id: BlockId,
    field_label: String,
    model: String,
    component_id: ComponentId,
    field: String,
    locale: String,
    value: String,
    sequence: u64,
    lane_key: LaneKey,
    lane: Arc<tokio::sync::Mutex<()>>,
}

impl TranslationSession {
    pub fn new(store: Arc<dyn ContentStore>, page_id: PageId, config: SessionConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                page_id,
                config,
                inner: Mutex::new(Inner {
                    state: SessionState::Idle,
                    languages: Vec::new(),
                    active_locale: None,
                    blocks: Vec::new(),
                    rows: Vec::new(),
                    load_generation: 0,
                    lanes: HashMap::new(),
                }),
                notifier: Notifier::new(),
                metrics: Arc::new(SessionMetrics::new()),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Nothing panics while holding this lock; recover the data if a caller did
        self.shared.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ==================== Accessors ====================

    pub fn page_id(&self) -> PageId {
        self.shared.page_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn languages(&self) -> Vec<Locale> {
        self.lock().languages.clone()
    }

    pub fn active_locale(&self) -> Option<String> {
        self.lock().active_locale.clone()
    }

    pub fn rows(&self) -> Vec<TranslationRow> {
        self.lock().rows.clone()
    }

    pub fn row(&self, index: usize) -> Option<TranslationRow> {
        self.lock().rows.get(index).cloned()
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.lock().blocks.clone()
    }

    /// Subscribe to out-of-band notifications (failed saves, load problems).
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.shared.notifier.subscribe()
    }

    pub fn metrics(&self) -> Arc<SessionMetrics> {
        Arc::clone(&self.shared.metrics)
    }

    pub fn metrics_report(&self) -> MetricsReport {
        self.shared.metrics.report()
    }

    // ==================== Loading ====================

    /// Load the active locales, excluding the baseline.
    ///
    /// A catalog failure is logged and yields an empty list. When no locale
    /// was chosen yet, the first one becomes active and its rows are loaded.
    pub async fn load_languages(&self) -> Vec<Locale> {
        {
            let mut inner = self.lock();
            // A translation load in flight owns the state until it lands
            if inner.state != SessionState::LoadingTranslations {
                inner.state = SessionState::LoadingLanguages;
            }
        }

        let baseline = &self.shared.config.baseline_locale;
        let languages = match self.shared.store.list_active_locales(baseline).await {
            Ok(languages) => languages,
            Err(source) => {
                let err = SessionError::LocaleLoadFailure(source);
                warn!("{}", err);
                self.shared.metrics.record_load_failure();
                self.shared.notifier.warning(err.to_string());
                Vec::new()
            }
        };
        info!(
            "Loaded {} locales for page {}",
            languages.len(),
            self.shared.page_id
        );

        let first_choice = {
            let mut inner = self.lock();
            inner.languages = languages.clone();
            match (&inner.active_locale, languages.first()) {
                (None, Some(first)) => Some(first.code.clone()),
                _ => {
                    if inner.state == SessionState::LoadingLanguages {
                        inner.state = SessionState::Ready;
                    }
                    None
                }
            }
        };

        if let Some(code) = first_choice {
            self.set_active_locale(&code).await;
        }
        languages
    }

    /// Read the page's blocks and build rows for `locale` without touching the session.
    ///
    /// Any read failure fails the whole load, so callers never see a partial row list.
    pub async fn load_translations(&self, locale: &str) -> Result<LoadedTranslations, SessionError> {
        let store = self.shared.store.as_ref();
        let baseline = self.shared.config.baseline_locale.as_str();
        let load_failure = |source: StoreError| SessionError::TranslationLoadFailure {
            locale: locale.to_string(),
            source,
        };

        let page = store
            .read_page(self.shared.page_id)
            .await
            .map_err(load_failure)?;

        let mut blocks = Vec::with_capacity(page.block_ids.len());
        for block_id in &page.block_ids {
            let record = store.read_block(*block_id).await.map_err(load_failure)?;
            blocks.push(Block::from(record));
        }
        sort_for_render(&mut blocks);
        blocks.retain(|block| {
            !matches!(block.kind, BlockKind::Image { .. } | BlockKind::UserList)
        });

        let mut rows = Vec::new();
        for block in &blocks {
            if let BlockKind::Unknown { block_type } = &block.kind {
                let err = SessionError::UnknownBlockType {
                    block_id: block.id,
                    block_type: block_type.clone(),
                };
                warn!("{}, no rows for it", err);
                continue;
            }

            for field in fields_for(block) {
                let (source_value, translated_value) = futures::try_join!(
                    store.read_field(field.model, field.component_id, field.field, baseline),
                    store.read_field(field.model, field.component_id, field.field, locale),
                )
                .map_err(load_failure)?;

                rows.push(TranslationRow {
                    block_id: block.id,
                    block_name: block.name.clone(),
                    field_label: field.label.to_string(),
                    is_html: is_html(&source_value),
                    source_value,
                    translated_value,
                    component_model: field.model.to_string(),
                    component_id: field.component_id,
                    component_field: field.field.to_string(),
                });
            }
        }

        Ok(LoadedTranslations {
            locale: locale.to_string(),
            blocks,
            rows,
        })
    }

    /// Switch to `locale`, discard the current rows and rebuild them.
    ///
    /// Earlier edits are not lost: each was persisted when it was made.
    pub async fn set_active_locale(&self, locale: &str) -> LoadOutcome {
        let generation = {
            let mut inner = self.lock();
            inner.active_locale = Some(locale.to_string());
            inner.rows.clear();
            inner.blocks.clear();
            inner.state = SessionState::LoadingTranslations;
            inner.load_generation += 1;
            inner.load_generation
        };
        debug!(
            "Loading translations for page {} in {} (load #{})",
            self.shared.page_id, locale, generation
        );

        let result = self.load_translations(locale).await;

        let mut inner = self.lock();
        if inner.load_generation != generation || inner.active_locale.as_deref() != Some(locale) {
            debug!(
                "Discarding stale load #{} for {}; active locale is now {:?}",
                generation, locale, inner.active_locale
            );
            self.shared.metrics.record_stale_load();
            return LoadOutcome::Superseded;
        }

        inner.state = SessionState::Ready;
        match result {
            Ok(loaded) => {
                let count = loaded.rows.len();
                inner.blocks = loaded.blocks;
                inner.rows = loaded.rows;
                self.shared.metrics.record_translation_load();
                info!("Loaded {} translation rows in {}", count, locale);
                LoadOutcome::Applied { rows: count }
            }
            Err(err) => {
                warn!("{}", err);
                self.shared.metrics.record_load_failure();
                self.shared.notifier.warning(err.to_string());
                LoadOutcome::Failed
            }
        }
    }

    /// Reload the rows of the active locale, if any.
    pub async fn reload(&self) -> Option<LoadOutcome> {
        let locale = self.active_locale()?;
        Some(self.set_active_locale(&locale).await)
    }

    // ==================== Editing ====================

    /// Apply an edit to row `index` and persist it in the active locale.
    ///
    /// Plain rows are normalized (one `<div>` and one `<p>` wrapper stripped,
    /// then trimmed); HTML rows keep the raw value. A failed write keeps the
    /// edited value and is reported on the notification channel.
    pub async fn update_row(&self, index: usize, raw_value: &str) -> Result<WriteOutcome, SessionError> {
        let pending = self.stage_edit(index, raw_value)?;

        let _lane = pending.lane.lock().await;

        let latest = self
            .lock()
            .lanes
            .get(&pending.lane_key)
            .map(|lane| lane.issued)
            .unwrap_or(pending.sequence);
        if latest > pending.sequence {
            debug!(
                "Skipping write #{} of {}: edit #{} supersedes it",
                pending.sequence, pending.lane_key.1, latest
            );
            self.shared.metrics.record_superseded_write();
            return Ok(WriteOutcome::Superseded);
        }

        self.shared.metrics.record_field_write();
        let result = self
            .shared
            .store
            .write_field(
                &pending.model,
                pending.component_id,
                &pending.field,
                &pending.locale,
                &pending.value,
            )
            .await;

        match result {
            Ok(()) => {
                debug!(
                    "Saved {} of block {} in {}",
                    pending.field_label, pending.block_id, pending.locale
                );
                Ok(WriteOutcome::Saved)
            }
            Err(source) => {
                let err = SessionError::FieldWriteFailure {
                    block_id: pending.block_id,
                    field_label: pending.field_label,
                    source,
                };
                error!("{}", err);
                self.shared.metrics.record_write_failure();
                self.shared.notifier.danger(err.to_string());
                Ok(WriteOutcome::Failed)
            }
        }
    }

    /// Update the row in memory and reserve a slot in its write lane.
    fn stage_edit(&self, index: usize, raw_value: &str) -> Result<PendingWrite, SessionError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let len = inner.rows.len();

        let (Some(locale), Some(row)) = (inner.active_locale.clone(), inner.rows.get_mut(index))
        else {
            let err = SessionError::RowOutOfRange { index, len };
            warn!("{}", err);
            return Err(err);
        };

        row.translated_value = normalize_edit(raw_value, row.is_html);

        let lane_key = (locale.clone(), row.key());
        let lane = inner.lanes.entry(lane_key.clone()).or_insert_with(|| RowLane {
            issued: 0,
            lock: Arc::new(tokio::sync::Mutex::new(())),
        });
        lane.issued += 1;

        Ok(PendingWrite {
            block_id: row.block_id,
            field_label: row.field_label.clone(),
            model: row.component_model.clone(),
            component_id: row.component_id,
            field: row.component_field.clone(),
            locale,
            value: row.translated_value.clone(),
            sequence: lane.issued,
            lane_key,
            lane: Arc::clone(&lane.lock),
        })
    }

    /// Close the editor. Edits were saved as they were made.
    pub fn finish(&self) {
        self.lock().state = SessionState::Closed;
        self.shared.notifier.success("Translations saved");
        info!("Translation session for page {} closed", self.shared.page_id);
    }

    // ==================== Preview ====================

    /// Preview fragments for the current rows of the active locale.
    pub fn preview(&self) -> Vec<PreviewFragment> {
        let (blocks, rows, locale) = {
            let inner = self.lock();
            match &inner.active_locale {
                Some(locale) => (inner.blocks.clone(), inner.rows.clone(), locale.clone()),
                None => return Vec::new(),
            }
        };

        let values: HashMap<(&str, ComponentId, &str), &str> = rows
            .iter()
            .map(|row| {
                (
                    (
                        row.component_model.as_str(),
                        row.component_id,
                        row.component_field.as_str(),
                    ),
                    row.translated_value.as_str(),
                )
            })
            .collect();

        let lookup = |field: &TranslatableField, _locale: &str| {
            values
                .get(&(field.model, field.component_id, field.field))
                .map(|value| value.to_string())
        };
        build_fragments(&blocks, &locale, &lookup)
    }

    /// Full preview document for the current rows.
    pub fn preview_document(&self) -> String {
        render_document(&self.preview())
    }

    // ==================== Block matrix ====================

    /// Every translatable field of one block in each of `locales`.
    pub async fn block_matrix(
        &self,
        block_id: BlockId,
        locales: &[Locale],
    ) -> StoreResult<Vec<MatrixLine>> {
        let store = self.shared.store.as_ref();
        let block = Block::from(store.read_block(block_id).await?);

        let mut lines = Vec::new();
        for field in fields_for(&block) {
            for locale in locales {
                let value = store
                    .read_field(field.model, field.component_id, field.field, &locale.code)
                    .await?;
                lines.push(MatrixLine {
                    field_label: field.label.to_string(),
                    locale: locale.code.clone(),
                    value,
                    component_model: field.model.to_string(),
                    component_id: field.component_id,
                    component_field: field.field.to_string(),
                });
            }
        }
        Ok(lines)
    }
}
