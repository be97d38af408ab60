//! Highlight synchronization between editing rows and preview fragments.
//!
//! Hovering a row highlights the fragment with the same `(block id, field
//! label)` key and scrolls it into view; leaving clears every highlight. At
//! most one key is highlighted at any time.
//!
//! The host surface reports content changes through
//! [`HighlightSynchronizer::on_content_mutated`]. Rebuilds are debounced on the
//! trailing edge: every mutation restarts the quiet period and at most one
//! rebuild is pending. Scheduling needs a running tokio runtime.

use crate::metrics::SessionMetrics;
use crate::preview::{selector_for, FragmentKey, PreviewFragment};
use crate::session::{TranslationRow, TranslationSession};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

pub const HIGHLIGHT_CLASS: &str = "highlighted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAlign {
    Start,
    Center,
    End,
    Nearest,
}

/// Mount point for the rendered preview.
///
/// Elements are addressed only by their fragment key.
pub trait PreviewSurface: Send {
    /// Replace everything mounted with `fragments`.
    fn mount(&mut self, fragments: &[PreviewFragment]);

    /// Add the highlight class to the element for `key`. Returns false when absent.
    fn add_highlight(&mut self, key: &FragmentKey) -> bool;

    /// Remove the highlight class from every element.
    fn clear_highlights(&mut self);

    fn scroll_into_view(&mut self, key: &FragmentKey, behavior: ScrollBehavior, align: ScrollAlign);
}

// ==================== In-memory surface ====================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedElement {
    pub key: FragmentKey,
    pub markup: String,
    pub classes: BTreeSet<String>,
}

/// A preview surface kept in memory, one element per mounted fragment.
#[derive(Debug, Default)]
pub struct MountedPreview {
    elements: Vec<MountedElement>,
    last_scroll: Option<(FragmentKey, ScrollBehavior, ScrollAlign)>,
    mounts: usize,
}

impl MountedPreview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[MountedElement] {
        &self.elements
    }

    /// Elements matching `[data-block-id][data-field]` for `key`.
    pub fn query(&self, key: &FragmentKey) -> Vec<&MountedElement> {
        self.elements.iter().filter(|el| &el.key == key).collect()
    }

    pub fn highlighted(&self) -> Vec<&FragmentKey> {
        self.elements
            .iter()
            .filter(|el| el.classes.contains(HIGHLIGHT_CLASS))
            .map(|el| &el.key)
            .collect()
    }

    pub fn last_scroll(&self) -> Option<&(FragmentKey, ScrollBehavior, ScrollAlign)> {
        self.last_scroll.as_ref()
    }

    /// Number of times fragments were mounted.
    pub fn mounts(&self) -> usize {
        self.mounts
    }
}

impl PreviewSurface for MountedPreview {
    fn mount(&mut self, fragments: &[PreviewFragment]) {
        self.elements = fragments
            .iter()
            .map(|f| MountedElement {
                key: f.key.clone(),
                markup: f.markup.clone(),
                classes: BTreeSet::new(),
            })
            .collect();
        self.mounts += 1;
    }

    fn add_highlight(&mut self, key: &FragmentKey) -> bool {
        match self.elements.iter_mut().find(|el| &el.key == key) {
            Some(element) => {
                element.classes.insert(HIGHLIGHT_CLASS.to_string());
                true
            }
            None => false,
        }
    }

    fn clear_highlights(&mut self) {
        for element in &mut self.elements {
            element.classes.remove(HIGHLIGHT_CLASS);
        }
    }

    fn scroll_into_view(&mut self, key: &FragmentKey, behavior: ScrollBehavior, align: ScrollAlign) {
        self.last_scroll = Some((key.clone(), behavior, align));
    }
}

// ==================== Debounce ====================

/// Trailing-edge debouncer: runs the last scheduled action once the quiet
/// period has elapsed without a new schedule.
pub struct Debouncer {
    quiet: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: Mutex::new(None),
        }
    }

    fn pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cancel any pending action and schedule `action` after the quiet period.
    pub fn schedule<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let quiet = self.quiet;
        let mut pending = self.pending();
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            action();
        }));
    }

    pub fn cancel(&self) {
        if let Some(previous) = self.pending().take() {
            previous.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ==================== Synchronizer ====================

/// Which key is highlighted, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightState {
    active: Option<FragmentKey>,
}

impl HighlightState {
    pub fn active(&self) -> Option<&FragmentKey> {
        self.active.as_ref()
    }
}

type RebuildFn = dyn Fn() -> Vec<PreviewFragment> + Send + Sync;

/// Everything a rebuild touches, shared with the debounced task.
struct RenderTarget<S> {
    surface: Arc<Mutex<S>>,
    state: Arc<Mutex<HighlightState>>,
    rebuild: Arc<RebuildFn>,
    metrics: Option<Arc<SessionMetrics>>,
}

impl<S> Clone for RenderTarget<S> {
    fn clone(&self) -> Self {
        Self {
            surface: Arc::clone(&self.surface),
            state: Arc::clone(&self.state),
            rebuild: Arc::clone(&self.rebuild),
            metrics: self.metrics.clone(),
        }
    }
}

impl<S: PreviewSurface> RenderTarget<S> {
    fn surface(&self) -> MutexGuard<'_, S> {
        self.surface.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn state(&self) -> MutexGuard<'_, HighlightState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Rebuild, mount, and put the active highlight back on its new element.
    fn render(&self) {
        let fragments = (self.rebuild)();

        // Surface lock first: a hover change cannot land between reading the key and mounting
        let mut surface = self.surface();
        let active = self.state().active.clone();
        surface.mount(&fragments);
        if let Some(key) = active {
            surface.add_highlight(&key);
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_preview_rebuild();
        }
        debug!("Preview rebuilt: {} fragments", fragments.len());
    }
}

/// Binds row hover events and content mutations to a preview surface.
pub struct HighlightSynchronizer<S> {
    target: RenderTarget<S>,
    debouncer: Debouncer,
    detached: AtomicBool,
}

impl<S: PreviewSurface + 'static> HighlightSynchronizer<S> {
    /// Synchronize `surface` with fragments produced by `rebuild`.
    pub fn new<F>(surface: S, quiet: Duration, rebuild: F) -> Self
    where
        F: Fn() -> Vec<PreviewFragment> + Send + Sync + 'static,
    {
        Self {
            target: RenderTarget {
                surface: Arc::new(Mutex::new(surface)),
                state: Arc::new(Mutex::new(HighlightState::default())),
                rebuild: Arc::new(rebuild),
                metrics: None,
            },
            debouncer: Debouncer::new(quiet),
            detached: AtomicBool::new(false),
        }
    }

    /// Synchronize `surface` with a session's preview, using its debounce period.
    pub fn for_session(session: &TranslationSession, surface: S) -> Self {
        let source = session.clone();
        let mut sync = Self::new(surface, session.config().preview_debounce, move || {
            source.preview()
        });
        sync.target.metrics = Some(session.metrics());
        sync
    }

    /// Rebuild and mount immediately, cancelling any pending rebuild.
    pub fn render_now(&self) {
        if self.is_detached() {
            return;
        }
        self.debouncer.cancel();
        self.target.render();
    }

    /// Highlight the fragment for `key`, clearing any previous highlight.
    ///
    /// Returns whether a matching fragment was found.
    pub fn on_row_hover_enter(&self, key: &FragmentKey) -> bool {
        if self.is_detached() {
            return false;
        }
        self.target.state().active = Some(key.clone());

        let mut surface = self.target.surface();
        surface.clear_highlights();
        let found = surface.add_highlight(key);
        if found {
            surface.scroll_into_view(key, ScrollBehavior::Smooth, ScrollAlign::Center);
        } else {
            debug!("No preview fragment matches {}", selector_for(key));
        }
        found
    }

    pub fn on_row_hover_enter_row(&self, row: &TranslationRow) -> bool {
        self.on_row_hover_enter(&row.key())
    }

    /// Clear the highlight. Safe to call when nothing is highlighted.
    pub fn on_row_hover_leave(&self) {
        self.target.state().active = None;
        self.target.surface().clear_highlights();
    }

    /// Report a structural change of the authoring surface.
    pub fn on_content_mutated(&self) {
        if self.is_detached() {
            return;
        }
        let target = self.target.clone();
        self.debouncer.schedule(move || target.render());
    }

    pub fn highlighted(&self) -> Option<FragmentKey> {
        self.target.state().active.clone()
    }

    pub fn rebuild_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Inspect the surface.
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.target.surface())
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    /// Stop reacting: cancel the pending rebuild and clear the highlight.
    ///
    /// Later hovers, mutations and renders are ignored.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
        self.debouncer.cancel();
        self.on_row_hover_leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::FragmentKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fragments() -> Vec<PreviewFragment> {
        vec![
            PreviewFragment::new(FragmentKey::new(42, "Hero Title"), FragmentKind::Title, "Hi"),
            PreviewFragment::new(FragmentKey::new(42, "Button Text"), FragmentKind::Button, "Go"),
            PreviewFragment::new(FragmentKey::new(7, "Heading"), FragmentKind::Heading, "About"),
        ]
    }

    fn counting_sync(counter: Arc<AtomicUsize>) -> HighlightSynchronizer<MountedPreview> {
        let sync = HighlightSynchronizer::new(
            MountedPreview::new(),
            Duration::from_millis(500),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                fragments()
            },
        );
        sync.render_now();
        sync
    }

    // ==================== Hover Tests ====================

    #[tokio::test]
    async fn test_hover_highlights_exactly_one_fragment() {
        let sync = counting_sync(Arc::new(AtomicUsize::new(0)));
        let key = FragmentKey::new(42, "Button Text");

        assert!(sync.on_row_hover_enter(&key));
        sync.with_surface(|surface| {
            assert_eq!(surface.highlighted(), vec![&key]);
            assert_eq!(surface.query(&key).len(), 1);
            assert_eq!(
                surface.last_scroll(),
                Some(&(key.clone(), ScrollBehavior::Smooth, ScrollAlign::Center))
            );
        });
        assert_eq!(sync.highlighted(), Some(key));
    }

    #[tokio::test]
    async fn test_new_hover_replaces_previous_highlight() {
        let sync = counting_sync(Arc::new(AtomicUsize::new(0)));
        sync.on_row_hover_enter(&FragmentKey::new(42, "Hero Title"));
        sync.on_row_hover_enter(&FragmentKey::new(7, "Heading"));

        sync.with_surface(|surface| {
            assert_eq!(surface.highlighted(), vec![&FragmentKey::new(7, "Heading")]);
        });
    }

    #[tokio::test]
    async fn test_hover_leave_clears_and_is_idempotent() {
        let sync = counting_sync(Arc::new(AtomicUsize::new(0)));
        sync.on_row_hover_leave();
        sync.on_row_hover_enter(&FragmentKey::new(42, "Hero Title"));
        sync.on_row_hover_leave();
        sync.on_row_hover_leave();

        assert_eq!(sync.highlighted(), None);
        sync.with_surface(|surface| assert!(surface.highlighted().is_empty()));
    }

    #[tokio::test]
    async fn test_hover_on_missing_fragment() {
        let sync = counting_sync(Arc::new(AtomicUsize::new(0)));
        sync.on_row_hover_enter(&FragmentKey::new(42, "Hero Title"));

        assert!(!sync.on_row_hover_enter(&FragmentKey::new(99, "Heading")));
        sync.with_surface(|surface| {
            assert!(surface.highlighted().is_empty());
        });
    }

    // ==================== Debounce Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_mutation_burst_rebuilds_once_after_quiet_period() {
        let counter = Arc::new(AtomicUsize::new(0));
        let sync = counting_sync(counter.clone());
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        for _ in 0..5 {
            sync.on_content_mutated();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        // Last mutation at t=400ms; now t=500ms
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(sync.rebuild_pending());

        tokio::time::sleep(Duration::from_millis(399)).await;
        tokio::task::yield_now().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(!sync.rebuild_pending());
        sync.with_surface(|surface| assert_eq!(surface.mounts(), 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rebuild_reapplies_active_highlight() {
        let sync = counting_sync(Arc::new(AtomicUsize::new(0)));
        let key = FragmentKey::new(42, "Button Text");
        sync.on_row_hover_enter(&key);

        sync.on_content_mutated();
        tokio::time::sleep(Duration::from_millis(600)).await;
        tokio::task::yield_now().await;

        sync.with_surface(|surface| {
            assert_eq!(surface.mounts(), 2);
            assert_eq!(surface.highlighted(), vec![&key]);
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_rebuild_after_leave_does_not_restore_highlight() {
        let sync = counting_sync(Arc::new(AtomicUsize::new(0)));
        sync.on_row_hover_enter(&FragmentKey::new(42, "Button Text"));
        sync.on_content_mutated();
        sync.on_row_hover_leave();

        tokio::time::sleep(Duration::from_millis(600)).await;
        tokio::task::yield_now().await;

        sync.with_surface(|surface| {
            assert_eq!(surface.mounts(), 2);
            assert!(surface.highlighted().is_empty());
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_detach_cancels_pending_rebuild() {
        let counter = Arc::new(AtomicUsize::new(0));
        let sync = counting_sync(counter.clone());
        sync.on_row_hover_enter(&FragmentKey::new(7, "Heading"));

        sync.on_content_mutated();
        sync.detach();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(sync.highlighted(), None);

        // Detached: nothing schedules, renders or highlights any more
        sync.on_content_mutated();
        assert!(!sync.rebuild_pending());
        tokio::time::sleep(Duration::from_secs(1)).await;
        sync.render_now();
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        assert!(!sync.on_row_hover_enter(&FragmentKey::new(7, "Heading")));
        assert_eq!(sync.highlighted(), None);
        sync.with_surface(|surface| assert!(surface.highlighted().is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_runs_only_last_action() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let log = log.clone();
            debouncer.schedule(move || log.lock().unwrap().push(i));
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(*log.lock().unwrap(), vec![2]);
    }
}
