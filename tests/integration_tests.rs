//! Integration tests for the translation preview
//!
//! These tests load a content fixture from disk and drive a session, the
//! preview and the highlight synchronizer together.

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use cms_translation_preview::blocks::models;
use cms_translation_preview::config::SessionConfig;
use cms_translation_preview::highlight::{HighlightSynchronizer, MountedPreview};
use cms_translation_preview::locale::Locale;
use cms_translation_preview::notify::NotificationLevel;
use cms_translation_preview::preview::{load_page_overview, FragmentKey};
use cms_translation_preview::session::{LoadOutcome, SessionState, TranslationSession, WriteOutcome};
use cms_translation_preview::store::MemoryStore;

// ==================== Test Helpers ====================

const FIXTURE: &str = r#"{
  "locales": [
    {"code": "en_US", "name": "English"},
    {"code": "fr_FR", "name": "French"},
    {"code": "de_DE", "name": "German"},
    {"code": "es_ES", "name": "Spanish", "active": false}
  ],
  "pages": [
    {"id": 1, "name": "Home", "block_ids": [44, 43, 42]}
  ],
  "blocks": [
    {"id": 42, "name": "Hero", "type": "hero", "sequence": 1,
     "refs": {"hero_title_id": 100, "hero_subtitle_id": 101, "hero_button_text_id": 102}},
    {"id": 43, "name": "Intro", "type": "text", "sequence": 2,
     "refs": {"text_component_id": 200}},
    {"id": 44, "name": "Features", "type": "html", "sequence": 3,
     "refs": {"html_component_id": 300}}
  ],
  "values": [
    {"model": "cms.block.title", "id": 100, "field": "title", "locale": "en_US", "value": "Hello"},
    {"model": "cms.block.title", "id": 100, "field": "title", "locale": "fr_FR", "value": "Bonjour"},
    {"model": "cms.block.title", "id": 100, "field": "title", "locale": "de_DE", "value": "Hallo"},
    {"model": "cms.block.title", "id": 101, "field": "title", "locale": "en_US", "value": "Build pages fast"},
    {"model": "cms.block.title", "id": 102, "field": "title", "locale": "en_US", "value": "Get started"},
    {"model": "cms.block.text", "id": 200, "field": "content", "locale": "en_US", "value": "<p>Welcome</p>"},
    {"model": "cms.block.html", "id": 300, "field": "content", "locale": "en_US", "value": "<ul><li>Fast</li></ul>"}
  ]
}"#;

/// Write the fixture to a temp dir and load a store from it.
fn load_store(temp_dir: &TempDir) -> Arc<MemoryStore> {
    let path = temp_dir.path().join("site.json");
    std::fs::write(&path, FIXTURE).expect("Failed to write fixture");
    Arc::new(MemoryStore::from_json_file(&path).expect("Failed to load fixture"))
}

fn open_session(store: &Arc<MemoryStore>) -> TranslationSession {
    TranslationSession::new(store.clone(), 1, SessionConfig::default())
}

// ==================== Session Tests ====================

#[tokio::test]
async fn test_fixture_session_picks_first_locale() {
    let temp_dir = TempDir::new().unwrap();
    let store = load_store(&temp_dir);
    let session = open_session(&store);

    let languages = session.load_languages().await;

    let codes: Vec<_> = languages.iter().map(|l| l.code.as_str()).collect();
    assert_eq!(codes, vec!["fr_FR", "de_DE"]);
    assert_eq!(session.active_locale().as_deref(), Some("fr_FR"));
    assert_eq!(session.state(), SessionState::Ready);

    let rows = session.rows();
    let labels: Vec<_> = rows
        .iter()
        .map(|r| (r.block_id, r.field_label.as_str()))
        .collect();
    assert_eq!(
        labels,
        vec![
            (42, "Hero Title"),
            (42, "Hero Subtitle"),
            (42, "Button Text"),
            (43, "Text Content"),
            (44, "HTML Content"),
        ]
    );
    assert_eq!(rows[0].source_value, "Hello");
    assert_eq!(rows[0].translated_value, "Bonjour");
    // Untranslated fields fall back to the baseline text
    assert_eq!(rows[2].translated_value, "Get started");
    assert!(!rows[3].is_html);
    assert!(rows[4].is_html);
}

#[tokio::test]
async fn test_edit_persists_and_updates_preview() {
    let temp_dir = TempDir::new().unwrap();
    let store = load_store(&temp_dir);
    let session = open_session(&store);
    session.set_active_locale("fr_FR").await;

    let outcome = session.update_row(0, "<p>Nouveau titre</p>").await.unwrap();

    assert_eq!(outcome, WriteOutcome::Saved);
    assert_eq!(session.rows()[0].translated_value, "Nouveau titre");
    assert_eq!(
        store.value(models::TITLE, 100, models::TITLE_FIELD, "fr_FR").as_deref(),
        Some("Nouveau titre")
    );
    assert_eq!(
        store.value(models::TITLE, 100, models::TITLE_FIELD, "en_US").as_deref(),
        Some("Hello")
    );
    assert!(session
        .preview_document()
        .contains("<h1 class=\"preview-hero-title\">Nouveau titre</h1>"));
}

#[tokio::test]
async fn test_html_row_keeps_markup() {
    let temp_dir = TempDir::new().unwrap();
    let store = load_store(&temp_dir);
    let session = open_session(&store);
    session.set_active_locale("de_DE").await;

    session
        .update_row(4, "<p><strong>Schnell</strong></p>")
        .await
        .unwrap();

    assert_eq!(
        store.value(models::HTML, 300, models::CONTENT_FIELD, "de_DE").as_deref(),
        Some("<p><strong>Schnell</strong></p>")
    );
}

#[tokio::test]
async fn test_failed_write_keeps_value_and_notifies() {
    let temp_dir = TempDir::new().unwrap();
    let store = load_store(&temp_dir);
    let session = open_session(&store);
    session.set_active_locale("fr_FR").await;
    let mut notifications = session.subscribe();

    store.set_fail_writes(true);
    let outcome = session.update_row(1, "Créez vite").await.unwrap();

    assert_eq!(outcome, WriteOutcome::Failed);
    assert_eq!(session.rows()[1].translated_value, "Créez vite");
    let notification = notifications.try_recv().unwrap();
    assert_eq!(notification.level, NotificationLevel::Danger);
}

#[tokio::test(start_paused = true)]
async fn test_quick_locale_switch_keeps_last_choice() {
    let temp_dir = TempDir::new().unwrap();
    let store = load_store(&temp_dir);
    store.set_read_delay("fr_FR", Duration::from_millis(300));
    store.set_read_delay("de_DE", Duration::from_millis(50));
    let session = open_session(&store);

    let (first, second) = tokio::join!(
        session.set_active_locale("fr_FR"),
        session.set_active_locale("de_DE")
    );

    assert_eq!(first, LoadOutcome::Superseded);
    assert_eq!(second, LoadOutcome::Applied { rows: 5 });
    assert_eq!(session.active_locale().as_deref(), Some("de_DE"));
    assert_eq!(session.rows()[0].translated_value, "Hallo");
    assert_eq!(session.metrics_report().stale_loads_discarded, 1);
}

#[tokio::test]
async fn test_finish_closes_session() {
    let temp_dir = TempDir::new().unwrap();
    let store = load_store(&temp_dir);
    let session = open_session(&store);
    session.load_languages().await;
    let mut notifications = session.subscribe();

    session.finish();

    assert_eq!(session.state(), SessionState::Closed);
    let notification = notifications.try_recv().unwrap();
    assert_eq!(notification.level, NotificationLevel::Success);
    assert_eq!(notification.message, "Translations saved");
}

#[tokio::test]
async fn test_block_matrix_across_locales() {
    let temp_dir = TempDir::new().unwrap();
    let store = load_store(&temp_dir);
    let session = open_session(&store);

    let lines = session
        .block_matrix(
            42,
            &[Locale::new("en_US", "English"), Locale::new("fr_FR", "French")],
        )
        .await
        .unwrap();

    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0].field_label, "Hero Title");
    assert_eq!(lines[0].value, "Hello");
    assert_eq!(lines[1].locale, "fr_FR");
    assert_eq!(lines[1].value, "Bonjour");
}

// ==================== Preview Tests ====================

#[tokio::test]
async fn test_page_overview_from_fixture() {
    let temp_dir = TempDir::new().unwrap();
    let store = load_store(&temp_dir);

    let fragments = load_page_overview(store.as_ref(), 1, "fr_FR").await.unwrap();

    let types: Vec<_> = fragments.iter().map(|f| f.block_type.as_str()).collect();
    assert_eq!(types, vec!["hero", "text", "html"]);
    assert!(fragments[0].markup.contains("Bonjour"));
}

#[tokio::test]
async fn test_preview_fragments_follow_rows() {
    let temp_dir = TempDir::new().unwrap();
    let store = load_store(&temp_dir);
    let session = open_session(&store);
    session.set_active_locale("fr_FR").await;

    let fragments = session.preview();

    assert_eq!(fragments.len(), 5);
    assert_eq!(fragments[2].key, FragmentKey::new(42, "Button Text"));
    assert!(fragments[2]
        .markup
        .contains("data-block-id=\"42\" data-field=\"Button Text\""));
    assert!(fragments[4].markup.contains("<ul><li>Fast</li></ul>"));
}

// ==================== Highlight Tests ====================

#[tokio::test]
async fn test_hover_button_row_highlights_its_fragment() {
    let temp_dir = TempDir::new().unwrap();
    let store = load_store(&temp_dir);
    let session = open_session(&store);
    session.set_active_locale("fr_FR").await;
    let sync = HighlightSynchronizer::for_session(&session, MountedPreview::new());
    sync.render_now();

    sync.on_row_hover_enter_row(&session.rows()[0]);
    let found = sync.on_row_hover_enter_row(&session.rows()[2]);

    assert!(found);
    sync.with_surface(|surface| {
        assert_eq!(
            surface.highlighted(),
            vec![&FragmentKey::new(42, "Button Text")]
        );
    });

    sync.on_row_hover_leave();
    sync.with_surface(|surface| assert!(surface.highlighted().is_empty()));
}

#[tokio::test(start_paused = true)]
async fn test_edit_then_mutation_rebuilds_preview_once() {
    let temp_dir = TempDir::new().unwrap();
    let store = load_store(&temp_dir);
    let session = open_session(&store);
    session.set_active_locale("fr_FR").await;
    let sync = HighlightSynchronizer::for_session(&session, MountedPreview::new());
    sync.render_now();
    sync.on_row_hover_enter(&FragmentKey::new(42, "Hero Title"));

    for text in ["N", "Nou", "Nouveau", "Nouveau titre"] {
        session.update_row(0, text).await.unwrap();
        sync.on_content_mutated();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(Duration::from_millis(600)).await;
    tokio::task::yield_now().await;

    assert_eq!(session.metrics().preview_rebuilds(), 2);
    sync.with_surface(|surface| {
        let title = surface.query(&FragmentKey::new(42, "Hero Title"));
        assert_eq!(title.len(), 1);
        assert!(title[0].markup.contains("Nouveau titre"));
        assert_eq!(
            surface.highlighted(),
            vec![&FragmentKey::new(42, "Hero Title")]
        );
    });
}
