use anyhow::{Context, Result};
use cms_translation_preview::config::Config;
use cms_translation_preview::preview::load_page_overview;
use cms_translation_preview::session::{LoadOutcome, TranslationSession};
use cms_translation_preview::store::{ContentStore, MemoryStore};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cms_translation_preview=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting translation preview");

    // Load configuration from environment
    let config = Config::from_env()?;

    // Step 1: Load the content fixture
    let store: Arc<dyn ContentStore> = Arc::new(
        MemoryStore::from_json_file(&config.fixture_path)
            .with_context(|| format!("Failed to load fixture {}", config.fixture_path))?
            .with_baseline_locale(&config.session.baseline_locale),
    );

    // Step 2: Page overview in the baseline locale
    let overview = load_page_overview(
        store.as_ref(),
        config.page_id,
        &config.session.baseline_locale,
    )
    .await?;
    info!(
        "Page {} has {} blocks in the overview",
        config.page_id,
        overview.len()
    );

    // Step 3: Open a session and load rows for the chosen locale
    let session = TranslationSession::new(store, config.page_id, config.session.clone());
    if let Some(locale) = &config.locale {
        if let LoadOutcome::Failed = session.set_active_locale(locale).await {
            warn!("Rows for {} could not be loaded", locale);
        }
    }
    // Picks the first locale when none was chosen
    session.load_languages().await;

    match session.active_locale() {
        Some(locale) => info!("Editing {} rows in {}", session.rows().len(), locale),
        None => warn!("No locale to translate into"),
    }

    // Step 4: Render the preview
    println!("{}", session.preview_document());

    session.finish();
    info!(
        "Session metrics: {}",
        serde_json::to_string(&session.metrics_report())?
    );
    Ok(())
}
