use anyhow::{anyhow, Context};
use backend_api::{init_tracing, run_server, AppState, CachedHoldingsRepository};
use holdings_pipeline::{HoldingsPipeline, HoldingsSource, PipelineOptions};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Environment variables with sane defaults
    let settings_path = PathBuf::from(
        env::var("HOLDINGS_SETTINGS").unwrap_or_else(|_| "settings.json".to_string()),
    );
    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);

    let mut settings = settings_loader::load_settings_with_fallback(Some(&settings_path))
        .context("Failed to load settings")?;
    settings_loader::apply_env_overrides(&mut settings);
    settings_loader::validate_settings(&settings).context("Invalid settings")?;

    let source_settings = settings.source.as_ref().ok_or_else(|| {
        anyhow!(
            "No holdings source configured. Add a \"source\" entry to {}",
            settings_path.display()
        )
    })?;
    let source: Arc<dyn HoldingsSource> = Arc::from(holdings_sources::source_from_settings(
        source_settings,
        &settings.worksheet_identifier,
    ));

    tracing::info!(
        source = %source.describe(),
        ttl_seconds = settings.cache_ttl_seconds,
        gated = settings.access.access_code.is_some(),
        "holdings server configured"
    );

    let repo = Arc::new(CachedHoldingsRepository::new(
        source,
        HoldingsPipeline::new(PipelineOptions::from_settings(&settings)),
        Duration::from_secs(settings.cache_ttl_seconds),
    ));
    let state = AppState::new(repo, &settings);

    // Start the server
    run_server(state, &host, port).await?;

    Ok(())
}
