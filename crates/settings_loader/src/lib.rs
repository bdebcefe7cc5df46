//! # Settings Loader
//!
//! Centralized settings loading for the holdings dashboard. Settings live in a
//! `settings.json` file; every key has a default, so a missing file or an
//! empty object yields a working configuration.
//!
//! ## Features
//!
//! - Load settings from specified file paths
//! - Fall back to defaults when no settings file is found
//! - Override selected keys from the environment (and a `.env` file)
//! - Validate values before the pipeline uses them
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use settings_loader;
//! use std::path::PathBuf;
//!
//! // Load settings from a specific path
//! let mut settings = settings_loader::load_settings("config/settings.json")?;
//!
//! // Or fall back to ./settings.json, then to the defaults
//! let path = Some(PathBuf::from("settings.json"));
//! let mut settings = settings_loader::load_settings_with_fallback(path.as_ref())?;
//!
//! settings_loader::apply_env_overrides(&mut settings);
//! settings_loader::validate_settings(&settings)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use models::{Settings, WEIGHT_FIELD, WorksheetId};
use tracing::{debug, warn};

pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

pub const ENV_ACCESS_CODE: &str = "HOLDINGS_ACCESS_CODE";
pub const ENV_CACHE_TTL: &str = "HOLDINGS_CACHE_TTL_SECONDS";
pub const ENV_WORKSHEET: &str = "HOLDINGS_WORKSHEET";

/// Loads settings from a JSON file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Reading settings file: {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("Parsing settings JSON in {}", path.display()))?;
    debug!(path = %path.display(), "settings loaded");
    Ok(settings)
}

/// Loads settings from the default location (settings.json in the current directory)
pub fn load_default_settings() -> Result<Settings> {
    load_settings(DEFAULT_SETTINGS_FILE)
}

/// Tries the provided path, then the default location. When neither file
/// exists the built-in defaults are returned. A file that exists but cannot
/// be parsed is an error.
pub fn load_settings_with_fallback(path: Option<&PathBuf>) -> Result<Settings> {
    if let Some(settings_path) = path {
        if settings_file_exists(settings_path) {
            return load_settings(settings_path);
        }
        warn!(
            path = %settings_path.display(),
            "settings file not found, trying default location"
        );
    }

    if default_settings_exist() {
        return load_default_settings();
    }

    debug!("no settings file found, using defaults");
    Ok(Settings::default())
}

/// Applies environment overrides on top of file settings. A `.env` file in
/// the working directory is read first, if present.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Some(err) = dotenv_problem(dotenvy::dotenv()) {
        warn!(error = %err, "ignoring unreadable .env file");
    }
    apply_overrides_from(settings, |key| std::env::var(key).ok());
}

/// A missing `.env` is normal; anything else is worth reporting.
fn dotenv_problem<T>(result: dotenvy::Result<T>) -> Option<dotenvy::Error> {
    match result {
        Ok(_) => None,
        Err(err) if err.not_found() => None,
        Err(err) => Some(err),
    }
}

fn apply_overrides_from<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(code) = lookup(ENV_ACCESS_CODE).filter(|c| !c.is_empty()) {
        settings.access.access_code = Some(code);
    }

    if let Some(raw) = lookup(ENV_CACHE_TTL) {
        match raw.trim().parse::<u64>() {
            Ok(ttl) => settings.cache_ttl_seconds = ttl,
            Err(_) => warn!(value = %raw, "ignoring invalid {}", ENV_CACHE_TTL),
        }
    }

    if let Some(raw) = lookup(ENV_WORKSHEET).filter(|w| !w.trim().is_empty()) {
        settings.worksheet_identifier = WorksheetId::parse(&raw);
    }
}

/// Rejects settings the pipeline cannot run with. An unusual cache TTL is
/// only logged.
pub fn validate_settings(settings: &Settings) -> Result<()> {
    let threshold = settings.weight_group_threshold;
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(anyhow!(
            "weight_group_threshold must be a non-negative number, got {}",
            threshold
        ));
    }

    if !settings
        .canonical_column_order
        .iter()
        .any(|c| c == WEIGHT_FIELD)
    {
        return Err(anyhow!(
            "canonical_column_order must contain '{}'",
            WEIGHT_FIELD
        ));
    }

    if let Some((alias, target)) = settings
        .column_alias_table
        .iter()
        .find(|(_, target)| !settings.canonical_column_order.contains(target))
    {
        return Err(anyhow!(
            "column_alias_table maps '{}' to unknown field '{}'",
            alias,
            target
        ));
    }

    if settings.top_positions == 0 {
        return Err(anyhow!("top_positions must be at least 1"));
    }

    if !(60..=600).contains(&settings.cache_ttl_seconds) {
        warn!(
            ttl = settings.cache_ttl_seconds,
            "cache_ttl_seconds outside the usual 60-600 range"
        );
    }

    Ok(())
}

/// Checks if a settings file exists at the given path
pub fn settings_file_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists() && path.as_ref().is_file()
}

/// Checks if the default settings file (settings.json) exists
pub fn default_settings_exist() -> bool {
    settings_file_exists(DEFAULT_SETTINGS_FILE)
}
