use std::sync::Arc;

use models::Settings;

use crate::repository::HoldingsRepository;
use crate::session::{AccessGate, SessionStore};

/// Presentation defaults read from the settings file.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub top_positions: usize,
    pub default_range: (usize, usize),
    pub threshold: f64,
}

impl ViewSettings {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            top_positions: settings.top_positions,
            default_range: settings.default_range,
            threshold: settings.weight_group_threshold,
        }
    }
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn HoldingsRepository>,
    pub sessions: SessionStore,
    pub gate: AccessGate,
    pub view: ViewSettings,
}

impl AppState {
    pub fn new(repo: Arc<dyn HoldingsRepository>, settings: &Settings) -> Self {
        Self {
            repo,
            sessions: SessionStore::new(),
            gate: AccessGate::new(settings.access.access_code.clone()),
            view: ViewSettings::from_settings(settings),
        }
    }
}
